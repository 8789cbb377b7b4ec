use async_trait::async_trait;
use reqwest::{Request, Response};

/// The one seam between the pipelines and the network.
///
/// Decorators such as [`ApiKey`](super::auth::ApiKey) wrap another client and
/// rewrite the request before handing it on.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
