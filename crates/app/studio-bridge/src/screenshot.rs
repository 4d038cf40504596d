use std::future::Future;

use async_trait::async_trait;

/// Produces a `data:` URL with a picture of the guest's current state.
#[async_trait]
pub trait ScreenshotProvider: Send + Sync {
    async fn capture(&self) -> anyhow::Result<String>;
}

#[async_trait]
impl<F, Fut> ScreenshotProvider for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn capture(&self) -> anyhow::Result<String> {
        (self)().await
    }
}
