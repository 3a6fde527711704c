pub mod gemini;
pub mod parts;

pub use gemini::Gemini;
pub use parts::build_parts;

#[cfg(test)]
use mockall::automock;

use crate::{
    config::BackendConfig,
    models::{BackendPrompt, Fragment},
};
use async_trait::async_trait;
use eyre::Result;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Finite, non-restartable sequence of answer fragments. An `Err` item ends
/// the answer with a failure.
pub type FragmentStream = BoxStream<'static, Result<Fragment>>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backend {
    fn name(&self) -> &str;
    async fn stream_generate(&self, prompt: BackendPrompt) -> Result<FragmentStream>;
}

pub type ArcBackend = Arc<dyn Backend + Send + Sync>;

/// Builds the configured backend. A missing credential is reported here, at
/// startup, rather than on the first request.
pub fn new_backend(config: &BackendConfig) -> Result<ArcBackend> {
    let api_key = config.resolve_api_key()?;
    let gemini = Gemini::from(config).with_api_key(&api_key);
    log::debug!(
        "Initialized backend {} with model {}",
        gemini.name(),
        gemini.model()
    );
    Ok(Arc::new(gemini))
}
