use crate::{
    error::GenerationError,
    models::{GeneratedArtifact, GenerationRequest},
};
use async_trait::async_trait;

/// A single-shot image generation capability.
///
/// Implementations must be stateless between calls: the orchestrator issues
/// many identical requests against one shared instance at the same time.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedArtifact, GenerationError>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ImageGenerator + ?Sized> ImageGenerator for std::sync::Arc<T> {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedArtifact, GenerationError> {
        (**self).generate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
