pub mod traits;

use crate::{
    config::BatchConfig,
    error::{BatchFailure, BatchMode, GenerationError},
    logger,
    models::{GeneratedArtifact, GenerationRequest, ReferenceImage},
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use uuid::Uuid;

pub use traits::ImageGenerator;

/// Surviving artifacts of one batch. Never empty.
#[derive(Debug, Clone)]
pub struct BatchResult {
    id: Uuid,
    mode: BatchMode,
    artifacts: Vec<GeneratedArtifact>,
}

impl BatchResult {
    /// `None` when there is nothing to return; an empty batch is a failure.
    pub fn new(mode: BatchMode, artifacts: Vec<GeneratedArtifact>) -> Option<Self> {
        Self::with_id(Uuid::new_v4(), mode, artifacts)
    }

    fn with_id(id: Uuid, mode: BatchMode, artifacts: Vec<GeneratedArtifact>) -> Option<Self> {
        if artifacts.is_empty() {
            None
        } else {
            Some(Self {
                id,
                mode,
                artifacts,
            })
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn artifacts(&self) -> &[GeneratedArtifact] {
        &self.artifacts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneratedArtifact> {
        self.artifacts.iter()
    }

    pub fn into_artifacts(self) -> Vec<GeneratedArtifact> {
        self.artifacts
    }
}

impl IntoIterator for BatchResult {
    type Item = GeneratedArtifact;
    type IntoIter = std::vec::IntoIter<GeneratedArtifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.into_iter()
    }
}

/// Fans one prompt out into N identical generation attempts and keeps
/// whatever succeeds.
pub struct BatchOrchestrator<G: ?Sized> {
    generator: Arc<G>,
    config: BatchConfig,
}

impl<G: ?Sized> Clone for BatchOrchestrator<G> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            config: self.config.clone(),
        }
    }
}

impl<G: ImageGenerator + ?Sized> BatchOrchestrator<G> {
    pub fn new(generator: Arc<G>) -> Self {
        Self::with_config(generator, BatchConfig::default())
    }

    pub fn with_config(generator: Arc<G>, config: BatchConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Fresh batch with the configured default size.
    pub async fn generate(&self, prompt: &str) -> Result<BatchResult, BatchFailure> {
        self.run_batch(prompt, None, self.config.count).await
    }

    /// Remix batch with the configured default size.
    pub async fn remix(
        &self,
        reference: ReferenceImage,
        prompt: &str,
    ) -> Result<BatchResult, BatchFailure> {
        self.run_batch(prompt, Some(reference), self.config.count)
            .await
    }

    /// Issue `count` attempts concurrently and wait for all of them to settle.
    ///
    /// Failed attempts are logged and dropped. The batch only fails when no
    /// attempt produced an image. Results come back in settlement order.
    pub async fn run_batch(
        &self,
        prompt: &str,
        reference: Option<ReferenceImage>,
        count: usize,
    ) -> Result<BatchResult, BatchFailure> {
        let id = Uuid::new_v4();
        let mode = if reference.is_some() {
            BatchMode::Remix
        } else {
            BatchMode::Generate
        };

        if count == 0 {
            log::warn!("Batch {} ({}) requested with zero attempts", id, mode);
            return Err(BatchFailure::new(mode, 0));
        }

        let in_flight = self.config.max_concurrency.unwrap_or(count).clamp(1, count);
        log::info!(
            "Starting {} batch {} with {} attempts on {} ({} in flight)",
            mode,
            id,
            count,
            self.generator.name(),
            in_flight
        );
        let _timer = logger::timer(&format!("{} batch {}", mode, id));

        let requests =
            (0..count).map(|index| (index, GenerationRequest::new(prompt, reference.clone())));

        let outcomes: Vec<(usize, Result<GeneratedArtifact, GenerationError>)> =
            stream::iter(requests)
                .map(|(index, request)| async move { (index, self.attempt(&request).await) })
                .buffer_unordered(in_flight)
                .collect()
                .await;

        let mut artifacts = Vec::with_capacity(count);
        for (index, outcome) in outcomes {
            match outcome {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => log::warn!(
                    "Batch {} attempt {}/{} dropped: {}",
                    id,
                    index + 1,
                    count,
                    e
                ),
            }
        }

        let succeeded = artifacts.len();
        match BatchResult::with_id(id, mode, artifacts) {
            Some(batch) => {
                log::info!(
                    "Batch {} ({}) finished: {}/{} attempts succeeded",
                    id,
                    mode,
                    succeeded,
                    count
                );
                Ok(batch)
            }
            None => {
                log::error!("Batch {} ({}) failed: 0/{} attempts succeeded", id, mode, count);
                Err(BatchFailure::new(mode, count))
            }
        }
    }

    async fn attempt(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedArtifact, GenerationError> {
        match self.config.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.generator.generate(request))
                .await
                .unwrap_or(Err(GenerationError::Timeout)),
            None => self.generator.generate(request).await,
        }
    }
}
