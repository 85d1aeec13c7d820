pub mod state;

use crate::{
    batch::{BatchOrchestrator, ImageGenerator},
    error::SessionError,
    models::{ReferenceImage, Wallpaper},
};
use chrono::Utc;
use std::path::{Path, PathBuf};

pub use state::{GenerationStatus, Notice, NoticeKind, SessionEvent, SessionState};

/// Drives a [`SessionState`] with one orchestrator call per accepted submission.
pub struct Session<G: ?Sized> {
    state: SessionState,
    orchestrator: BatchOrchestrator<G>,
}

impl<G: ImageGenerator + ?Sized> Session<G> {
    pub fn new(orchestrator: BatchOrchestrator<G>) -> Self {
        Self {
            state: SessionState::new(),
            orchestrator,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator<G> {
        &self.orchestrator
    }

    pub fn request_remix(&mut self, wallpaper_id: &str) -> Result<&Wallpaper, SessionError> {
        self.state.apply(SessionEvent::RemixRequested {
            wallpaper_id: wallpaper_id.to_string(),
        })?;
        self.state
            .remix_target()
            .ok_or_else(|| SessionError::UnknownWallpaper(wallpaper_id.to_string()))
    }

    pub fn cancel_remix(&mut self) {
        self.state.cancel_remix();
    }

    pub fn dismiss_notice(&mut self) {
        self.state.dismiss_notice();
    }

    /// Run one batch for `prompt`, remixing the current target if there is one.
    ///
    /// Returns the newly added wallpapers. On failure the gallery is left as it
    /// was and the error notice is set.
    pub async fn submit(&mut self, prompt: &str) -> Result<&[Wallpaper], SessionError> {
        self.state.apply(SessionEvent::Submitted {
            prompt: prompt.to_string(),
        })?;

        let prompt = prompt.trim();
        let reference = self
            .state
            .remix_target()
            .map(|target| ReferenceImage::from_artifact(&target.image));
        let count = self.orchestrator.config().count;

        match self.orchestrator.run_batch(prompt, reference, count).await {
            Ok(batch) => {
                let added = batch.len();
                self.state.apply(SessionEvent::BatchSucceeded {
                    prompt: prompt.to_string(),
                    batch,
                    at: Utc::now(),
                })?;
                Ok(&self.state.wallpapers()[..added])
            }
            Err(failure) => {
                self.state.apply(SessionEvent::BatchFailed {
                    failure: failure.clone(),
                })?;
                Err(failure.into())
            }
        }
    }

    /// Write a wallpaper's bytes to `dir`, returning the file path.
    pub async fn save_wallpaper(
        &self,
        wallpaper_id: &str,
        dir: &Path,
    ) -> Result<PathBuf, SessionError> {
        let wallpaper = self
            .state
            .find(wallpaper_id)
            .ok_or_else(|| SessionError::UnknownWallpaper(wallpaper_id.to_string()))?;

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(wallpaper.file_name());
        tokio::fs::write(&path, &wallpaper.image.data).await?;
        log::info!("Saved wallpaper {} to {}", wallpaper.id, path.display());
        Ok(path)
    }
}
