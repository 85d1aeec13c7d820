use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    batch::BatchResult,
    error::{BatchFailure, SessionError},
    models::Wallpaper,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GenerationStatus {
    Idle,
    Loading,
    Success,
    Error,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Idle => "IDLE",
            GenerationStatus::Loading => "LOADING",
            GenerationStatus::Success => "SUCCESS",
            GenerationStatus::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// A transient message for the user, replaced by the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    Submitted {
        prompt: String,
    },
    BatchSucceeded {
        prompt: String,
        batch: BatchResult,
        at: DateTime<Utc>,
    },
    BatchFailed {
        failure: BatchFailure,
    },
    RemixRequested {
        wallpaper_id: String,
    },
    RemixCancelled,
    NoticeDismissed,
}

/// Everything the gallery needs to render. Only changed through [`SessionState::apply`].
#[derive(Debug, Clone)]
pub struct SessionState {
    wallpapers: Vec<Wallpaper>,
    status: GenerationStatus,
    remix_target: Option<Wallpaper>,
    notice: Option<Notice>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            wallpapers: Vec::new(),
            status: GenerationStatus::Idle,
            remix_target: None,
            notice: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first.
    pub fn wallpapers(&self) -> &[Wallpaper] {
        &self.wallpapers
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    pub fn remix_target(&self) -> Option<&Wallpaper> {
        self.remix_target.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == GenerationStatus::Loading
    }

    pub fn is_remix_mode(&self) -> bool {
        self.remix_target.is_some()
    }

    /// Prompt to prefill the input with while remixing.
    pub fn remix_prompt_hint(&self) -> Option<&str> {
        self.remix_target.as_ref().map(|w| w.prompt.as_str())
    }

    pub fn find(&self, id: &str) -> Option<&Wallpaper> {
        self.wallpapers.iter().find(|w| w.id == id)
    }

    pub fn apply(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::Submitted { prompt } => {
                if self.is_loading() {
                    return Err(SessionError::Busy);
                }
                if prompt.trim().is_empty() {
                    return Err(SessionError::EmptyPrompt);
                }
                self.status = GenerationStatus::Loading;
                self.notice = None;
            }
            SessionEvent::BatchSucceeded { prompt, batch, at } => {
                if !self.is_loading() {
                    return Err(SessionError::NotLoading);
                }
                let mut fresh = Wallpaper::from_batch(batch, prompt.trim(), at);
                let count = fresh.len();
                fresh.append(&mut self.wallpapers);
                self.wallpapers = fresh;
                self.remix_target = None;
                self.status = GenerationStatus::Success;
                self.notice = Some(Notice::new(
                    NoticeKind::Success,
                    format!("{} new wallpaper{}", count, if count == 1 { "" } else { "s" }),
                ));
            }
            SessionEvent::BatchFailed { failure } => {
                if !self.is_loading() {
                    return Err(SessionError::NotLoading);
                }
                self.status = GenerationStatus::Error;
                self.notice = Some(Notice::new(NoticeKind::Error, failure.user_message()));
            }
            SessionEvent::RemixRequested { wallpaper_id } => {
                if self.is_loading() {
                    return Err(SessionError::Busy);
                }
                let target = self
                    .find(&wallpaper_id)
                    .cloned()
                    .ok_or(SessionError::UnknownWallpaper(wallpaper_id))?;
                self.notice = Some(Notice::new(
                    NoticeKind::Info,
                    format!("Remixing \"{}\"", target.prompt),
                ));
                self.remix_target = Some(target);
            }
            SessionEvent::RemixCancelled => self.cancel_remix(),
            SessionEvent::NoticeDismissed => self.dismiss_notice(),
        }
        Ok(())
    }

    /// Leave remix mode. Allowed in every status.
    pub fn cancel_remix(&mut self) {
        self.remix_target = None;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BatchMode;
    use crate::models::{artifact::fixtures::png_bytes, GeneratedArtifact};
    use std::collections::HashSet;

    fn batch(n: usize) -> BatchResult {
        let artifacts = (0..n)
            .map(|_| GeneratedArtifact::from_bytes(png_bytes(), None))
            .collect();
        BatchResult::new(BatchMode::Generate, artifacts).unwrap()
    }

    fn loaded(prompt: &str, n: usize) -> SessionState {
        let mut state = SessionState::new();
        state
            .apply(SessionEvent::Submitted {
                prompt: prompt.into(),
            })
            .unwrap();
        state
            .apply(SessionEvent::BatchSucceeded {
                prompt: prompt.into(),
                batch: batch(n),
                at: Utc::now(),
            })
            .unwrap();
        state
    }

    #[test]
    fn test_submit_moves_to_loading_and_rejects_overlap() {
        let mut state = SessionState::new();
        assert_eq!(state.status(), GenerationStatus::Idle);

        state
            .apply(SessionEvent::Submitted {
                prompt: "calm sea".into(),
            })
            .unwrap();
        assert_eq!(state.status(), GenerationStatus::Loading);

        let err = state
            .apply(SessionEvent::Submitted {
                prompt: "stormy sea".into(),
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::Busy));
    }

    #[test]
    fn test_remix_request_rejected_while_loading() {
        let mut state = loaded("harbour lights", 1);
        let id = state.wallpapers()[0].id.clone();
        state
            .apply(SessionEvent::Submitted {
                prompt: "evening tide".into(),
            })
            .unwrap();

        let err = state
            .apply(SessionEvent::RemixRequested { wallpaper_id: id })
            .unwrap_err();
        assert!(matches!(err, SessionError::Busy));
        assert!(!state.is_remix_mode());
        assert!(state.is_loading());

        state.apply(SessionEvent::RemixCancelled).unwrap();
        state.apply(SessionEvent::NoticeDismissed).unwrap();
        assert!(state.notice().is_none());
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        let mut state = SessionState::new();
        let err = state
            .apply(SessionEvent::Submitted {
                prompt: "   ".into(),
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::EmptyPrompt));
        assert_eq!(state.status(), GenerationStatus::Idle);
    }

    #[test]
    fn test_success_prepends_with_unique_ids() {
        let mut state = loaded("first", 4);
        assert_eq!(state.status(), GenerationStatus::Success);
        assert_eq!(state.notice().unwrap().kind, NoticeKind::Success);

        state
            .apply(SessionEvent::Submitted {
                prompt: "second".into(),
            })
            .unwrap();
        state
            .apply(SessionEvent::BatchSucceeded {
                prompt: "second".into(),
                batch: batch(2),
                at: Utc::now(),
            })
            .unwrap();

        let wallpapers = state.wallpapers();
        assert_eq!(wallpapers.len(), 6);
        assert_eq!(wallpapers[0].prompt, "second");
        assert_eq!(wallpapers[5].prompt, "first");

        let ids: HashSet<_> = wallpapers.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_failure_keeps_gallery_and_remix_target() {
        let mut state = loaded("misty hills", 3);
        let target = state.wallpapers()[1].id.clone();
        state
            .apply(SessionEvent::RemixRequested {
                wallpaper_id: target.clone(),
            })
            .unwrap();
        assert_eq!(state.remix_prompt_hint(), Some("misty hills"));

        state
            .apply(SessionEvent::Submitted {
                prompt: "make it snowy".into(),
            })
            .unwrap();
        state
            .apply(SessionEvent::BatchFailed {
                failure: BatchFailure::new(BatchMode::Remix, 4),
            })
            .unwrap();

        assert_eq!(state.status(), GenerationStatus::Error);
        assert_eq!(state.wallpapers().len(), 3);
        assert_eq!(state.remix_target().unwrap().id, target);
        let notice = state.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.contains("remix"));

        // Error accepts the next submission.
        state
            .apply(SessionEvent::Submitted {
                prompt: "make it sunny".into(),
            })
            .unwrap();
        assert!(state.is_loading());
        assert!(state.notice().is_none());
    }

    #[test]
    fn test_success_clears_remix_target() {
        let mut state = loaded("desert dunes", 1);
        let target = state.wallpapers()[0].id.clone();
        state
            .apply(SessionEvent::RemixRequested { wallpaper_id: target })
            .unwrap();
        assert!(state.is_remix_mode());

        state
            .apply(SessionEvent::Submitted {
                prompt: "at night".into(),
            })
            .unwrap();
        state
            .apply(SessionEvent::BatchSucceeded {
                prompt: "at night".into(),
                batch: batch(1),
                at: Utc::now(),
            })
            .unwrap();
        assert!(!state.is_remix_mode());
        assert_eq!(state.notice().unwrap().message, "1 new wallpaper");
    }

    #[test]
    fn test_unknown_remix_target() {
        let mut state = SessionState::new();
        let err = state
            .apply(SessionEvent::RemixRequested {
                wallpaper_id: "missing".into(),
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownWallpaper(id) if id == "missing"));

        state.apply(SessionEvent::RemixCancelled).unwrap();
        assert!(!state.is_remix_mode());
    }

    #[test]
    fn test_completion_outside_loading_is_rejected() {
        let mut state = SessionState::new();
        let err = state
            .apply(SessionEvent::BatchFailed {
                failure: BatchFailure::new(BatchMode::Generate, 4),
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::NotLoading));
        assert_eq!(state.status(), GenerationStatus::Idle);
    }
}
