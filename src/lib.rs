//! Moodwall: describe a mood, get a batch of AI-generated 16:9 wallpapers.
//!
//! The [`batch::BatchOrchestrator`] fans one prompt out into several
//! concurrent Gemini image calls, drops the ones that fail and returns the
//! rest. [`session::Session`] keeps the gallery state a front-end renders.

pub mod batch;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod session;

pub use batch::{BatchOrchestrator, BatchResult, ImageGenerator};
pub use config::{BatchConfig, Config, GeminiConfig};
pub use error::{BatchFailure, BatchMode, GenerationError, MoodwallError, Result, SessionError};
pub use gemini::{GeminiClient, ImageClient};
pub use models::{GeneratedArtifact, GenerationRequest, ReferenceImage, Wallpaper};
pub use session::{GenerationStatus, Session, SessionState};
