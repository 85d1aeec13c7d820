use std::fmt;
use thiserror::Error;

/// Failure of a single generation attempt.
///
/// These never reach the user on their own: the batch orchestrator drops them
/// and only reports a [`BatchFailure`] when nothing in the batch survived.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Request timed out")]
    Timeout,
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Response contained no image: {0}")]
    NoImage(String),
    #[error("Image decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Http(err.to_string())
        }
    }
}

/// Whether a batch was a fresh generation or a remix of an earlier wallpaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchMode {
    Generate,
    Remix,
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Generate => "generate",
            BatchMode::Remix => "remix",
        }
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every attempt of a batch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.user_message())]
pub struct BatchFailure {
    pub mode: BatchMode,
    pub attempts: usize,
}

impl BatchFailure {
    pub fn new(mode: BatchMode, attempts: usize) -> Self {
        Self { mode, attempts }
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> &'static str {
        match self.mode {
            BatchMode::Generate => "Could not generate wallpapers. Please try again.",
            BatchMode::Remix => "Could not remix the wallpaper. Please try again.",
        }
    }
}


#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A batch is already in progress")]
    Busy,
    #[error("Prompt must not be empty")]
    EmptyPrompt,
    #[error("Unknown wallpaper: {0}")]
    UnknownWallpaper(String),
    #[error("No batch is in progress")]
    NotLoading,
    #[error(transparent)]
    Batch(#[from] BatchFailure),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum MoodwallError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Client error: {0}")]
    ClientError(String),
    #[error("Logger error: {0}")]
    LoggerError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, MoodwallError>;
