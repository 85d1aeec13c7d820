pub mod gemini;
pub mod generation;
pub mod artifact;
pub mod wallpaper;

pub use generation::*;
pub use artifact::*;
pub use wallpaper::*;
