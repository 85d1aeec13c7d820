use super::ReferenceImage;
use crate::error::BatchMode;

pub const WALLPAPER_ASPECT_RATIO: &str = "16:9";

/// One generation attempt: a prompt and, for remixes, the image to remix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub reference: Option<ReferenceImage>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, reference: Option<ReferenceImage>) -> Self {
        Self {
            prompt: prompt.into(),
            reference,
        }
    }

    pub fn fresh(prompt: impl Into<String>) -> Self {
        Self::new(prompt, None)
    }

    pub fn remix(prompt: impl Into<String>, reference: ReferenceImage) -> Self {
        Self::new(prompt, Some(reference))
    }

    pub fn is_remix(&self) -> bool {
        self.reference.is_some()
    }

    pub fn mode(&self) -> BatchMode {
        if self.is_remix() {
            BatchMode::Remix
        } else {
            BatchMode::Generate
        }
    }

    /// Instruction text sent alongside (or instead of) the reference image.
    pub fn instruction(&self) -> String {
        let prompt = self.prompt.trim();
        if self.is_remix() {
            format!(
                "Remix this image to match the style: {}. Maintain the horizontal {} composition suitable for a landscape wallpaper.",
                prompt, WALLPAPER_ASPECT_RATIO
            )
        } else {
            format!(
                "Create a high-quality, aesthetic wallpaper (horizontal {} ratio) based on this description: \"{}\". The style should be polished, artistic, and suitable for a background.",
                WALLPAPER_ASPECT_RATIO, prompt
            )
        }
    }
}
