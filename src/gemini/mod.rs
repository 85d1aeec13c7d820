pub mod image_client;

use crate::{
    config::GeminiConfig,
    error::{MoodwallError, Result},
};
use reqwest::Client;

pub use image_client::ImageClient;

#[derive(Clone)]
pub struct GeminiClient {
    image_client: ImageClient,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| MoodwallError::ClientError(e.to_string()))?;

        let image_client = ImageClient::new(http, &config)?;
        log::info!(
            "Gemini client ready (model: {}, timeout: {}s)",
            image_client.model(),
            config.timeout().as_secs()
        );

        Ok(Self { image_client })
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn into_image(self) -> ImageClient {
        self.image_client
    }
}
