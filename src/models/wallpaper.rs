use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeneratedArtifact;
use crate::batch::BatchResult;

/// A generated image as the gallery sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallpaper {
    pub id: String,
    pub image: GeneratedArtifact,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

impl Wallpaper {
    /// One wallpaper per artifact. Ids combine the batch timestamp, the batch
    /// id and the artifact index, so they stay unique within and across batches.
    pub fn from_batch(batch: BatchResult, prompt: &str, created_at: DateTime<Utc>) -> Vec<Self> {
        let millis = created_at.timestamp_millis();
        let tag = batch.id().simple().to_string();
        let tag = &tag[..8];

        batch
            .into_artifacts()
            .into_iter()
            .enumerate()
            .map(|(index, image)| Wallpaper {
                id: format!("{}-{}-{}", millis, tag, index),
                image,
                prompt: prompt.to_string(),
                created_at,
            })
            .collect()
    }

    pub fn file_name(&self) -> String {
        format!("wallpaper-{}.{}", self.id, self.image.file_extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BatchMode;
    use crate::models::artifact::fixtures::png_bytes;
    use std::collections::HashSet;

    #[test]
    fn test_from_batch_assigns_unique_ids() {
        let artifacts = (0..3)
            .map(|_| GeneratedArtifact::from_bytes(png_bytes(), None))
            .collect();
        let batch = BatchResult::new(BatchMode::Generate, artifacts).unwrap();
        let wallpapers = Wallpaper::from_batch(batch, "misty pines", Utc::now());

        assert_eq!(wallpapers.len(), 3);
        let ids: HashSet<_> = wallpapers.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert!(wallpapers.iter().all(|w| w.prompt == "misty pines"));
        assert!(wallpapers[0].file_name().ends_with(".png"));
    }
}
