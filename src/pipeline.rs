use tracing::{info, instrument, warn};

use crate::config::{COMPRESSED_MARKER, UNCOMPRESSED_MARKER};
use crate::error::OptimizerError;
use crate::notification::Notification;
use crate::storage::ObjectStore;
use crate::tinify::ImageOptimizer;

/// Maps a source key to the key its optimized rendition is stored under by
/// replacing the first uncompressed marker. Keys without the marker have no
/// output key.
pub fn derive_output_key(key: &str) -> Option<String> {
    key.contains(UNCOMPRESSED_MARKER)
        .then(|| key.replacen(UNCOMPRESSED_MARKER, COMPRESSED_MARKER, 1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Uploaded { key: String, size: usize },
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
}

/// Drives download, compress, resize and upload for each notification.
pub struct Pipeline<S, O> {
    store: S,
    optimizer: O,
}

impl<S, O> Pipeline<S, O>
where
    S: ObjectStore,
    O: ImageOptimizer,
{
    pub fn new(store: S, optimizer: O) -> Self {
        Self { store, optimizer }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Processes notifications one after another and stops at the first
    /// failure. Outputs written before the failure stay in place.
    pub async fn process_batch(
        &self,
        notifications: &[Notification],
    ) -> Result<BatchSummary, OptimizerError> {
        let mut summary = BatchSummary::default();

        for notification in notifications {
            match self.process(notification).await? {
                Outcome::Uploaded { .. } => summary.processed += 1,
                Outcome::Skipped => summary.skipped += 1,
            }
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            "batch complete"
        );

        Ok(summary)
    }

    #[instrument(skip_all, fields(key = %notification.key, size = notification.size))]
    pub async fn process(&self, notification: &Notification) -> Result<Outcome, OptimizerError> {
        let Some(output_key) = derive_output_key(&notification.key) else {
            warn!(
                key = %notification.key,
                marker = UNCOMPRESSED_MARKER,
                "key has no uncompressed marker, skipping"
            );
            return Ok(Outcome::Skipped);
        };

        info!("downloading image");
        let image = self.store.download(&notification.key).await?;

        let reference = self.optimizer.compress(image).await?;
        let optimized = self.optimizer.resize(reference).await?;

        let size = optimized.len();
        self.store.upload(&output_key, optimized).await?;
        info!(output_key = %output_key, size, "optimized image stored");

        Ok(Outcome::Uploaded {
            key: output_key,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::nested("photos/42_uncompressed.jpg", "photos/42.jpg")]
    #[case::root("a_uncompressed.jpg", "a.jpg")]
    #[case::first_occurrence_only(
        "x_uncompressed.jpg/y_uncompressed.jpg",
        "x.jpg/y_uncompressed.jpg"
    )]
    fn output_key_replaces_first_marker(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(derive_output_key(input).as_deref(), Some(expected));
    }

    #[rstest]
    #[case::already_compressed("photos/42.jpg")]
    #[case::other_extension("photos/42_uncompressed.png")]
    #[case::empty("")]
    fn output_key_requires_marker(#[case] input: &str) {
        assert_eq!(derive_output_key(input), None);
    }

    #[test]
    fn output_key_is_deterministic() {
        let key = "photos/42_uncompressed.jpg";
        assert_eq!(derive_output_key(key), derive_output_key(key));
    }
}
