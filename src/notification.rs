use aws_lambda_events::event::s3::{S3Event, S3EventRecord};

use crate::error::OptimizerError;

/// One object-creation event for the images bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub key: String,
    /// Object size in bytes as reported by the trigger. Informational only.
    pub size: i64,
}

impl Notification {
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

impl TryFrom<&S3EventRecord> for Notification {
    type Error = OptimizerError;

    fn try_from(record: &S3EventRecord) -> Result<Self, Self::Error> {
        let object = &record.s3.object;
        let key = object.key.clone().ok_or(OptimizerError::MissingKey)?;

        Ok(Self::new(key, object.size.unwrap_or_default()))
    }
}

/// Converts every record of `event`; a single malformed record rejects the
/// whole batch before any work starts.
pub fn from_event(event: &S3Event) -> Result<Vec<Notification>, OptimizerError> {
    event.records.iter().map(Notification::try_from).collect()
}
