pub mod config;
pub mod error;
pub mod notification;
pub mod observability;
pub mod pipeline;
pub mod storage;
pub mod tinify;

pub use config::Config;
pub use error::OptimizerError;
pub use notification::Notification;
pub use pipeline::{derive_output_key, BatchSummary, Outcome, Pipeline};
pub use storage::{MemoryStore, ObjectStore, S3Store};
pub use tinify::{ImageOptimizer, ResultReference, TinifyClient};
