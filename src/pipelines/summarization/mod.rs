/// Vocabulary and OOV id mapping
pub mod vocab;

/// Hyperparameters and batching modes
pub mod config;

/// Example construction
pub mod example;

/// Batch assembly
pub mod batch;

/// File-backed batch iteration
pub mod batcher;

pub use batch::Batch;
pub use batcher::Batcher;
pub use config::{Config, Mode};
pub use example::Example;
pub use vocab::Vocab;
