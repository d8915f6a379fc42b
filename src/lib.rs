//! # Burn Summarization
//!
//! Batches tokenized article/abstract pairs into fixed-shape Burn tensors for a
//! pointer-generator summarization model.
#![forbid(unsafe_code)]

/// Pipelines
pub mod pipelines;

/// Datasets
pub mod datasets;

/// Utilities
pub mod utils;
