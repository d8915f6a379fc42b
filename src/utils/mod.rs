/// File utilities
pub mod files;

/// Map utilities
pub mod maps;

/// Tensor Utilities
pub mod tensors;
