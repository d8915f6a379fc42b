/// Pointer-generator summarization
pub mod summarization;
