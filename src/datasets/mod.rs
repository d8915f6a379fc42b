use std::{io, path::PathBuf};

/// Line-aligned article/abstract pairs
pub mod pairs;

/// Suffix of the article file for a data path prefix
pub static ARTICLE_SUFFIX: &str = ".x.txt";

/// Suffix of the abstract file for a data path prefix
pub static ABSTRACT_SUFFIX: &str = ".y.txt";

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// A data file could not be opened or read
    #[error("unable to read {path}: {source}")]
    Io {
        /// The file that failed
        path: PathBuf,

        /// The underlying error
        source: io::Error,
    },

    /// One file ran out of lines before the other
    #[error("article and abstract files differ in length at line {line}")]
    MismatchedLines {
        /// The 1-based line number with no partner
        line: usize,
    },
}
