use std::{
    fs::File,
    io::{BufReader, Lines},
    path::{Path, PathBuf},
};

use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{
    pipelines::summarization::vocab::tokenize,
    utils::files::{file_reader, with_suffix},
};

use super::{DatasetError, ABSTRACT_SUFFIX, ARTICLE_SUFFIX};

/// An article/abstract pair as it appears in the data files
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Item {
    /// The article text, tokens separated by spaces
    pub article: String,

    /// The abstract text, tokens separated by spaces
    pub abstract_text: String,
}

/// Reads `<prefix>.x.txt` and `<prefix>.y.txt` line by line in lockstep
pub struct PairReader {
    articles: Lines<BufReader<File>>,
    abstracts: Lines<BufReader<File>>,
    article_path: PathBuf,
    abstract_path: PathBuf,
    line: usize,
    done: bool,
}

impl PairReader {
    /// Open both files of a data path prefix
    pub fn open(data_path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let article_path = with_suffix(data_path.as_ref(), ARTICLE_SUFFIX);
        let abstract_path = with_suffix(data_path.as_ref(), ABSTRACT_SUFFIX);

        Ok(Self {
            articles: open_lines(&article_path)?,
            abstracts: open_lines(&abstract_path)?,
            article_path,
            abstract_path,
            line: 0,
            done: false,
        })
    }

    /// Number of line pairs read so far
    pub fn line(&self) -> usize {
        self.line
    }

    fn read_pair(&mut self) -> Result<Option<Item>, DatasetError> {
        let article = self
            .articles
            .next()
            .transpose()
            .map_err(|source| DatasetError::Io {
                path: self.article_path.clone(),
                source,
            })?;

        let abstract_text = self
            .abstracts
            .next()
            .transpose()
            .map_err(|source| DatasetError::Io {
                path: self.abstract_path.clone(),
                source,
            })?;

        self.line += 1;

        match (article, abstract_text) {
            (Some(article), Some(abstract_text)) => Ok(Some(Item::new(article, abstract_text))),
            (None, None) => Ok(None),
            _ => Err(DatasetError::MismatchedLines { line: self.line }),
        }
    }
}

impl Iterator for PairReader {
    type Item = Result<Item, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let pair = self.read_pair().transpose();
        if !matches!(pair, Some(Ok(_))) {
            self.done = true;
        }

        pair
    }
}

fn open_lines(path: &Path) -> Result<Lines<BufReader<File>>, DatasetError> {
    file_reader(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// An in-memory dataset of article/abstract pairs
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

impl dataset::Dataset<Item> for Dataset {
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl Dataset {
    /// Load every pair under a data path prefix, skipping pairs with an empty article
    pub fn load(data_path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let mut items = Vec::new();

        for item in PairReader::open(data_path)? {
            let item = item?;

            if tokenize(&item.article).is_empty() {
                log::warn!("Found an example with empty article text. Skipping it.");
                continue;
            }

            items.push(item);
        }

        Ok(Self {
            dataset: InMemDataset::new(items),
        })
    }
}

#[cfg(test)]
mod tests {
    use burn::data::dataset::Dataset as _;
    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    use super::*;

    fn write_pairs(dir: &TempDir, articles: &str, abstracts: &str) -> PathBuf {
        let prefix = dir.path().join("train");
        std::fs::write(with_suffix(&prefix, ARTICLE_SUFFIX), articles).unwrap();
        std::fs::write(with_suffix(&prefix, ABSTRACT_SUFFIX), abstracts).unwrap();

        prefix
    }

    #[test]
    fn reads_aligned_lines() {
        let dir = TempDir::new("pairs_test").unwrap();
        let prefix = write_pairs(&dir, "a b\nc d\n", "x\ny\n");

        let items: Vec<Item> = PairReader::open(&prefix)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            items,
            vec![Item::new("a b".into(), "x".into()), Item::new("c d".into(), "y".into())]
        );
    }

    #[test]
    fn mismatched_files_error_once() {
        let dir = TempDir::new("pairs_test").unwrap();
        let prefix = write_pairs(&dir, "a\nb\nc\n", "x\n");

        let mut reader = PairReader::open(&prefix).unwrap();

        assert!(matches!(reader.next(), Some(Ok(_))));
        assert!(matches!(
            reader.next(),
            Some(Err(DatasetError::MismatchedLines { line: 2 }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = TempDir::new("pairs_test").unwrap();

        let err = PairReader::open(dir.path().join("absent")).err().unwrap();

        assert!(err.to_string().contains("absent.x.txt"));
    }

    #[test]
    fn dataset_skips_empty_articles() {
        let dir = TempDir::new("pairs_test").unwrap();
        let prefix = write_pairs(&dir, "a\n \nc\n", "x\ny\nz\n");

        let dataset = Dataset::load(&prefix).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get(1).unwrap().abstract_text, "z");
    }
}
