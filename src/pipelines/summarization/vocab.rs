use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::utils::maps::index_map;

/// Padding token, always id 0
pub const PAD_TOKEN: &str = "<pad>";

/// Start-of-decoding token, always id 1
pub const START_DECODING: &str = "<sos>";

/// Stop-decoding token, always id 2
pub const STOP_DECODING: &str = "<eos>";

/// Unknown token, always id 3
pub const UNKNOWN_TOKEN: &str = "<unk>";

/// Reserved tokens in id order
pub const RESERVED_TOKENS: [&str; 4] = [PAD_TOKEN, START_DECODING, STOP_DECODING, UNKNOWN_TOKEN];

/// A fixed vocabulary mapping words to integer ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocab {
    word_to_id: HashMap<String, usize>,
    id_to_word: Vec<String>,
}

impl Vocab {
    /// Build a vocabulary from words in rank order.
    ///
    /// Reserved tokens always take the first ids. Duplicates and reserved tokens in `words` are
    /// skipped. A `max_size` of 0 means no limit; otherwise the vocabulary stops growing once it
    /// holds `max_size` entries (reserved tokens included).
    pub fn from_words<I, S>(words: I, max_size: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut id_to_word: Vec<String> = RESERVED_TOKENS.iter().map(|t| t.to_string()).collect();
        let mut word_to_id: HashMap<String, usize> = index_map(&id_to_word);

        for word in words {
            if max_size != 0 && id_to_word.len() >= max_size {
                break;
            }

            let word = word.as_ref();
            if word_to_id.contains_key(word) {
                continue;
            }

            word_to_id.insert(word.to_string(), id_to_word.len());
            id_to_word.push(word.to_string());
        }

        Self {
            word_to_id,
            id_to_word,
        }
    }

    /// Load a vocabulary file with one word per line and an optional trailing count
    pub fn load(path: impl AsRef<Path>, max_size: usize) -> Result<Self, VocabError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| VocabError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(file);

        let mut words = Vec::new();
        for record in reader.records() {
            let record = record?;

            if let Some(word) = record.iter().flat_map(str::split_whitespace).next() {
                words.push(word.to_string());
            }
        }

        let vocab = Self::from_words(words, max_size);

        log::info!(
            "Loaded vocabulary of {} words from {}",
            vocab.size(),
            path.display()
        );

        Ok(vocab)
    }

    /// Id of the given word, or the unknown-token id if the word is out of vocabulary
    pub fn word2id(&self, word: &str) -> usize {
        self.word_to_id
            .get(word)
            .copied()
            .unwrap_or_else(|| self.unk_id())
    }

    /// Whether the word has its own id
    pub fn contains(&self, word: &str) -> bool {
        self.word_to_id.contains_key(word)
    }

    /// Word for the given id
    pub fn id2word(&self, id: usize) -> Result<&str, VocabError> {
        self.id_to_word
            .get(id)
            .map(String::as_str)
            .ok_or(VocabError::UnknownId(id))
    }

    /// Number of words, reserved tokens included
    pub fn size(&self) -> usize {
        self.id_to_word.len()
    }

    /// Id of the padding token
    pub fn pad_id(&self) -> usize {
        0
    }

    /// Id of the start-of-decoding token
    pub fn start_id(&self) -> usize {
        1
    }

    /// Id of the stop-decoding token
    pub fn stop_id(&self) -> usize {
        2
    }

    /// Id of the unknown token
    pub fn unk_id(&self) -> usize {
        3
    }

    /// Write one word per line in id order, for embedding visualisers
    pub fn write_metadata(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);

        for word in &self.id_to_word {
            writeln!(writer, "{}", word)?;
        }

        writer.flush()
    }
}

/// Strip non-ASCII characters and split on whitespace
pub fn tokenize(text: &str) -> Vec<String> {
    let ascii: String = text.chars().filter(char::is_ascii).collect();

    ascii.split_whitespace().map(str::to_string).collect()
}

/// Map article words to ids, giving each distinct OOV word a temporary id past the vocabulary.
///
/// Returns the ids and the OOV words in order of first appearance; the OOV at index `i` has
/// id `vocab.size() + i`.
pub fn article2ids<S: AsRef<str>>(article_words: &[S], vocab: &Vocab) -> (Vec<usize>, Vec<String>) {
    let mut ids = Vec::with_capacity(article_words.len());
    let mut oovs: Vec<String> = Vec::new();

    for word in article_words {
        let word = word.as_ref();

        if vocab.contains(word) {
            ids.push(vocab.word2id(word));
            continue;
        }

        let oov_num = match oovs.iter().position(|oov| oov == word) {
            Some(index) => index,
            None => {
                oovs.push(word.to_string());
                oovs.len() - 1
            }
        };

        ids.push(vocab.size() + oov_num);
    }

    (ids, oovs)
}

/// Map abstract words to ids, using the article's temporary ids for OOVs that appear there
pub fn abstract2ids<S: AsRef<str>>(
    abstract_words: &[S],
    vocab: &Vocab,
    article_oovs: &[String],
) -> Vec<usize> {
    abstract_words
        .iter()
        .map(|word| {
            let word = word.as_ref();

            if vocab.contains(word) {
                return vocab.word2id(word);
            }

            article_oovs
                .iter()
                .position(|oov| oov == word)
                .map(|index| vocab.size() + index)
                .unwrap_or_else(|| vocab.unk_id())
        })
        .collect()
}

/// Map output ids back to words, resolving temporary ids through the article OOVs
pub fn outputids2words(
    ids: &[usize],
    vocab: &Vocab,
    article_oovs: Option<&[String]>,
) -> Result<Vec<String>, VocabError> {
    ids.iter()
        .map(|&id| {
            if let Ok(word) = vocab.id2word(id) {
                return Ok(word.to_string());
            }

            let oovs = article_oovs.ok_or(VocabError::UnknownId(id))?;
            let index = id - vocab.size();

            oovs.get(index)
                .cloned()
                .ok_or(VocabError::OovNotInArticle {
                    id,
                    index,
                    count: oovs.len(),
                })
        })
        .collect()
}

/// Render the article with OOV words highlighted as `__word__`
pub fn show_art_oovs<S: AsRef<str>>(article_words: &[S], vocab: &Vocab) -> String {
    article_words
        .iter()
        .map(|word| {
            let word = word.as_ref();

            if vocab.contains(word) {
                word.to_string()
            } else {
                format!("__{}__", word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the abstract with OOV words highlighted.
///
/// OOVs that can be copied from the article become `__word__`; OOVs the model cannot produce
/// become `!!__word__!!`.
pub fn show_abs_oovs<S: AsRef<str>>(
    abstract_words: &[S],
    vocab: &Vocab,
    article_oovs: Option<&[String]>,
) -> String {
    abstract_words
        .iter()
        .map(|word| {
            let word = word.as_ref();

            if vocab.contains(word) {
                return word.to_string();
            }

            let in_article = article_oovs
                .map(|oovs| oovs.iter().any(|oov| oov == word))
                .unwrap_or(false);

            if in_article {
                format!("__{}__", word)
            } else {
                format!("!!__{}__!!", word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Vocabulary Error
#[derive(thiserror::Error, Debug)]
pub enum VocabError {
    /// The vocabulary file could not be opened
    #[error("unable to open vocabulary file {path}: {source}")]
    Open {
        /// The path that failed
        path: PathBuf,

        /// The underlying error
        source: io::Error,
    },

    /// The vocabulary file could not be parsed
    #[error("unable to read vocabulary file: {0}")]
    Read(#[from] csv::Error),

    /// No word for the given id
    #[error("id {0} not found in vocabulary")]
    UnknownId(usize),

    /// A temporary id pointed past the article's OOV list
    #[error("id {id} corresponds to article OOV {index} but this example only has {count} article OOVs")]
    OovNotInArticle {
        /// The offending id
        id: usize,

        /// The OOV index it maps to
        index: usize,

        /// The number of OOVs in the article
        count: usize,
    },
}
