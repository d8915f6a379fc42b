use std::{collections::VecDeque, path::Path, sync::Arc};

use burn::{data::dataloader, tensor::backend::Backend};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::datasets::{
    pairs::{Item, PairReader},
    DatasetError,
};

use super::{
    batch::BatchError,
    config::{ConfigError, Mode},
    vocab::Vocab,
    Batch, Config, Example,
};

/// Number of batches worth of examples read per refill, sorted together by length
pub static BUCKET_CACHE_BATCHES: usize = 16;

/// Struct for batching summarization examples
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Vocabulary for converting tokens to ids
    pub vocab: Arc<Vocab>,

    /// Batch shape and mode
    pub config: Config,

    /// Read the data exactly once, in file order
    pub single_pass: bool,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(vocab: Arc<Vocab>, config: Config, single_pass: bool, device: B::Device) -> Self {
        Self {
            vocab,
            config,
            single_pass,
            device,
        }
    }

    /// Process a raw pair into an example
    pub fn example(&self, item: &Item) -> Example {
        Example::new(&item.article, &item.abstract_text, &self.vocab, &self.config)
    }

    /// Iterate over batches built from `<data_path>.x.txt` and `<data_path>.y.txt`
    ///
    /// # Errors
    ///
    /// Returns an error up front if the config is invalid or either file cannot be opened. A read
    /// failure or a line count mismatch is yielded once as an `Err` item, after which the iterator
    /// ends. Examples already buffered in the failing refill are discarded, which can be up to
    /// `batch_size * BUCKET_CACHE_BATCHES` pairs.
    pub fn pair_iter(&self, data_path: impl AsRef<Path>) -> Result<PairIter<'_, B>, BatcherError> {
        self.config.validate()?;

        let reader = PairReader::open(data_path)?;

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(PairIter {
            batcher: self,
            reader,
            batches: VecDeque::new(),
            rng,
            failed: false,
        })
    }
}

/// Collects examples into a batch
impl<B: Backend> dataloader::batcher::Batcher<Example, Batch<B>> for Batcher<B> {
    /// # Panics
    ///
    /// If `items` is empty or holds more than `config.batch_size` examples.
    fn batch(&self, items: Vec<Example>) -> Batch<B> {
        Batch::new(items, &self.config, &self.vocab, &self.device).expect("unable to batch examples")
    }
}

/// Collects raw article/abstract pairs into a batch
impl<B: Backend> dataloader::batcher::Batcher<Item, Batch<B>> for Batcher<B> {
    /// # Panics
    ///
    /// If `items` is empty or holds more than `config.batch_size` pairs.
    fn batch(&self, items: Vec<Item>) -> Batch<B> {
        let examples = items.iter().map(|item| self.example(item)).collect();

        Batch::new(examples, &self.config, &self.vocab, &self.device).expect("unable to batch pairs")
    }
}

/// Yields batches until the data files are exhausted
pub struct PairIter<'a, B: Backend> {
    batcher: &'a Batcher<B>,
    reader: PairReader,
    batches: VecDeque<Batch<B>>,
    rng: StdRng,
    failed: bool,
}

impl<'a, B: Backend> PairIter<'a, B> {
    fn refill(&mut self) -> Result<(), BatcherError> {
        match self.batcher.config.mode {
            Mode::Decode => self.refill_decode(),
            Mode::Train | Mode::Eval => self.refill_buckets(),
        }
    }

    /// Read a bucket of examples, sort by encoder length and queue them as batches
    fn refill_buckets(&mut self) -> Result<(), BatcherError> {
        let batch_size = self.batcher.config.batch_size;
        let mut examples = self.read_examples(batch_size * BUCKET_CACHE_BATCHES)?;
        let num_examples = examples.len();

        if !self.batcher.single_pass {
            examples.sort_by_key(|ex| ex.enc_len);
        }

        while !examples.is_empty() {
            let rest = examples.split_off(batch_size.min(examples.len()));
            let chunk = std::mem::replace(&mut examples, rest);

            let batch = self.assemble(chunk)?;
            self.batches.push_back(batch);
        }

        if !self.batcher.single_pass {
            self.batches.make_contiguous().shuffle(&mut self.rng);
        }

        log::debug!(
            "Refilled {} batches from {} examples (line {})",
            self.batches.len(),
            num_examples,
            self.reader.line()
        );

        Ok(())
    }

    /// Queue the next `batch_size` examples as one batch, in file order
    fn refill_decode(&mut self) -> Result<(), BatcherError> {
        let examples = self.read_examples(self.batcher.config.batch_size)?;

        if !examples.is_empty() {
            let batch = self.assemble(examples)?;
            self.batches.push_back(batch);
        }

        Ok(())
    }

    fn read_examples(&mut self, limit: usize) -> Result<Vec<Example>, BatcherError> {
        let mut examples = Vec::with_capacity(limit);

        while examples.len() < limit {
            let Some(item) = self.reader.next() else {
                break;
            };

            let example = self.batcher.example(&item?);

            if example.enc_len == 0 {
                log::warn!("Found an example with empty article text. Skipping it.");
                continue;
            }

            examples.push(example);
        }

        Ok(examples)
    }

    fn assemble(&self, examples: Vec<Example>) -> Result<Batch<B>, BatcherError> {
        let batcher = self.batcher;

        Ok(Batch::new(
            examples,
            &batcher.config,
            &batcher.vocab,
            &batcher.device,
        )?)
    }
}

impl<'a, B: Backend> Iterator for PairIter<'a, B> {
    type Item = Result<Batch<B>, BatcherError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if self.batches.is_empty() {
            if let Err(err) = self.refill() {
                self.failed = true;
                return Some(Err(err));
            }
        }

        self.batches.pop_front().map(Ok)
    }
}

/// Batcher Error
#[derive(thiserror::Error, Debug)]
pub enum BatcherError {
    /// The configuration cannot produce batches
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The data files could not be read
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// A batch could not be assembled
    #[error(transparent)]
    Batch(#[from] BatchError),
}
