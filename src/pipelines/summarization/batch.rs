use burn::tensor::{backend::Backend, Int, Tensor};

use crate::utils::tensors;

use super::{vocab::Vocab, Config, Example};

/// Extended-vocabulary inputs for the copy mechanism
#[derive(Debug, Clone)]
pub struct ExtendedBatch<B: Backend> {
    /// Encoder ids with in-article OOVs as temporary ids: [batch_size, max_enc_len]
    pub enc_batch: Tensor<B, 2, Int>,

    /// Largest number of in-article OOVs of any example in the batch
    pub max_art_oovs: usize,

    /// In-article OOV words for each example
    pub art_oovs: Vec<Vec<String>>,
}

/// A fixed-shape minibatch of summarization examples
#[derive(Debug, Clone)]
pub struct Batch<B: Backend> {
    /// Encoder ids, OOVs as the unknown id: [batch_size, max_enc_len]
    pub enc_batch: Tensor<B, 2, Int>,

    /// Encoder lengths before padding: [batch_size]
    pub enc_lens: Tensor<B, 1, Int>,

    /// 1.0 over real encoder tokens, 0.0 over padding: [batch_size, max_enc_len]
    pub enc_padding_mask: Tensor<B, 2>,

    /// Present when the batch was built for the pointer-generator
    pub extend_vocab: Option<ExtendedBatch<B>>,

    /// Decoder input ids: [batch_size, max_dec_steps]
    pub dec_batch: Tensor<B, 2, Int>,

    /// Decoder target ids: [batch_size, max_dec_steps]
    pub target_batch: Tensor<B, 2, Int>,

    /// 1.0 over real decoder tokens, 0.0 over padding: [batch_size, max_dec_steps]
    pub dec_padding_mask: Tensor<B, 2>,

    /// The cleaned article text of each example
    pub original_articles: Vec<String>,

    /// The cleaned abstract text of each example
    pub original_abstracts: Vec<String>,
}

impl<B: Backend> Batch<B> {
    /// Pad and stack examples into a batch of `config.batch_size` rows.
    ///
    /// Encoder rows are padded to the longest encoder input among the examples and decoder rows
    /// to `config.max_dec_steps`. Rows past the last example are all padding.
    pub fn new(
        mut examples: Vec<Example>,
        config: &Config,
        vocab: &Vocab,
        device: &B::Device,
    ) -> Result<Self, BatchError> {
        let batch_size = config.batch_size;
        let pad_id = vocab.pad_id();

        if examples.is_empty() {
            return Err(BatchError::Empty);
        }

        if examples.len() > batch_size {
            return Err(BatchError::TooManyExamples {
                count: examples.len(),
                batch_size,
            });
        }

        if config.pointer_gen && examples.iter().any(|ex| ex.extend_vocab.is_none()) {
            return Err(BatchError::MissingExtendedVocab);
        }

        let max_enc_seq_len = examples.iter().map(|ex| ex.enc_len).max().unwrap_or(0);

        for ex in examples.iter_mut() {
            ex.pad_encoder_input(max_enc_seq_len, pad_id);
            ex.pad_decoder_inp_targ(config.max_dec_steps, pad_id);
        }

        let enc_lens: Vec<usize> = examples.iter().map(|ex| ex.enc_len).collect();
        let dec_lens: Vec<usize> = examples.iter().map(|ex| ex.dec_len).collect();

        let enc_inputs: Vec<Vec<usize>> = examples.iter().map(|ex| ex.enc_input.clone()).collect();
        let enc_batch = tensors::pad_to(pad_id, &enc_inputs, batch_size, max_enc_seq_len, device);

        let mut enc_lens_values = vec![0; batch_size];
        for (value, len) in enc_lens_values.iter_mut().zip(&enc_lens) {
            *value = *len as i64;
        }

        let enc_padding_mask = tensors::length_mask(&enc_lens, batch_size, max_enc_seq_len, device);

        let extend_vocab = if config.pointer_gen {
            let art_oovs: Vec<Vec<String>> = examples
                .iter()
                .map(|ex| ex.article_oovs().to_vec())
                .collect();

            let extended_inputs: Vec<Vec<usize>> = examples
                .iter()
                .filter_map(|ex| ex.extend_vocab.as_ref())
                .map(|e| e.enc_input.clone())
                .collect();

            Some(ExtendedBatch {
                enc_batch: tensors::pad_to(
                    pad_id,
                    &extended_inputs,
                    batch_size,
                    max_enc_seq_len,
                    device,
                ),
                max_art_oovs: art_oovs.iter().map(Vec::len).max().unwrap_or(0),
                art_oovs,
            })
        } else {
            None
        };

        let dec_inputs: Vec<Vec<usize>> = examples.iter().map(|ex| ex.dec_input.clone()).collect();
        let targets: Vec<Vec<usize>> = examples.iter().map(|ex| ex.target.clone()).collect();

        let (original_articles, original_abstracts): (Vec<String>, Vec<String>) = examples
            .into_iter()
            .map(|ex| (ex.original_article, ex.original_abstract))
            .unzip();

        Ok(Self {
            enc_batch,
            enc_lens: tensors::int_tensor(enc_lens_values, [batch_size], device),
            enc_padding_mask,
            extend_vocab,
            dec_batch: tensors::pad_to(pad_id, &dec_inputs, batch_size, config.max_dec_steps, device),
            target_batch: tensors::pad_to(pad_id, &targets, batch_size, config.max_dec_steps, device),
            dec_padding_mask: tensors::length_mask(
                &dec_lens,
                batch_size,
                config.max_dec_steps,
                device,
            ),
            original_articles,
            original_abstracts,
        })
    }

    /// Number of real examples, which can be below the row count for a final short batch
    pub fn num_examples(&self) -> usize {
        self.original_articles.len()
    }

    /// Longest encoder input in the batch
    pub fn max_enc_len(&self) -> usize {
        self.enc_batch.dims()[1]
    }

    /// Largest number of in-article OOVs, 0 outside pointer-generator mode
    pub fn max_art_oovs(&self) -> usize {
        self.extend_vocab
            .as_ref()
            .map(|e| e.max_art_oovs)
            .unwrap_or(0)
    }
}

/// Batch Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    /// No examples were given
    #[error("cannot build a batch from no examples")]
    Empty,

    /// More examples than rows
    #[error("{count} examples do not fit in a batch of {batch_size}")]
    TooManyExamples {
        /// Number of examples given
        count: usize,

        /// Configured batch size
        batch_size: usize,
    },

    /// A pointer-generator batch got an example without extended ids
    #[error("pointer-generator batch requires examples built with pointer_gen")]
    MissingExtendedVocab,
}
