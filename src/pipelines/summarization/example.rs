use derive_new::new;

use super::{
    vocab::{abstract2ids, article2ids, tokenize, Vocab},
    Config,
};

/// Article ids with in-article OOVs represented by their temporary ids
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct ExtendedInput {
    /// Encoder ids over the extended vocabulary
    pub enc_input: Vec<usize>,

    /// The article's OOV words, in order of first appearance
    pub article_oovs: Vec<String>,
}

/// One article/abstract pair, truncated and mapped to ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// Encoder length after truncation and before padding
    pub enc_len: usize,

    /// Encoder ids, OOVs mapped to the unknown id
    pub enc_input: Vec<usize>,

    /// Decoder length before padding
    pub dec_len: usize,

    /// Decoder input ids, beginning with the start id
    pub dec_input: Vec<usize>,

    /// Decoder target ids, ending with the stop id unless truncated
    pub target: Vec<usize>,

    /// Extended-vocabulary encoding, present in pointer-generator mode
    pub extend_vocab: Option<ExtendedInput>,

    /// The cleaned article text, before truncation
    pub original_article: String,

    /// The cleaned abstract text
    pub original_abstract: String,
}

impl Example {
    /// Tokenize, truncate and map an article/abstract pair to ids
    pub fn new(article: &str, abstract_text: &str, vocab: &Vocab, config: &Config) -> Self {
        let start_decoding = vocab.start_id();
        let stop_decoding = vocab.stop_id();

        let article_tokens = tokenize(article);
        let article_words = &article_tokens[..article_tokens.len().min(config.max_enc_steps)];

        let enc_len = article_words.len();
        let enc_input = article_words.iter().map(|w| vocab.word2id(w)).collect();

        let abstract_words = tokenize(abstract_text);
        let abs_ids: Vec<usize> = abstract_words.iter().map(|w| vocab.word2id(w)).collect();

        let (dec_input, mut target) = Self::dec_inp_targ_seqs(
            &abs_ids,
            config.max_dec_steps,
            start_decoding,
            stop_decoding,
        );
        let dec_len = dec_input.len();

        let extend_vocab = if config.pointer_gen {
            let (enc_input_extend_vocab, article_oovs) = article2ids(article_words, vocab);

            // The target points at temporary ids so copied OOVs are scored against the article
            let abs_ids_extend_vocab = abstract2ids(&abstract_words, vocab, &article_oovs);
            (_, target) = Self::dec_inp_targ_seqs(
                &abs_ids_extend_vocab,
                config.max_dec_steps,
                start_decoding,
                stop_decoding,
            );

            Some(ExtendedInput::new(enc_input_extend_vocab, article_oovs))
        } else {
            None
        };

        Self {
            enc_len,
            enc_input,
            dec_len,
            dec_input,
            target,
            extend_vocab,
            original_article: article_tokens.join(" "),
            original_abstract: abstract_words.join(" "),
        }
    }

    /// Build the decoder input and target from an abstract's ids.
    ///
    /// The input is `start_id` followed by the sequence, the target is the sequence followed by
    /// `stop_id`. When the input would exceed `max_len` both are cut to `max_len` and the stop
    /// id is dropped. The two always have the same length.
    pub fn dec_inp_targ_seqs(
        sequence: &[usize],
        max_len: usize,
        start_id: usize,
        stop_id: usize,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut inp = Vec::with_capacity(sequence.len() + 1);
        inp.push(start_id);
        inp.extend_from_slice(sequence);

        let mut target = sequence.to_vec();

        if inp.len() > max_len {
            inp.truncate(max_len);
            target.truncate(max_len);
        } else {
            target.push(stop_id);
        }

        (inp, target)
    }

    /// Pad the decoder input and target with `pad_id` up to `max_len`
    pub fn pad_decoder_inp_targ(&mut self, max_len: usize, pad_id: usize) {
        pad(&mut self.dec_input, max_len, pad_id);
        pad(&mut self.target, max_len, pad_id);
    }

    /// Pad the encoder input (and its extended form) with `pad_id` up to `max_len`
    pub fn pad_encoder_input(&mut self, max_len: usize, pad_id: usize) {
        pad(&mut self.enc_input, max_len, pad_id);

        if let Some(extend_vocab) = self.extend_vocab.as_mut() {
            pad(&mut extend_vocab.enc_input, max_len, pad_id);
        }
    }

    /// The article's OOV words, empty outside pointer-generator mode
    pub fn article_oovs(&self) -> &[String] {
        self.extend_vocab
            .as_ref()
            .map(|e| e.article_oovs.as_slice())
            .unwrap_or_default()
    }
}

fn pad(ids: &mut Vec<usize>, max_len: usize, pad_id: usize) {
    if ids.len() < max_len {
        ids.resize(max_len, pad_id);
    }
}
