//! Command line tool to stream a corpus through the batcher and report batch statistics

use std::sync::Arc;

use anyhow::anyhow;
use burn::{
    backend::{ndarray::NdArrayDevice, NdArray},
    config::Config as _,
};
use burn_summarization::pipelines::summarization::{
    vocab::{show_abs_oovs, show_art_oovs, tokenize},
    Batch, Batcher, Config, Mode, Vocab,
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: batch DATA_PATH VOCAB [OPTIONS]

Arguments:
  DATA_PATH            Prefix of the data files (reads DATA_PATH.x.txt and DATA_PATH.y.txt)
  VOCAB                The vocabulary file, one word per line

Options:
  -h, --help           Print help
  -c, --config         A JSON config file to start from
  -b, --batch-size     Batch size
  --max-enc-steps      Maximum encoder length
  --max-dec-steps      Decoder length
  --mode               One of 'train', 'eval' or 'decode'
  --seed               Seed for batch shuffling
  --single-pass        Read the data once, in file order
  --no-pointer-gen     Skip the extended-vocabulary encoding
";

#[derive(Debug)]
struct Args {
    data_path: String,
    vocab: String,
    config: Option<String>,
    batch_size: Option<usize>,
    max_enc_steps: Option<usize>,
    max_dec_steps: Option<usize>,
    mode: Option<String>,
    seed: Option<u64>,
    single_pass: bool,
    pointer_gen: bool,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            max_enc_steps: pargs.opt_value_from_str("--max-enc-steps")?,
            max_dec_steps: pargs.opt_value_from_str("--max-dec-steps")?,
            mode: pargs.opt_value_from_str("--mode")?,
            seed: pargs.opt_value_from_str("--seed")?,
            single_pass: pargs.contains("--single-pass"),
            pointer_gen: !(pargs.contains("--no-pointer-gen")),
            data_path: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATA_PATH"),
                _ => anyhow!("{}", e),
            })?,
            vocab: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: VOCAB"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }

    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .map_err(|e| anyhow!("Unable to load config file {}: {}", path, e))?,
            None => Config::new(),
        };

        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }

        if let Some(max_enc_steps) = self.max_enc_steps {
            config.max_enc_steps = max_enc_steps;
        }

        if let Some(max_dec_steps) = self.max_dec_steps {
            config.max_dec_steps = max_dec_steps;
        }

        if let Some(mode) = &self.mode {
            config.mode = Mode::try_from(mode.as_str())?;
        }

        if self.seed.is_some() {
            config.seed = self.seed;
        }

        if !self.pointer_gen {
            config.pointer_gen = false;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let Some(args) = Args::parse()? else {
        print!("{}", HELP);

        return Ok(());
    };

    let config = args.config()?;
    let vocab = Arc::new(Vocab::load(&args.vocab, config.vocab_size)?);

    let batcher = Batcher::<NdArray>::new(
        vocab.clone(),
        config.clone(),
        args.single_pass,
        NdArrayDevice::Cpu,
    );

    let mut num_batches = 0;
    let mut num_examples = 0;
    let mut real_enc_tokens = 0.0;
    let mut total_enc_slots = 0;

    for batch in batcher.pair_iter(&args.data_path)? {
        let batch = batch?;

        if num_batches == 0 {
            show_first_example(&batch, &vocab);
        }

        let enc_tokens: f32 = batch.enc_padding_mask.clone().sum().into_scalar();

        log::info!(
            "batch {}: {} examples, enc {:?}, dec {:?}, max article OOVs {}",
            num_batches,
            batch.num_examples(),
            batch.enc_batch.dims(),
            batch.dec_batch.dims(),
            batch.max_art_oovs()
        );

        num_batches += 1;
        num_examples += batch.num_examples();
        real_enc_tokens += enc_tokens;
        total_enc_slots += batch.enc_batch.dims().iter().product::<usize>();
    }

    let padding_ratio = if total_enc_slots == 0 {
        0.0
    } else {
        1.0 - real_enc_tokens / total_enc_slots as f32
    };

    println!(
        "\n=== {} ===\
         \n- Mode: {}\
         \n- Batches: {}\
         \n- Examples: {}\
         \n- Encoder padding: {:.1}%\
         \n================",
        args.data_path,
        config.mode,
        num_batches,
        num_examples,
        padding_ratio * 100.0
    );

    Ok(())
}

fn show_first_example(batch: &Batch<NdArray>, vocab: &Vocab) {
    let (Some(article), Some(abstract_text)) = (
        batch.original_articles.first(),
        batch.original_abstracts.first(),
    ) else {
        return;
    };

    let art_oovs = batch
        .extend_vocab
        .as_ref()
        .and_then(|e| e.art_oovs.first())
        .map(Vec::as_slice);

    println!(
        "\n=== First example ===\
         \n- Article: {}\
         \n- Abstract: {}\
         \n================",
        show_art_oovs(&tokenize(article), vocab),
        show_abs_oovs(&tokenize(abstract_text), vocab, art_oovs)
    );
}
