use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use burn::{
    backend::NdArray,
    data::dataloader::DataLoaderBuilder,
    tensor::{Int, Tensor},
};
use burn_summarization::{
    datasets::pairs,
    pipelines::summarization::{Batch, Batcher, Config, Mode, Vocab},
};
use pretty_assertions::assert_eq;
use tempdir::TempDir;

type TestBackend = NdArray;

const ARTICLES: &str = "\
the cat sat on the mat
the cat
\u{2014}
the cat sat on
the dog sat on the mat with the cat
cat
the mat sat
";

const ABSTRACTS: &str = "\
cat sat
cat
nothing
cat on mat
dog sat
cat
mat
";

fn corpus(dir: &TempDir) -> PathBuf {
    let prefix = dir.path().join("val");
    std::fs::write(dir.path().join("val.x.txt"), ARTICLES).unwrap();
    std::fs::write(dir.path().join("val.y.txt"), ABSTRACTS).unwrap();

    prefix
}

fn vocab() -> Arc<Vocab> {
    Arc::new(Vocab::from_words(["the", "cat", "sat", "on", "mat"], 0))
}

fn ints<const D: usize>(tensor: Tensor<TestBackend, D, Int>) -> Vec<i64> {
    tensor.into_data().convert::<i64>().value
}

fn collect(batcher: &Batcher<TestBackend>, prefix: &Path) -> Vec<Batch<TestBackend>> {
    batcher
        .pair_iter(prefix)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn single_pass_keeps_file_order_and_skips_empty_articles() {
    let dir = TempDir::new("batcher_test").unwrap();
    let prefix = corpus(&dir);
    let config = Config::new().with_batch_size(4).with_max_dec_steps(6);
    let batcher = Batcher::<TestBackend>::new(vocab(), config, true, Default::default());

    let batches = collect(&batcher, &prefix);

    assert_eq!(batches.len(), 2);
    assert_eq!(
        batches[0].original_articles,
        vec!["the cat sat on the mat", "the cat", "the cat sat on", "the dog sat on the mat with the cat"]
    );
    assert_eq!(batches[1].original_articles, vec!["cat", "the mat sat"]);

    // Encoder rows are padded to the longest article in each batch
    assert_eq!(batches[0].enc_batch.dims(), [4, 9]);
    assert_eq!(batches[1].enc_batch.dims(), [4, 3]);
    assert_eq!(ints(batches[1].enc_lens.clone()), vec![1, 3, 0, 0]);

    // Decoder rows always span max_dec_steps
    for batch in &batches {
        assert_eq!(batch.dec_batch.dims(), [4, 6]);
        assert_eq!(batch.target_batch.dims(), [4, 6]);
    }
}

#[test]
fn decoder_sequences_carry_sentinels() {
    let dir = TempDir::new("batcher_test").unwrap();
    let prefix = corpus(&dir);
    let config = Config::new().with_batch_size(4).with_max_dec_steps(3);
    let batcher = Batcher::<TestBackend>::new(vocab(), config, true, Default::default());

    let batches = collect(&batcher, &prefix);
    let dec = ints(batches[0].dec_batch.clone());
    let target = ints(batches[0].target_batch.clone());

    // "cat sat" fits with its stop id, "cat on mat" is truncated without one
    assert_eq!(&dec[0..3], &[1, 5, 6]);
    assert_eq!(&target[0..3], &[5, 6, 2]);
    assert_eq!(&dec[6..9], &[1, 5, 7]);
    assert_eq!(&target[6..9], &[5, 7, 8]);

    // "dog" is copied from the article with its temporary id
    let extend_vocab = batches[0].extend_vocab.as_ref().unwrap();
    assert_eq!(extend_vocab.art_oovs[3], vec!["dog", "with"]);
    assert_eq!(extend_vocab.max_art_oovs, 2);
    assert_eq!(&target[9..12], &[9, 6, 2]);
}

#[test]
fn bucketed_batches_group_similar_lengths() {
    let dir = TempDir::new("batcher_test").unwrap();
    let prefix = corpus(&dir);
    let config = Config::new()
        .with_batch_size(3)
        .with_max_dec_steps(4)
        .with_seed(Some(42));
    let batcher = Batcher::<TestBackend>::new(vocab(), config, false, Default::default());

    let mut batches = collect(&batcher, &prefix);
    batches.sort_by_key(|batch| batch.max_enc_len());

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].original_articles, vec!["cat", "the cat", "the mat sat"]);
    assert_eq!(batches[0].max_enc_len(), 3);
    assert_eq!(batches[1].max_enc_len(), 9);
}

#[test]
fn seeded_shuffles_are_reproducible() {
    let dir = TempDir::new("batcher_test").unwrap();
    let prefix = corpus(&dir);
    let config = Config::new().with_batch_size(1).with_seed(Some(7));
    let batcher = Batcher::<TestBackend>::new(vocab(), config, false, Default::default());

    let first: Vec<_> = collect(&batcher, &prefix)
        .into_iter()
        .map(|batch| batch.original_articles)
        .collect();
    let second: Vec<_> = collect(&batcher, &prefix)
        .into_iter()
        .map(|batch| batch.original_articles)
        .collect();

    assert_eq!(first.len(), 6);
    assert_eq!(first, second);
}

#[test]
fn decode_mode_batches_consecutive_examples() {
    let dir = TempDir::new("batcher_test").unwrap();
    let prefix = corpus(&dir);
    let config = Config::new().with_batch_size(4).with_mode(Mode::Decode);
    let batcher = Batcher::<TestBackend>::new(vocab(), config, false, Default::default());

    let batches = collect(&batcher, &prefix);

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].num_examples(), 4);
    assert_eq!(batches[0].original_articles[2], "the cat sat on");
    assert_eq!(batches[1].original_articles, vec!["cat", "the mat sat"]);
}

#[test]
fn mismatched_files_surface_as_errors() {
    let dir = TempDir::new("batcher_test").unwrap();
    let prefix = dir.path().join("broken");
    std::fs::write(dir.path().join("broken.x.txt"), "the cat\nthe mat\n").unwrap();
    std::fs::write(dir.path().join("broken.y.txt"), "cat\n").unwrap();
    let batcher = Batcher::<TestBackend>::new(vocab(), Config::new(), true, Default::default());

    let results: Vec<_> = batcher.pair_iter(&prefix).unwrap().collect();

    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}

#[test]
fn drives_a_burn_dataloader() {
    let dir = TempDir::new("batcher_test").unwrap();
    let prefix = corpus(&dir);
    let config = Config::new().with_batch_size(2).with_max_dec_steps(5);
    let batcher = Batcher::<TestBackend>::new(vocab(), config, true, Default::default());
    let dataset = pairs::Dataset::load(&prefix).unwrap();

    let dataloader = DataLoaderBuilder::new(batcher).batch_size(2).build(dataset);
    let batches: Vec<Batch<TestBackend>> = dataloader.iter().collect();

    assert_eq!(batches.len(), 3);
    assert!(batches.iter().all(|batch| batch.dec_batch.dims() == [2, 5]));
}

/// More lines than a single refill reads for a batch size of 2
fn long_corpus(dir: &TempDir, lines: usize) -> (PathBuf, Vec<String>) {
    let articles: Vec<String> = (0..lines)
        .map(|i| format!("{}cat {i}", "the ".repeat(i % 7)))
        .collect();
    let abstracts = vec!["cat"; lines];

    let prefix = dir.path().join("long");
    std::fs::write(dir.path().join("long.x.txt"), articles.join("\n") + "\n").unwrap();
    std::fs::write(dir.path().join("long.y.txt"), abstracts.join("\n") + "\n").unwrap();

    (prefix, articles)
}

#[test]
fn single_pass_keeps_file_order_across_refills() {
    let dir = TempDir::new("batcher_test").unwrap();
    let (prefix, articles) = long_corpus(&dir, 37);
    let config = Config::new().with_batch_size(2).with_max_dec_steps(3);
    let batcher = Batcher::<TestBackend>::new(vocab(), config, true, Default::default());

    let batches = collect(&batcher, &prefix);
    let seen: Vec<String> = batches
        .iter()
        .flat_map(|batch| batch.original_articles.clone())
        .collect();

    assert_eq!(batches.len(), 19);
    assert_eq!(batches.iter().map(Batch::num_examples).sum::<usize>(), 37);
    assert_eq!(seen, articles);
}

#[test]
fn bucketed_batches_cover_every_line_across_refills() {
    let dir = TempDir::new("batcher_test").unwrap();
    let (prefix, mut articles) = long_corpus(&dir, 37);
    let config = Config::new()
        .with_batch_size(2)
        .with_max_dec_steps(3)
        .with_seed(Some(3));
    let batcher = Batcher::<TestBackend>::new(vocab(), config, false, Default::default());

    let batches = collect(&batcher, &prefix);
    let mut seen: Vec<String> = batches
        .iter()
        .flat_map(|batch| batch.original_articles.clone())
        .collect();

    assert_eq!(batches.len(), 19);
    assert_eq!(batches.iter().map(Batch::num_examples).sum::<usize>(), 37);

    seen.sort();
    articles.sort();
    assert_eq!(seen, articles);
}
