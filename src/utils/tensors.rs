use burn::tensor::{backend::Backend, Data, ElementConversion, Int, Shape, Tensor};

/// Build an integer tensor from row-major values
pub fn int_tensor<B: Backend, const D: usize>(
    values: Vec<i64>,
    shape: [usize; D],
    device: &B::Device,
) -> Tensor<B, D, Int> {
    let data = Data::<B::IntElem, D>::new(
        values.into_iter().map(|e| e.elem()).collect(),
        Shape::new(shape),
    );

    Tensor::from_data(data, device)
}

/// Build a float tensor from row-major values
pub fn float_tensor<B: Backend, const D: usize>(
    values: Vec<f32>,
    shape: [usize; D],
    device: &B::Device,
) -> Tensor<B, D> {
    let data = Data::<B::FloatElem, D>::new(
        values.into_iter().map(|e| e.elem()).collect(),
        Shape::new(shape),
    );

    Tensor::from_data(data, device)
}

/// Pad a ragged list of token id sequences into a `[rows, seq_length]` tensor.
///
/// Rows past the end of `tokens_list` are filled entirely with `pad_token`, and sequences
/// longer than `seq_length` are cut.
pub fn pad_to<B: Backend>(
    pad_token: usize,
    tokens_list: &[Vec<usize>],
    rows: usize,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let mut values = vec![pad_token as i64; rows * seq_length];

    for (index, tokens) in tokens_list.iter().take(rows).enumerate() {
        let start = index * seq_length;

        for (offset, token) in tokens.iter().take(seq_length).enumerate() {
            values[start + offset] = *token as i64;
        }
    }

    int_tensor(values, [rows, seq_length], device)
}

/// A `[rows, seq_length]` float mask with 1.0 over the first `lengths[i]` positions of row `i`
pub fn length_mask<B: Backend>(
    lengths: &[usize],
    rows: usize,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut values = vec![0.0; rows * seq_length];

    for (index, length) in lengths.iter().take(rows).enumerate() {
        let start = index * seq_length;
        values[start..start + (*length).min(seq_length)].fill(1.0);
    }

    float_tensor(values, [rows, seq_length], device)
}

/// A `[batch_size, seq_length]` tensor whose row `i` is filled with `i`
pub fn batch_nums<B: Backend>(
    batch_size: usize,
    seq_length: usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let values = (0..batch_size)
        .flat_map(|row| std::iter::repeat(row as i64).take(seq_length))
        .collect();

    int_tensor(values, [batch_size, seq_length], device)
}

/// Project per-position copy probabilities onto the extended vocabulary.
///
/// `enc_batch_extend_vocab` and `copy_dist` are both `[batch_size, enc_len]`; `batch_nums`
/// holds the row number of every position (see [`batch_nums`]). The result is
/// `[batch_size, extended_vsize]` where entry `(b, id)` sums the copy probability of every
/// position in row `b` whose extended id is `id`.
pub fn scatter_copy_dist<B: Backend>(
    enc_batch_extend_vocab: Tensor<B, 2, Int>,
    batch_nums: Tensor<B, 2, Int>,
    extended_vsize: usize,
    copy_dist: Tensor<B, 2>,
) -> Tensor<B, 2> {
    let [batch_size, enc_len] = enc_batch_extend_vocab.dims();
    let device = copy_dist.device();
    let positions = batch_size * enc_len;

    let linear_indices = batch_nums
        .reshape([positions])
        .mul_scalar(extended_vsize as i64)
        .add(enc_batch_extend_vocab.reshape([positions]));

    let flat_copy = copy_dist.reshape([positions]);

    Tensor::<B, 1>::zeros([batch_size * extended_vsize], &device)
        .scatter(0, linear_indices, flat_copy)
        .reshape([batch_size, extended_vsize])
}

/// Gather `params[indices1[k], indices2[k]]` for every `k` from a 2D tensor
pub fn gather_2d<B: Backend>(
    params: Tensor<B, 2>,
    indices1: Tensor<B, 1, Int>,
    indices2: Tensor<B, 1, Int>,
) -> Tensor<B, 1> {
    let [rows, cols] = params.dims();
    let flat = params.reshape([rows * cols]);
    let flat_idx = indices1.mul_scalar(cols as i64).add(indices2);

    flat.select(0, flat_idx)
}

/// Append `max_art_oovs` zero columns to a `[batch_size, vsize]` vocabulary distribution
pub fn extend_vocab_dist<B: Backend>(vocab_dist: Tensor<B, 2>, max_art_oovs: usize) -> Tensor<B, 2> {
    if max_art_oovs == 0 {
        return vocab_dist;
    }

    let [batch_size, _] = vocab_dist.dims();
    let extra_zeros = Tensor::zeros([batch_size, max_art_oovs], &vocab_dist.device());

    Tensor::cat(vec![vocab_dist, extra_zeros], 1)
}

/// Mix the generation and copy distributions with the `[batch_size, 1]` generation probability.
///
/// `vocab_dist` is over the fixed vocabulary and gets extended with zeros to match the width of
/// `copy_dist_projected`, the output of [`scatter_copy_dist`].
pub fn final_dist<B: Backend>(
    vocab_dist: Tensor<B, 2>,
    copy_dist_projected: Tensor<B, 2>,
    p_gen: Tensor<B, 2>,
) -> Tensor<B, 2> {
    let [_, vsize] = vocab_dist.dims();
    let [_, extended_vsize] = copy_dist_projected.dims();

    let vocab_part = extend_vocab_dist(vocab_dist, extended_vsize.saturating_sub(vsize))
        .mul(p_gen.clone());
    let copy_part = copy_dist_projected.mul(p_gen.neg().add_scalar(1.0));

    vocab_part.add(copy_part)
}
