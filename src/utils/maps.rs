use std::hash::Hash;

/// Invert a map by swapping keys and values
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    K: Hash + Eq,
    V: Hash + Eq,
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

/// Index an ordered list, mapping each entry to its position
pub fn index_map<V, MV>(entries: &[V]) -> MV
where
    V: Hash + Eq + Clone,
    MV: FromIterator<(V, usize)>,
{
    invert_map(entries.iter().cloned().enumerate())
}
