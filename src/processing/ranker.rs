//! Ordering and truncation of scored candidates

use log::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    /// 1-based position in the output
    pub rank: usize,
    /// Position in the caller's input list
    pub index: usize,
    pub score: f32,
    pub item: T,
}

/// Sort `(input_index, score, item)` triples by descending score, ties by input index,
/// and keep the first `top_k`. Non-finite scores are dropped.
pub fn rank<T, I>(candidates: I, top_k: usize) -> Vec<Ranked<T>>
where
    I: IntoIterator<Item = (usize, f32, T)>,
{
    let mut scored: Vec<(usize, f32, T)> = candidates
        .into_iter()
        .filter(|(index, score, _)| {
            if score.is_finite() {
                true
            } else {
                warn!("Dropping candidate {} with non-finite score", index);
                false
            }
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(top_k);

    scored
        .into_iter()
        .enumerate()
        .map(|(pos, (index, score, item))| Ranked {
            rank: pos + 1,
            index,
            score,
            item,
        })
        .collect()
}
