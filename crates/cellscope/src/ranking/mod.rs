//! Ranking algorithms
//!
//! - [`semantic`] - embedding similarity blended with concept, formula and
//!   sheet signals
//! - [`keyword`] - weighted substring matching over document fields
//!
//! Both rankers score candidates independently (in parallel with the
//! `parallel` feature) and then sort stably, so the output order never
//! depends on scheduling.

pub mod keyword;
pub mod semantic;

pub use keyword::KeywordMatch;
pub use semantic::{cosine_similarity, SemanticMatch, SemanticScores};

/// Jaccard overlap of two id sets
///
/// Two empty sets overlap completely (1.0).
pub fn overlap<'a, A, B>(a: A, b: B) -> f64
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    let a: ahash::AHashSet<&str> = a.into_iter().collect();
    let b: ahash::AHashSet<&str> = b.into_iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        assert_eq!(overlap(["a", "b"], ["b", "c"]), 1.0 / 3.0);
        assert_eq!(overlap(["a"], ["a"]), 1.0);
        assert_eq!(overlap(["a"], Vec::<&str>::new()), 0.0);
        assert_eq!(overlap(Vec::<&str>::new(), Vec::<&str>::new()), 1.0);
    }
}
