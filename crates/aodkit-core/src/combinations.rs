/// Every element of `a` paired with every element of `b`, in `a`-major order.
///
/// There is no de-duplication: if the same row appears in both inputs, it is paired with itself.
/// The result is empty if either side is empty.
///
/// ```
/// use aodkit_core::full_index_combinations;
///
/// let pairs: Vec<_> = full_index_combinations(&[1, 2], &['a', 'b', 'c']).collect();
/// assert_eq!(pairs, vec![(1, 'a'), (1, 'b'), (1, 'c'), (2, 'a'), (2, 'b'), (2, 'c')]);
/// ```
pub fn full_index_combinations<'a, A: Copy, B: Copy>(
    a: &'a [A],
    b: &'a [B],
) -> impl Iterator<Item = (A, B)> + 'a {
    a.iter()
        .flat_map(move |&first| b.iter().map(move |&second| (first, second)))
}

/// Pairs `(a[i], a[j])` with `i < j`, for combinations within a single collection.
pub fn strictly_upper_combinations<A: Copy>(a: &[A]) -> impl Iterator<Item = (A, A)> + '_ {
    a.iter().enumerate().flat_map(move |(i, &first)| {
        a[i + 1..].iter().map(move |&second| (first, second))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_frame;

    #[test]
    fn test_full_index_combinations_count() {
        let a = [0, 1, 2];
        let b = [10, 11, 12, 13];
        assert_eq!(full_index_combinations(&a, &b).count(), 12);
        assert_eq!(full_index_combinations(&a, &[] as &[i32]).count(), 0);
        assert_eq!(full_index_combinations(&[] as &[i32], &b).count(), 0);
    }

    #[test]
    fn test_full_index_combinations_keeps_self_pairs() {
        let a = [7, 8];
        let pairs: Vec<_> = full_index_combinations(&a, &a).collect();
        assert_eq!(pairs, vec![(7, 7), (7, 8), (8, 7), (8, 8)]);
    }

    #[test]
    fn test_strictly_upper_combinations() {
        let pairs: Vec<_> = strictly_upper_combinations(&[1, 2, 3]).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
        assert_eq!(strictly_upper_combinations(&[1]).count(), 0);
        assert_eq!(strictly_upper_combinations::<i32>(&[]).count(), 0);
    }

    #[test]
    fn test_row_combinations_keep_indices() {
        let frame = test_frame();
        let group = frame.tracks.slice_by_collision(1);
        let pairs: Vec<(usize, usize)> = strictly_upper_combinations(group.rows())
            .map(|(a, b)| (a.index(), b.index()))
            .collect();
        assert_eq!(pairs.len(), 10);
        assert_eq!(pairs[0], (5, 6));
        assert!(pairs.iter().all(|(a, b)| a < b));
    }
}
