//! Time-index resolution: map a playback position to the verse that
//! should be active, given the ascending per-verse start times.

/// Return the highest index `i` with `t >= thresholds[i]`.
///
/// Thresholds are inclusive lower bounds: a query equal to a verse's
/// start time selects that verse. Queries before the first threshold
/// (and queries against an empty list) resolve to index 0. Non-ascending
/// input still yields some index `<= n - 1`, but no monotonic guarantee.
pub fn verse_index_at(thresholds: &[f64], t: f64) -> usize {
    thresholds
        .iter()
        .rposition(|&start| t >= start)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_between_thresholds() {
        let t = [0.0, 12.5, 30.0];
        assert_eq!(verse_index_at(&t, 15.0), 1);
    }

    #[test]
    fn exact_threshold_is_inclusive() {
        let t = [0.0, 12.5, 30.0];
        assert_eq!(verse_index_at(&t, 12.5), 1);
        assert_eq!(verse_index_at(&t, 30.0), 2);
    }

    #[test]
    fn before_first_threshold_returns_zero() {
        let t = [5.0, 10.0];
        assert_eq!(verse_index_at(&t, 2.0), 0);
    }

    #[test]
    fn past_last_threshold_clamps_to_last() {
        let t = [0.0, 10.0, 20.0];
        assert_eq!(verse_index_at(&t, 9999.0), 2);
    }

    #[test]
    fn empty_list_returns_zero() {
        assert_eq!(verse_index_at(&[], 42.0), 0);
    }

    #[test]
    fn agrees_with_linear_scan_on_ascending_input() {
        let t = [0.0, 3.25, 3.25, 8.0, 21.5];
        for q in [0.0, 1.0, 3.24, 3.25, 7.99, 8.0, 21.49, 21.5, 100.0] {
            let mut expected = 0;
            for (i, &start) in t.iter().enumerate() {
                if q >= start {
                    expected = i;
                }
            }
            assert_eq!(verse_index_at(&t, q), expected, "query {q}");
        }
    }

    #[test]
    fn non_ascending_input_stays_in_bounds() {
        let t = [10.0, 5.0, 20.0];
        for q in [0.0, 6.0, 11.0, 25.0] {
            assert!(verse_index_at(&t, q) < t.len());
        }
    }
}
