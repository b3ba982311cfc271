//! Tied-rank leaderboard computations.
//!
//! Entries are ordered by descending score with missing scores counted as
//! zero. The sort is stable, so entries with equal scores keep the order in
//! which they were supplied.

/// Default number of winners selected when the caller does not ask otherwise.
pub const DEFAULT_WINNER_COUNT: usize = 5;

/// Anything that carries an optional score.
pub trait Scored {
    fn score(&self) -> Option<i64>;
}

/// Minimal scored value used when only an identifier and a score are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredEntry {
    pub id: String,
    pub score: Option<i64>,
}

impl Scored for ScoredEntry {
    fn score(&self) -> Option<i64> {
        self.score
    }
}

/// An entry annotated with its competition rank (1, 1, 3, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked<T> {
    pub rank: usize,
    pub entry: T,
}

fn effective_score<T: Scored>(entry: &T) -> i64 {
    entry.score().unwrap_or(0)
}

/// Sort entries by descending score, keeping input order among ties.
pub fn sorted_by_score<T: Scored + Clone>(entries: &[T]) -> Vec<T> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|entry| std::cmp::Reverse(effective_score(entry)));
    sorted
}

/// Select the top `n` entries, extended with every entry tied with the
/// `n`-th best score.
///
/// Returns every entry when there are at most `n` of them and nothing when
/// `n` is zero. The result is sorted by descending score.
pub fn select_winners<T: Scored + Clone>(entries: &[T], n: usize) -> Vec<T> {
    if n == 0 {
        return Vec::new();
    }

    let sorted = sorted_by_score(entries);
    if sorted.len() <= n {
        return sorted;
    }

    let cutoff = effective_score(&sorted[n - 1]);
    sorted
        .into_iter()
        .take_while(|entry| effective_score(entry) >= cutoff)
        .collect()
}

/// Sort every entry and annotate it with its competition rank.
pub fn rank<T: Scored + Clone>(entries: &[T]) -> Vec<Ranked<T>> {
    let sorted = sorted_by_score(entries);
    let mut ranked: Vec<Ranked<T>> = Vec::with_capacity(sorted.len());
    let mut previous: Option<i64> = None;

    for (index, entry) in sorted.into_iter().enumerate() {
        let score = effective_score(&entry);
        let rank = match (previous, ranked.last()) {
            (Some(prev), Some(last)) if prev == score => last.rank,
            _ => index + 1,
        };
        previous = Some(score);
        ranked.push(Ranked { rank, entry });
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(scores: &[Option<i64>]) -> Vec<ScoredEntry> {
        scores
            .iter()
            .enumerate()
            .map(|(index, score)| ScoredEntry {
                id: format!("e{index}"),
                score: *score,
            })
            .collect()
    }

    fn ids(entries: &[ScoredEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn ties_above_the_cut_take_separate_slots() {
        let input = entries(&[Some(90), Some(90), Some(80), Some(70), Some(60)]);
        let winners = select_winners(&input, 3);
        assert_eq!(ids(&winners), vec!["e0", "e1", "e2"]);
    }

    #[test]
    fn ties_at_the_cut_are_all_included() {
        let input = entries(&[Some(50), Some(50), Some(50)]);
        let winners = select_winners(&input, 1);
        assert_eq!(winners.len(), 3);
    }

    #[test]
    fn tie_straddling_the_boundary_extends_the_selection() {
        let input = entries(&[Some(10), Some(40), Some(30), Some(30), Some(20)]);
        let winners = select_winners(&input, 2);
        assert_eq!(ids(&winners), vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn fewer_entries_than_requested_returns_all_sorted() {
        let input = entries(&[Some(1), Some(3), Some(2)]);
        let winners = select_winners(&input, DEFAULT_WINNER_COUNT);
        assert_eq!(ids(&winners), vec!["e1", "e2", "e0"]);
    }

    #[test]
    fn zero_winners_requested_returns_nothing() {
        let input = entries(&[Some(5), Some(5)]);
        assert!(select_winners(&input, 0).is_empty());
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let input: Vec<ScoredEntry> = Vec::new();
        assert!(select_winners(&input, 3).is_empty());
        assert!(rank(&input).is_empty());
    }

    #[test]
    fn missing_score_counts_as_zero() {
        let input = entries(&[None, Some(-1), Some(0)]);
        let ranked = rank(&input);
        assert_eq!(
            ranked.iter().map(|r| (r.entry.id.as_str(), r.rank)).collect::<Vec<_>>(),
            vec![("e0", 1), ("e2", 1), ("e1", 3)]
        );
    }

    #[test]
    fn competition_ranking_skips_after_ties() {
        let input = entries(&[Some(90), Some(90), Some(80), Some(70), Some(70), Some(60)]);
        let ranks: Vec<usize> = rank(&input).into_iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3, 4, 4, 6]);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let input = entries(&[Some(7), Some(9), Some(7), Some(7)]);
        let ranked = rank(&input);
        assert_eq!(
            ranked.iter().map(|r| r.entry.id.as_str()).collect::<Vec<_>>(),
            vec!["e1", "e0", "e2", "e3"]
        );
    }

    #[test]
    fn selected_entries_outscore_every_excluded_entry() {
        let input = entries(&[
            Some(12),
            Some(3),
            Some(12),
            Some(8),
            None,
            Some(8),
            Some(15),
            Some(8),
        ]);
        for n in 0..=input.len() + 1 {
            let winners = select_winners(&input, n);
            let excluded: Vec<&ScoredEntry> = input
                .iter()
                .filter(|entry| !winners.iter().any(|w| w.id == entry.id))
                .collect();

            for winner in &winners {
                for other in &excluded {
                    assert!(winner.score.unwrap_or(0) >= other.score.unwrap_or(0));
                    assert_ne!(
                        winner.score.unwrap_or(0),
                        other.score.unwrap_or(0),
                        "tie split across the boundary for n = {n}"
                    );
                }
            }
        }
    }
}
