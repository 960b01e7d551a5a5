//! Score-and-sort fuzzy ranking shared by the completers.
//!
//! The ranking is a fixed contract: exact match ≫ prefix ≫ substring ≫
//! subsequence, with length-ratio bonuses inside each band so shorter
//! candidates rise. Ties keep input order (the sort is stable), and an
//! exact match always ranks strictly above any non-exact one.

pub trait Matchable {
    /// The string used for fuzzy matching.
    fn match_string(&self) -> &str;
}

impl Matchable for String {
    fn match_string(&self) -> &str {
        self
    }
}

/// Rank candidates against a query, dropping non-matches.
///
/// An empty query keeps every candidate in input order with a uniform
/// score of 1.0.
pub fn fuzzy_match<T: Matchable>(query: &str, candidates: Vec<T>) -> Vec<(T, f64)> {
    if query.is_empty() {
        return candidates.into_iter().map(|c| (c, 1.0)).collect();
    }

    let query = query.to_lowercase();

    let mut scored: Vec<(T, f64)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let score = score(&query, &candidate.match_string().to_lowercase())?;
            Some((candidate, score))
        })
        .collect();

    // Stable sort: equal scores keep input order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Score one folded candidate against a folded query. `None` drops the
/// candidate.
fn score(query: &str, candidate: &str) -> Option<f64> {
    let query_len = query.chars().count() as f64;
    let candidate_len = candidate.chars().count() as f64;

    if candidate == query {
        return Some(100.0);
    }
    if candidate.starts_with(query) {
        return Some(50.0 + 10.0 * (query_len / candidate_len));
    }
    if candidate.contains(query) {
        return Some(25.0 + 5.0 * (query_len / candidate_len));
    }

    subsequence_score(query, candidate)
}

/// All query chars must appear in order; the score is the sum of the
/// consecutive-run lengths plus one.
fn subsequence_score(query: &str, candidate: &str) -> Option<f64> {
    let mut query_chars = query.chars().peekable();
    let mut run = 0usize;
    let mut total = 0usize;

    for c in candidate.chars() {
        match query_chars.peek() {
            Some(&next) if next == c => {
                query_chars.next();
                run += 1;
            }
            Some(_) => {
                total += run;
                run = 0;
            }
            None => break,
        }
    }
    total += run;

    if query_chars.peek().is_some() {
        return None;
    }

    Some((total + 1) as f64)
}
