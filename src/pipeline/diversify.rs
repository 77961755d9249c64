//! Greedy similarity-capped selection with score-ordered backfill

use crate::pipeline::score::ScoredCandidate;
use fxhash::FxHashMap;

/// Characters of the anchor word used as the similarity key
const PATTERN_KEY_CHARS: usize = 2;

/// First two characters of the first matched word, else of the first token
pub fn pattern_key(candidate: &ScoredCandidate) -> String {
    let anchor = candidate
        .matched_words
        .first()
        .map(String::as_str)
        .or_else(|| candidate.sentence.split_whitespace().next())
        .unwrap_or("");
    anchor.chars().take(PATTERN_KEY_CHARS).collect()
}

/// Pick up to `count` candidates from a score-descending pool.
///
/// A key is admitted at most `max_similar` times in the first pass. If that
/// leaves a shortfall, the best skipped candidates fill it regardless of key.
pub fn diversify(
    scored: Vec<ScoredCandidate>,
    count: usize,
    max_similar: usize,
) -> Vec<ScoredCandidate> {
    if scored.len() <= count {
        return scored;
    }

    let mut key_counts: FxHashMap<String, usize> = FxHashMap::default();
    let mut selected = Vec::with_capacity(count);
    let mut skipped = Vec::new();

    for candidate in scored {
        if selected.len() == count {
            break;
        }
        let seen = key_counts.entry(pattern_key(&candidate)).or_insert(0);
        if *seen < max_similar {
            *seen += 1;
            selected.push(candidate);
        } else {
            skipped.push(candidate);
        }
    }

    // Backfill goes after the admitted ones, best skipped first
    let shortfall = count - selected.len();
    selected.extend(skipped.into_iter().take(shortfall));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::score::ScoreBreakdown;

    pub(super) fn candidate(
        sentence: &str,
        matched: &[&str],
        score: f64,
        order: usize,
    ) -> ScoredCandidate {
        ScoredCandidate {
            sentence: sentence.to_string(),
            matched_words: matched.iter().map(|w| w.to_string()).collect(),
            matched_spans: Vec::new(),
            word_count: sentence.split_whitespace().count(),
            score,
            breakdown: ScoreBreakdown::default(),
            order,
        }
    }

    #[test]
    fn test_pattern_key() {
        assert_eq!(pattern_key(&candidate("라면이랑 먹자", &["라면이랑"], 1.0, 0)), "라면");
        assert_eq!(pattern_key(&candidate("사과 먹자", &[], 1.0, 0)), "사과");
        assert_eq!(pattern_key(&candidate("I run", &[], 1.0, 0)), "I");
        assert_eq!(pattern_key(&candidate("", &[], 1.0, 0)), "");
    }

    #[test]
    fn test_small_pool_returned_unchanged() {
        let pool = vec![candidate("라면 먹자", &["라면"], 90.0, 0)];
        assert_eq!(diversify(pool.clone(), 3, 2), pool);
    }

    #[test]
    fn test_cap_skips_saturated_keys() {
        let pool = vec![
            candidate("라면 하나", &["라면"], 90.0, 0),
            candidate("라면 둘", &["라면"], 85.0, 1),
            candidate("라면 셋", &["라면"], 80.0, 2),
            candidate("로봇 와요", &["로봇"], 70.0, 3),
        ];
        let picked = diversify(pool, 3, 2);
        let texts: Vec<&str> = picked.iter().map(|c| c.sentence.as_str()).collect();
        assert_eq!(texts, vec!["라면 하나", "라면 둘", "로봇 와요"]);
    }

    #[test]
    fn test_backfill_ignores_cap() {
        let pool = vec![
            candidate("라면 하나", &["라면"], 90.0, 0),
            candidate("라면 둘", &["라면"], 85.0, 1),
            candidate("라면 셋", &["라면"], 80.0, 2),
            candidate("라면 넷", &["라면"], 75.0, 3),
            candidate("라면 다섯", &["라면"], 70.0, 4),
        ];
        let picked = diversify(pool, 4, 2);
        let texts: Vec<&str> = picked.iter().map(|c| c.sentence.as_str()).collect();
        assert_eq!(texts, vec!["라면 하나", "라면 둘", "라면 셋", "라면 넷"]);
    }

    #[test]
    fn test_diverse_pool_equals_truncation() {
        let pool: Vec<ScoredCandidate> = ["가방", "나무", "다리", "라면", "마트"]
            .iter()
            .enumerate()
            .map(|(i, w)| candidate(&format!("{} 있어요", w), &[w], 100.0 - i as f64, i))
            .collect();
        let picked = diversify(pool.clone(), 3, 2);
        assert_eq!(picked, pool[..3].to_vec());
    }
}
