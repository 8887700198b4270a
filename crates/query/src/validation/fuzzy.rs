//! Fuzzy string matching for "did you mean" hints on field names.

/// Closest candidate by case-insensitive edit distance. A match is only
/// offered when the distance is at most half the length of the longer of
/// the two names; ties go to the earlier candidate.
pub fn fuzzy_match<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let input = input.to_lowercase();
    let (name, dist) = candidates
        .iter()
        .map(|&c| (c, levenshtein(&input, &c.to_lowercase())))
        .min_by_key(|&(_, dist)| dist)?;

    let longer = input.chars().count().max(name.chars().count());
    (dist <= longer / 2).then_some(name)
}

/// Levenshtein edit distance between two strings.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = b.len();

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_FIELDS: &[&str] = &["order_id", "customer_id", "placed_at", "total_amount"];

    #[test]
    fn levenshtein_basic() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
    }

    #[test]
    fn fuzzy_match_finds_close() {
        assert_eq!(fuzzy_match("custmer_id", ORDER_FIELDS), Some("customer_id"));
        assert_eq!(fuzzy_match("ORDER_ID", ORDER_FIELDS), Some("order_id"));
    }

    #[test]
    fn threshold_is_half_the_longer_name() {
        // 6 edits against a 12-char name: right at the limit.
        assert_eq!(fuzzy_match("amount", ORDER_FIELDS), Some("total_amount"));
        // 7 edits: one past it.
        assert_eq!(fuzzy_match("total", ORDER_FIELDS), None);
        assert_eq!(fuzzy_match("custid", ORDER_FIELDS), Some("customer_id"));
        assert_eq!(fuzzy_match("placed", ORDER_FIELDS), Some("placed_at"));
    }

    #[test]
    fn ties_prefer_the_first_candidate() {
        assert_eq!(fuzzy_match("ab", &["ax", "xb"]), Some("ax"));
    }

    #[test]
    fn fuzzy_match_rejects_distant() {
        assert_eq!(fuzzy_match("zzzzzzzzzzzzz", ORDER_FIELDS), None);
        assert_eq!(fuzzy_match("anything", &[]), None);
    }
}
