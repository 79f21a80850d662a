use nucleo::{Config, Matcher, Utf32Str};

use crate::model::Listable;

pub fn normalize_needle(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Positions in `items` that fuzzily match `query`, best score first.
///
/// A blank query keeps every item in its original order.
pub fn rank<T: Listable + ?Sized>(query: &str, items: &[&T]) -> Vec<usize> {
    let needle = normalize_needle(query);
    if needle.is_empty() {
        return (0..items.len()).collect();
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let mut needle_buf = Vec::new();
    let needle_utf32 = Utf32Str::new(needle.as_str(), &mut needle_buf);
    let mut haystack_buf = Vec::new();

    let mut scored: Vec<(usize, u16)> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let haystack = Utf32Str::new(item.filter_value(), &mut haystack_buf);
            matcher
                .fuzzy_match(haystack, needle_utf32)
                .map(|score| (idx, score))
        })
        .collect();

    scored.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
    scored.into_iter().map(|(idx, _)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Listable for Named {
        fn title(&self) -> &str {
            self.0
        }

        fn filter_value(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn blank_query_keeps_order() {
        let items = [Named("b"), Named("a")];
        let refs: Vec<&Named> = items.iter().collect();
        assert_eq!(rank("  ", &refs), vec![0, 1]);
    }

    #[test]
    fn query_drops_non_matches() {
        let items = [Named("Linus Tech Tips"), Named("Veritasium"), Named("Tom Scott")];
        let refs: Vec<&Named> = items.iter().collect();
        let ranked = rank("TOM", &refs);
        assert_eq!(ranked, vec![2]);
    }

    #[test]
    fn subsequence_matches_are_kept() {
        let items = [Named("music videos"), Named("news"), Named("mv")];
        let refs: Vec<&Named> = items.iter().collect();
        let ranked = rank("mv", &refs);
        assert!(ranked.contains(&0));
        assert!(ranked.contains(&2));
        assert!(!ranked.contains(&1));
    }
}
