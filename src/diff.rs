//! Ordered set differences used when rewriting link sets.

use std::collections::HashSet;
use std::hash::Hash;

/// Elements of `a` that are not in `b`, in `a`'s order.
pub fn difference<T>(a: &[T], b: &[T]) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let exclude: HashSet<&T> = b.iter().collect();
    a.iter()
        .filter(|item| !exclude.contains(item))
        .cloned()
        .collect()
}

pub fn string_difference(a: &[String], b: &[String]) -> Vec<String> {
    difference(a, b)
}

pub fn int_difference(a: &[i64], b: &[i64]) -> Vec<i64> {
    difference(a, b)
}

/// Inserts and removals needed to move a link set from `current` to `target`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SetChanges<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

impl<T> SetChanges<T>
where
    T: Clone + Eq + Hash,
{
    pub fn between(current: &[T], target: &[T]) -> Self {
        Self {
            added: difference(target, current),
            removed: difference(current, target),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Flips membership of every id in `toggled` against `current`, keeping the result sorted.
pub fn toggle_all(current: &[i64], toggled: &[i64]) -> Vec<i64> {
    let mut result: Vec<i64> = current.to_vec();
    for id in toggled {
        if let Some(position) = result.iter().position(|existing| existing == id) {
            result.remove(position);
        } else {
            result.push(*id);
        }
    }
    result.sort_unstable();
    result.dedup();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_difference_keeps_order_of_left_side() {
        let a = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        let b = vec!["a".to_string()];
        assert_eq!(string_difference(&a, &b), vec!["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn int_difference_handles_empty_sides() {
        assert_eq!(int_difference(&[], &[1, 2]), Vec::<i64>::new());
        assert_eq!(int_difference(&[3, 1], &[]), vec![3, 1]);
        assert_eq!(int_difference(&[5, 4, 3], &[4]), vec![5, 3]);
    }

    #[test]
    fn set_changes_are_empty_when_sets_match() {
        let changes = SetChanges::between(&[1, 2, 3], &[3, 2, 1]);
        assert!(changes.is_empty());

        let changes = SetChanges::between(&[1, 2], &[2, 4]);
        assert_eq!(changes.added, vec![4]);
        assert_eq!(changes.removed, vec![1]);
    }

    #[test]
    fn toggle_all_is_symmetric_difference() {
        assert_eq!(toggle_all(&[1, 2, 3], &[2, 5]), vec![1, 3, 5]);
        assert_eq!(toggle_all(&[], &[4, 1]), vec![1, 4]);
        assert_eq!(toggle_all(&[7], &[]), vec![7]);
    }
}
