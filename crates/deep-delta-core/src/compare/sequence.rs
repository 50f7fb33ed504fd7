//! Ordered and unordered sequence equality.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

use crate::types::options::ComparisonOptions;

/// Element-wise equality of two indexable sequences.
///
/// Lengths are compared first; the element comparator runs only on
/// equal-length inputs.
pub fn ordered_equal<T>(left: &[T], right: &[T], mut eq: impl FnMut(&T, &T) -> bool) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter().zip(right.iter()).all(|(a, b)| eq(a, b))
}

/// Step-lock equality of two enumerations of unknown length.
///
/// Both iterators are advanced together; unequal arities compare false.
pub fn iter_equal<T, L, R>(left: L, right: R, mut eq: impl FnMut(&T, &T) -> bool) -> bool
where
    L: IntoIterator<Item = T>,
    R: IntoIterator<Item = T>,
{
    let mut left = left.into_iter();
    let mut right = right.into_iter();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if eq(&a, &b) => continue,
            _ => return false,
        }
    }
}

/// Unordered equality for hash-friendly element types.
///
/// Builds a multiset from the left side and decrements it with the
/// right side. Linear in the element count.
pub fn unordered_equal_hashed<T: Eq + Hash>(left: &[T], right: &[T]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut counts: HashMap<&T, isize, RandomState> = HashMap::default();
    for item in left {
        *counts.entry(item).or_insert(0) += 1;
    }
    for item in right {
        match counts.get_mut(item) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }
    true
}

/// Unordered equality for strings under the configured comparer.
///
/// Ignore-case modes fold each key before hashing so the multiset fast
/// path stays available.
pub fn unordered_strings_equal<S: AsRef<str>>(
    left: &[S],
    right: &[S],
    options: &ComparisonOptions,
) -> bool {
    if !options.string_comparison.ignores_case() {
        let l: Vec<&str> = left.iter().map(AsRef::as_ref).collect();
        let r: Vec<&str> = right.iter().map(AsRef::as_ref).collect();
        return unordered_equal_hashed(&l, &r);
    }
    let fold = |s: &S| -> String { s.as_ref().chars().flat_map(char::to_lowercase).collect() };
    let l: Vec<String> = left.iter().map(fold).collect();
    let r: Vec<String> = right.iter().map(fold).collect();
    unordered_equal_hashed(&l, &r)
}

/// Unordered equality with an arbitrary comparator.
///
/// Greedy quadratic matching with a matched bitmap; the fallback when
/// elements cannot be hashed under the configured semantics.
pub fn unordered_equal_by<T>(
    left: &[T],
    right: &[T],
    mut eq: impl FnMut(&T, &T) -> bool,
) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut matched = vec![false; right.len()];
    for item in left {
        let mut found = false;
        for (slot, candidate) in right.iter().enumerate() {
            if !matched[slot] && eq(item, candidate) {
                matched[slot] = true;
                found = true;
                break;
            }
        }
        if !found {
            return false;
        }
    }
    true
}
