//! Sibling ordering: comparators and the stable insertion sort.

use super::Entry;
use std::cmp::Ordering;

/// Case-insensitive lexicographic comparison.
fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Order entries by name alone.
pub fn by_name(a: &Entry, b: &Entry) -> Ordering {
    cmp_ignore_case(&a.name, &b.name)
}

/// Order entries by type first, then by name.
pub fn by_type_and_name(a: &Entry, b: &Entry) -> Ordering {
    cmp_ignore_case(&a.type_name, &b.type_name).then_with(|| cmp_ignore_case(&a.name, &b.name))
}

/// Stable in-place insertion sort.
///
/// Directory fan-out in the object namespace is small (tens, occasionally
/// low hundreds of entries), so an auditable stable sort matters more here
/// than asymptotics. Entries comparing equal keep their discovery order:
/// elements shift only past strictly greater predecessors.
pub fn sort_children_by<F>(entries: &mut [Entry], cmp: F)
where
    F: Fn(&Entry, &Entry) -> Ordering,
{
    for i in 1..entries.len() {
        let mut j = i;
        while j > 0 && cmp(&entries[j - 1], &entries[j]) == Ordering::Greater {
            entries.swap(j - 1, j);
            j -= 1;
        }
    }
}
