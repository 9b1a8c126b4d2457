//! Version ordering.
//!
//! Module versions are plain dot-separated integers. Comparison walks the
//! segments pairwise; a missing trailing segment counts as `0`, so `1.2`
//! and `1.2.0` are the same version. Segments that are not integers also
//! count as `0`.

use std::cmp::Ordering;

fn segments(v: &str) -> Vec<u64> {
    v.trim()
        .trim_start_matches('v')
        .split('.')
        .map(|s| s.trim().parse::<u64>().unwrap_or(0))
        .collect()
}

/// Compare two versions segment by segment.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = segments(a);
    let b_parts = segments(b);

    for i in 0..std::cmp::max(a_parts.len(), b_parts.len()) {
        let av = a_parts.get(i).unwrap_or(&0);
        let bv = b_parts.get(i).unwrap_or(&0);
        match av.cmp(bv) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

/// Returns `true` if `a` is the same as or newer than `b`.
pub fn version_ge(a: &str, b: &str) -> bool {
    compare_versions(a, b) != Ordering::Less
}
