//! Club aggregates and trophy distribution.

use std::collections::BTreeSet;

use crate::models::{ClubMember, ClubStats, TrophyBucket, TrophyRange};

/// Bucket count used for trophy histograms.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Members with a unique tag; the first occurrence of a repeated tag wins.
fn unique_members(members: &[ClubMember]) -> Vec<&ClubMember> {
    let mut seen = BTreeSet::new();
    members
        .iter()
        .filter(|m| seen.insert(m.tag.as_str()))
        .collect()
}

/// Trophy range, rounded mean and role histogram of a member list.
pub fn club_stats(members: &[ClubMember]) -> ClubStats {
    let members = unique_members(members);
    let mut stats = ClubStats {
        member_count: members.len() as u32,
        ..Default::default()
    };

    let trophies: Vec<u32> = members.iter().map(|m| m.trophies).collect();
    if let (Some(&min), Some(&max)) = (trophies.iter().min(), trophies.iter().max()) {
        stats.trophy_range = Some(TrophyRange { min, max });
    }
    stats.mean_trophies = rounded_mean(&trophies);

    for member in members {
        *stats.role_histogram.entry(member.role).or_insert(0) += 1;
    }

    stats
}

/// Integer mean, rounding halves up: `[10, 11]` gives 11.
pub fn rounded_mean(values: &[u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as u64;
    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    Some(((sum * 2 + n) / (2 * n)) as u32)
}

/// Members ordered by trophies, highest first (ties by name).
pub fn members_by_trophies(members: &[ClubMember]) -> Vec<ClubMember> {
    let mut sorted: Vec<ClubMember> = unique_members(members).into_iter().cloned().collect();
    sorted.sort_by(|a, b| b.trophies.cmp(&a.trophies).then_with(|| a.name.cmp(&b.name)));
    sorted
}

/// Equal-width histogram of trophy counts.
///
/// Buckets are integer ranges `lower..=upper` starting at the smallest value;
/// at most `bins` buckets are produced and every value falls in exactly one.
pub fn trophy_distribution(values: &[u32], bins: usize) -> Vec<TrophyBucket> {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    let span = (max - min) as u64 + 1;
    let width = span.div_ceil(bins as u64).max(1);
    let count = span.div_ceil(width) as usize;

    let mut buckets: Vec<TrophyBucket> = (0..count)
        .map(|i| {
            let lower = min as u64 + i as u64 * width;
            TrophyBucket {
                lower: lower as u32,
                upper: (lower + width - 1).min(max as u64) as u32,
                count: 0,
            }
        })
        .collect();

    for &v in values {
        let index = ((v - min) as u64 / width) as usize;
        buckets[index].count += 1;
    }

    buckets
}
