//! Randomized, exact split of a vote allowance across a subset of projects.

use rand::seq::index;
use rand::Rng;
use retrovote_types::{AllocationEntry, Project, VoteAllocation};

/// Lower bound of the random number of projects an allowance is spread over.
pub const MIN_PROJECTS: usize = 5;
/// Upper bound of the random number of projects an allowance is spread over.
pub const MAX_PROJECTS: usize = 14;

/// Split `allowance` votes across a random subset of `projects`.
///
/// Returns `None` when there is nothing to split. Otherwise the result has
/// between 1 and `min(MAX_PROJECTS, projects.len(), allowance)` entries, every
/// count is at least 1, and the counts sum to exactly `allowance`.
///
/// The subset size is drawn from `[MIN_PROJECTS, MAX_PROJECTS]` and clamped;
/// projects are chosen uniformly without replacement, and entry order is the
/// order votes will be cast in. Each entry but the last draws from
/// `[1, remaining / entries_left]`; the last takes what is left.
pub fn distribute<R>(allowance: i64, projects: &[Project], rng: &mut R) -> Option<VoteAllocation>
where
    R: Rng + ?Sized,
{
    if allowance <= 0 || projects.is_empty() {
        return None;
    }

    let drawn = rng.gen_range(MIN_PROJECTS..=MAX_PROJECTS);
    // Each entry needs at least one vote, so never pick more entries than votes.
    let per_vote_cap = usize::try_from(allowance).unwrap_or(usize::MAX);
    let k = drawn.min(projects.len()).min(per_vote_cap).max(1);

    let chosen = index::sample(rng, projects.len(), k);
    let mut entries = Vec::with_capacity(k);
    let mut remaining = allowance;

    for (i, idx) in chosen.iter().enumerate() {
        let votes = if i == k - 1 {
            remaining
        } else {
            let bound = remaining / (k - i) as i64;
            if bound > 1 {
                rng.gen_range(1..=bound)
            } else {
                1
            }
        }
        .min(remaining);
        remaining -= votes;
        entries.push(AllocationEntry {
            project: projects[idx].id.clone(),
            count: votes,
        });
    }

    // Rounding guard: hand out anything left one vote at a time.
    let len = entries.len();
    let mut i = 0;
    while remaining > 0 {
        entries[i % len].count += 1;
        remaining -= 1;
        i += 1;
    }

    VoteAllocation::new(entries).ok()
}
