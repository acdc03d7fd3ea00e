//! Vote allocations: how an account's allowance is split across projects.

use serde::{Deserialize, Serialize};

use crate::{ProjectId, TypesError};

/// One line of an allocation: `count` votes for `project`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub project: ProjectId,
    pub count: i64,
}

/// Ordered mapping from chosen projects to positive vote counts.
///
/// Entry order is the order votes are cast in. Construction through
/// [`VoteAllocation::new`] rejects empty allocations and non-positive counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAllocation {
    entries: Vec<AllocationEntry>,
}

impl VoteAllocation {
    pub fn new(entries: Vec<AllocationEntry>) -> Result<Self, TypesError> {
        if entries.is_empty() {
            return Err(TypesError::EmptyAllocation);
        }
        if let Some(bad) = entries.iter().find(|e| e.count <= 0) {
            return Err(TypesError::NonPositiveCount {
                project: bad.project.to_string(),
                count: bad.count,
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all vote counts.
    pub fn total(&self) -> i64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AllocationEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a VoteAllocation {
    type Item = &'a AllocationEntry;
    type IntoIter = std::slice::Iter<'a, AllocationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(project: &str, count: i64) -> AllocationEntry {
        AllocationEntry {
            project: ProjectId::new(project),
            count,
        }
    }

    #[test]
    fn total_sums_counts() {
        let alloc = VoteAllocation::new(vec![entry("a", 3), entry("b", 4)]).unwrap();
        assert_eq!(alloc.total(), 7);
        assert_eq!(alloc.len(), 2);
    }

    #[test]
    fn rejects_zero_count() {
        let err = VoteAllocation::new(vec![entry("a", 3), entry("b", 0)]).unwrap_err();
        assert_eq!(
            err,
            TypesError::NonPositiveCount {
                project: "b".into(),
                count: 0
            }
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(
            VoteAllocation::new(Vec::new()).unwrap_err(),
            TypesError::EmptyAllocation
        );
    }

    #[test]
    fn iteration_keeps_order() {
        let alloc = VoteAllocation::new(vec![entry("z", 1), entry("a", 1)]).unwrap();
        let order: Vec<&str> = alloc.iter().map(|e| e.project.as_str()).collect();
        assert_eq!(order, vec!["z", "a"]);
    }
}
