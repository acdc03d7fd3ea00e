//! Property-based tests for the vote distribution engine.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use retrovote_engine::distribution::{distribute, MAX_PROJECTS};
use retrovote_types::Project;
use std::collections::HashSet;

fn projects(n: usize) -> Vec<Project> {
    (0..n)
        .map(|i| Project::new(format!("proj-{i}"), format!("Project {i}")))
        .collect()
}

proptest! {
    #[test]
    fn allocation_is_exact_and_positive(
        allowance in 1i64..100_000,
        n in 1usize..60,
        seed in any::<u64>(),
    ) {
        let list = projects(n);
        let mut rng = StdRng::seed_from_u64(seed);
        let alloc = distribute(allowance, &list, &mut rng).expect("non-empty input");

        prop_assert_eq!(alloc.total(), allowance);
        prop_assert!(alloc.iter().all(|e| e.count >= 1));
        prop_assert!(!alloc.is_empty());
        prop_assert!(alloc.len() <= MAX_PROJECTS.min(n));
    }

    #[test]
    fn chosen_projects_are_distinct_members(
        allowance in 1i64..5_000,
        n in 1usize..40,
        seed in any::<u64>(),
    ) {
        let list = projects(n);
        let known: HashSet<_> = list.iter().map(|p| p.id.clone()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let alloc = distribute(allowance, &list, &mut rng).unwrap();

        let chosen: HashSet<_> = alloc.iter().map(|e| e.project.clone()).collect();
        prop_assert_eq!(chosen.len(), alloc.len());
        prop_assert!(chosen.is_subset(&known));
    }

    #[test]
    fn empty_inputs_yield_nothing(allowance in -1_000i64..=0, n in 0usize..10, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert!(distribute(allowance, &projects(n), &mut rng).is_none());
        prop_assert!(distribute(allowance.abs() + 1, &[], &mut rng).is_none());
    }
}
