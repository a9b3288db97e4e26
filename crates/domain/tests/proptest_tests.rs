//! Property-based tests for domain value objects
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::{BackupHandle, BatchPlan, FaultFlag, FaultKind, FaultState, FaultTarget, FaultWindow};
use domain::value_objects::TruncatePercentage;
use proptest::prelude::*;
use std::path::Path;

// ============================================================================
// TruncatePercentage Property Tests
// ============================================================================

mod truncate_percentage_tests {
    use super::*;

    proptest! {
        #[test]
        fn valid_percentages_accepted(value in 1u8..=100) {
            prop_assert!(TruncatePercentage::new(value).is_ok());
        }

        #[test]
        fn out_of_range_rejected(value in prop_oneof![Just(0u8), 101u8..=255]) {
            prop_assert!(TruncatePercentage::new(value).is_err());
        }

        #[test]
        fn new_size_is_floor_and_never_grows(
            value in 1u8..=100,
            size in 0u64..=10_000_000_000
        ) {
            let p = TruncatePercentage::new(value).unwrap();
            let new_size = p.apply(size);
            prop_assert_eq!(new_size, size * u64::from(value) / 100);
            prop_assert!(new_size <= size);
        }
    }
}

// ============================================================================
// BatchPlan Property Tests
// ============================================================================

mod batch_plan_tests {
    use super::*;

    proptest! {
        #[test]
        fn batches_partition_rows(rows in 0u64..50_000, batch in 1u64..5_000) {
            let plan = BatchPlan::new(rows, batch).unwrap();
            let sizes: Vec<u64> = plan.batches().collect();

            prop_assert_eq!(sizes.len() as u64, rows.div_ceil(batch));
            prop_assert_eq!(sizes.iter().sum::<u64>(), rows);
            prop_assert!(sizes.iter().all(|&s| s >= 1 && s <= batch));
            if let Some(&last) = sizes.last() {
                let expected = if rows % batch == 0 { batch } else { rows % batch };
                prop_assert_eq!(last, expected);
                prop_assert_eq!(plan.last_batch_size(), expected);
            }
        }
    }
}

// ============================================================================
// FaultState Property Tests
// ============================================================================

mod fault_state_tests {
    use super::*;

    fn kind_strategy() -> impl Strategy<Value = FaultKind> {
        prop_oneof![
            Just(FaultKind::Service),
            Just(FaultKind::Reject),
            Just(FaultKind::Timeout),
        ]
    }

    proptest! {
        #[test]
        fn full_clear_always_reaches_up(kinds in proptest::collection::vec(kind_strategy(), 0..10)) {
            let mut state = FaultState::new();
            for kind in kinds {
                state.activate(FaultWindow::open(FaultFlag::raised_by(kind), FaultTarget::Port(3306)));
            }
            state.clear(&FaultFlag::ALL);
            prop_assert!(state.is_fully_up());
        }

        #[test]
        fn partial_restore_clears_own_flag(kind in kind_strategy()) {
            let mut state = FaultState::new();
            state.activate(FaultWindow::open(FaultFlag::raised_by(kind), FaultTarget::Process));
            state.clear(FaultFlag::restored_by(kind));
            prop_assert!(!state.is_active(FaultFlag::raised_by(kind)));
        }
    }
}

// ============================================================================
// BackupHandle Property Tests
// ============================================================================

mod backup_handle_tests {
    use super::*;

    proptest! {
        #[test]
        fn backup_path_round_trips(name in "[a-z][a-z0-9_-]{0,15}\\.[0-9]{6}") {
            let source = Path::new("/var/lib/mysql").join(&name);
            let handle = BackupHandle::for_source(Path::new("/opt/backups"), &source).unwrap();
            let recovered = BackupHandle::from_backup_path(handle.path()).unwrap();
            prop_assert_eq!(recovered.source_name(), name.as_str());
            prop_assert_eq!(recovered.restore_target(Path::new("/var/lib/mysql")), source);
        }
    }
}
