//! Capacity gate arithmetic for bulk profiling requests.
//!
//! Pure predicate over already-queried counts; `profctl-core` is
//! responsible for fetching `active_hosts` and
//! `currently_profiling_outside_selection` from `profctl-db` before
//! calling this.
//!
//! Reproduces `validate_profiling_capacity` from the original Python
//! implementation's `dynamic_profiling_utils.py` exactly:
//! `max_profiling_hosts = floor(active_hosts * percent / 100)`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityCheck {
    pub max_profiling_hosts: u32,
    pub currently_profiling_outside_selection: u32,
    pub requested_size: u32,
}

impl CapacityCheck {
    pub fn allowed(&self) -> bool {
        self.currently_profiling_outside_selection + self.requested_size
            <= self.max_profiling_hosts
    }
}

/// Evaluate the fleet-wide capacity gate for a bulk submission.
///
/// `active_hosts` is the count of currently-live hosts fleet-wide.
/// `currently_profiling_outside_selection` is the count of hosts already
/// profiling that are *not* targeted by this bulk submission.
/// `requested_size` is the number of additional hosts this submission
/// would start profiling.
pub fn bulk_within_capacity(
    active_hosts: u32,
    percent: u32,
    currently_profiling_outside_selection: u32,
    requested_size: u32,
) -> CapacityCheck {
    let max_profiling_hosts = (active_hosts * percent) / 100;
    CapacityCheck {
        max_profiling_hosts,
        currently_profiling_outside_selection,
        requested_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_cap_is_allowed() {
        let check = bulk_within_capacity(100, 20, 5, 10);
        assert_eq!(check.max_profiling_hosts, 20);
        assert!(check.allowed());
    }

    #[test]
    fn exceeding_cap_is_rejected() {
        let check = bulk_within_capacity(100, 20, 15, 10);
        assert_eq!(check.max_profiling_hosts, 20);
        assert!(!check.allowed());
    }

    #[test]
    fn exactly_at_cap_is_allowed() {
        let check = bulk_within_capacity(100, 20, 10, 10);
        assert!(check.allowed());
    }

    #[test]
    fn floor_division_matches_original_formula() {
        // 33 active hosts at 20% => floor(6.6) = 6.
        let check = bulk_within_capacity(33, 20, 0, 6);
        assert_eq!(check.max_profiling_hosts, 6);
        assert!(check.allowed());

        let over = bulk_within_capacity(33, 20, 0, 7);
        assert!(!over.allowed());
    }

    proptest::proptest! {
        #[test]
        fn never_allows_more_than_the_floor(
            active in 0u32..10_000,
            percent in 0u32..100,
            outside in 0u32..10_000,
            requested in 0u32..10_000,
        ) {
            let check = bulk_within_capacity(active, percent, outside, requested);
            if check.allowed() {
                proptest::prop_assert!(outside + requested <= (active * percent) / 100);
            }
        }
    }
}
