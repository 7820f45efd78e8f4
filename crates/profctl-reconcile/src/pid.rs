//! PID-set arithmetic for process-level stop requests.

/// Outcome of folding a process-level stop's PID set into a host's current
/// start command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopPlan {
    /// `remaining` PIDs are still profiled; the command stays `start` with
    /// this narrowed PID set.
    NarrowToRemaining { remaining: Vec<i64> },
    /// The stop request covers every PID a known, non-empty current PID set
    /// tracks; degrade to a host-level stop.
    DegradeToHostStop,
    /// There is no live `start` command to narrow, or its PID set is
    /// unknown/empty — nothing to fold against. Stays a process-level stop
    /// carrying the requested PIDs, same as the original's default branch;
    /// it does not widen into a host-level stop.
    ProcessStopWithRequestedPids,
}

/// Compute what a process-level stop should do to a host's current PID
/// set.
///
/// `current_pids` is `None` when there is no live start command, or its
/// PID set is unknown (the original targeted the whole host rather than
/// specific PIDs).
pub fn plan_stop_for_host(current_pids: Option<&[i64]>, requested_stop_pids: &[i64]) -> StopPlan {
    let current = match current_pids {
        Some(pids) if !pids.is_empty() => pids,
        _ => return StopPlan::ProcessStopWithRequestedPids,
    };

    let mut remaining: Vec<i64> = current
        .iter()
        .copied()
        .filter(|pid| !requested_stop_pids.contains(pid))
        .collect();
    remaining.sort_unstable();
    remaining.dedup();

    if remaining.is_empty() {
        StopPlan::DegradeToHostStop
    } else {
        StopPlan::NarrowToRemaining { remaining }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_coverage_degrades_to_host_stop() {
        let plan = plan_stop_for_host(Some(&[100, 200, 300]), &[100, 200, 300]);
        assert_eq!(plan, StopPlan::DegradeToHostStop);
    }

    #[test]
    fn partial_coverage_narrows_to_remaining() {
        let plan = plan_stop_for_host(Some(&[100, 200, 300]), &[200]);
        assert_eq!(
            plan,
            StopPlan::NarrowToRemaining {
                remaining: vec![100, 300]
            }
        );
    }

    #[test]
    fn unknown_current_pids_stays_a_process_stop() {
        assert_eq!(
            plan_stop_for_host(None, &[1, 2]),
            StopPlan::ProcessStopWithRequestedPids
        );
    }

    #[test]
    fn empty_current_pids_stays_a_process_stop() {
        assert_eq!(
            plan_stop_for_host(Some(&[]), &[1, 2]),
            StopPlan::ProcessStopWithRequestedPids
        );
    }

    #[test]
    fn stop_pids_not_present_leave_current_untouched() {
        let plan = plan_stop_for_host(Some(&[100, 200]), &[999]);
        assert_eq!(
            plan,
            StopPlan::NarrowToRemaining {
                remaining: vec![100, 200]
            }
        );
    }

    proptest::proptest! {
        #[test]
        fn remaining_is_always_subset_of_current(
            current in proptest::collection::vec(0i64..100, 1..15),
            stop in proptest::collection::vec(0i64..100, 0..15),
        ) {
            if let StopPlan::NarrowToRemaining { remaining } = plan_stop_for_host(Some(&current), &stop) {
                for pid in &remaining {
                    proptest::prop_assert!(current.contains(pid));
                    proptest::prop_assert!(!stop.contains(pid));
                }
            }
        }

        #[test]
        fn covering_every_current_pid_always_degrades(
            current in proptest::collection::vec(0i64..100, 1..15),
        ) {
            let plan = plan_stop_for_host(Some(&current), &current);
            proptest::prop_assert_eq!(plan, StopPlan::DegradeToHostStop);
        }
    }
}
