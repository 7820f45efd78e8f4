//! Pure config merge for folding overlapping requests into one command.
//!
//! Folds an incoming request's configuration into whatever command config
//! already occupies a (host, service) slot. Never touches persistence;
//! `profctl-db::upsert_command_for_host` supplies `existing` and writes the
//! result back inside its own transaction.

use profctl_schemas::{CommandStatus, ProfilingConfig};

/// Merge `incoming` into `existing`, producing the config a superseding
/// command should carry.
///
/// `existing` is `None` (fresh command) or terminal (`completed`/`failed`,
/// i.e. nothing to merge against) returns `incoming` unchanged.
pub fn merge(
    existing: Option<(&ProfilingConfig, CommandStatus)>,
    incoming: &ProfilingConfig,
) -> ProfilingConfig {
    let existing = match existing {
        Some((cfg, status)) if status.is_live() => cfg,
        _ => return incoming.clone(),
    };

    let mut pids = existing.pids.clone();
    pids.extend_from_slice(&incoming.pids);
    pids.sort_unstable();
    pids.dedup();

    let mut extras = existing.extras.clone();
    for (k, v) in &incoming.extras {
        extras.insert(k.clone(), v.clone());
    }

    ProfilingConfig {
        duration_seconds: existing.duration_seconds.max(incoming.duration_seconds),
        frequency_hz: existing.frequency_hz.max(incoming.frequency_hz),
        mode: incoming.mode,
        continuous: existing.continuous || incoming.continuous,
        pids,
        stop_level: incoming.stop_level.or(existing.stop_level),
        extras,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profctl_schemas::ProfilingMode;

    fn cfg(duration: i64, freq: i64, pids: &[i64]) -> ProfilingConfig {
        ProfilingConfig {
            duration_seconds: duration,
            frequency_hz: freq,
            mode: ProfilingMode::Cpu,
            continuous: false,
            pids: pids.to_vec(),
            stop_level: None,
            extras: Default::default(),
        }
    }

    #[test]
    fn no_existing_returns_incoming_verbatim() {
        let incoming = cfg(60, 11, &[100, 200]);
        let merged = merge(None, &incoming);
        assert_eq!(merged, incoming);
    }

    #[test]
    fn terminal_existing_is_ignored() {
        let existing = cfg(999, 999, &[1, 2, 3]);
        let incoming = cfg(60, 11, &[100]);
        let merged = merge(Some((&existing, CommandStatus::Completed)), &incoming);
        assert_eq!(merged, incoming);
    }

    #[test]
    fn duration_and_frequency_take_the_max() {
        let existing = cfg(60, 11, &[100, 200]);
        let incoming = cfg(120, 11, &[300]);
        let merged = merge(Some((&existing, CommandStatus::Pending)), &incoming);
        assert_eq!(merged.duration_seconds, 120);
        assert_eq!(merged.frequency_hz, 11);
        assert_eq!(merged.pids, vec![100, 200, 300]);
    }

    #[test]
    fn continuous_is_logical_or() {
        let mut existing = cfg(60, 11, &[]);
        existing.continuous = true;
        let incoming = cfg(60, 11, &[]);
        let merged = merge(Some((&existing, CommandStatus::Sent)), &incoming);
        assert!(merged.continuous);
    }

    #[test]
    fn additional_args_incoming_wins_on_collision() {
        let mut existing = cfg(60, 11, &[]);
        existing
            .extras
            .insert("note".into(), serde_json::json!("old"));
        existing
            .extras
            .insert("keep".into(), serde_json::json!("me"));

        let mut incoming = cfg(60, 11, &[]);
        incoming
            .extras
            .insert("note".into(), serde_json::json!("new"));

        let merged = merge(Some((&existing, CommandStatus::Pending)), &incoming);
        assert_eq!(merged.extras.get("note"), Some(&serde_json::json!("new")));
        assert_eq!(merged.extras.get("keep"), Some(&serde_json::json!("me")));
    }

    proptest::proptest! {
        #[test]
        fn pid_union_is_deduplicated_and_sorted(
            a in proptest::collection::vec(0i64..1000, 0..20),
            b in proptest::collection::vec(0i64..1000, 0..20),
        ) {
            let existing = cfg(1, 1, &a);
            let incoming = cfg(1, 1, &b);
            let merged = merge(Some((&existing, CommandStatus::Pending)), &incoming);

            let mut expected: Vec<i64> = a.into_iter().chain(b).collect();
            expected.sort_unstable();
            expected.dedup();
            proptest::prop_assert_eq!(merged.pids, expected);
        }

        #[test]
        fn duration_frequency_are_monotone(
            d1 in 1i64..10_000, f1 in 1i64..10_000,
            d2 in 1i64..10_000, f2 in 1i64..10_000,
        ) {
            let existing = cfg(d1, f1, &[]);
            let incoming = cfg(d2, f2, &[]);
            let merged = merge(Some((&existing, CommandStatus::Pending)), &incoming);
            proptest::prop_assert_eq!(merged.duration_seconds, d1.max(d2));
            proptest::prop_assert_eq!(merged.frequency_hz, f1.max(f2));
        }
    }
}
