//! Command handler modules for the `profctl` operator CLI.
//!
//! Shared parsing helpers used by more than one subcommand live here;
//! command-specific logic lives in the submodules.

pub mod complete;
pub mod db;
pub mod heartbeat;
pub mod hosts;
pub mod submit;

use std::collections::BTreeMap;

use anyhow::{Context, Result};

/// Parse a repeated `--target host[:pid,pid,...]` flag into the
/// `targets` map `NewProfilingRequest` expects. A bare `host` (no `:`)
/// means "the host as a whole" (`None` PID set).
pub fn parse_targets(raw: &[String]) -> Result<BTreeMap<String, Option<Vec<i64>>>> {
    let mut targets = BTreeMap::new();
    for entry in raw {
        match entry.split_once(':') {
            Some((host, pids)) => {
                let host = host.trim().to_string();
                if host.is_empty() {
                    anyhow::bail!("--target '{entry}' has an empty hostname");
                }
                let pids: Vec<i64> = pids
                    .split(',')
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<i64>().with_context(|| format!("invalid pid '{s}' in --target '{entry}'")))
                    .collect::<Result<_>>()?;
                targets.insert(host, if pids.is_empty() { None } else { Some(pids) });
            }
            None => {
                let host = entry.trim().to_string();
                if host.is_empty() {
                    anyhow::bail!("--target may not be empty");
                }
                targets.insert(host, None);
            }
        }
    }
    Ok(targets)
}

/// Parse a `--additional-args` flag's inline JSON object into the map
/// `NewProfilingRequest::additional_args` expects. Absent flag yields an
/// empty map rather than an error.
pub fn parse_additional_args(raw: Option<&str>) -> Result<serde_json::Map<String, serde_json::Value>> {
    let Some(raw) = raw else {
        return Ok(Default::default());
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--additional-args must be a valid JSON object")?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("--additional-args must be a JSON object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hostname_means_whole_host() {
        let targets = parse_targets(&["h1".to_string()]).unwrap();
        assert_eq!(targets.get("h1"), Some(&None));
    }

    #[test]
    fn host_with_pid_list_parses_pids() {
        let targets = parse_targets(&["h1:100,200".to_string()]).unwrap();
        assert_eq!(targets.get("h1"), Some(&Some(vec![100, 200])));
    }

    #[test]
    fn empty_pid_list_after_colon_means_whole_host() {
        let targets = parse_targets(&["h1:".to_string()]).unwrap();
        assert_eq!(targets.get("h1"), Some(&None));
    }

    #[test]
    fn invalid_pid_is_rejected() {
        assert!(parse_targets(&["h1:abc".to_string()]).is_err());
    }

    #[test]
    fn missing_additional_args_is_empty_map() {
        assert!(parse_additional_args(None).unwrap().is_empty());
    }

    #[test]
    fn non_object_additional_args_is_rejected() {
        assert!(parse_additional_args(Some("[1,2,3]")).is_err());
    }
}
