//! Match-coordination tunables.
//!
//! Everything timing-related lives here so tests can shrink intervals and
//! deployments can tune retention without code changes.

use std::time::Duration;

use crate::domain::session::TimeControl;

#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// One clock unit. Production runs at one second; tests shrink this.
    pub tick_interval: Duration,
    /// How long a finished session stays queryable before it is purged.
    pub retention: Duration,
    /// The clock is a property of the match, not of a connection: by
    /// default it keeps running while a side is disconnected. Setting
    /// this false holds the clock whenever the side to move is offline.
    pub clock_runs_while_disconnected: bool,
    /// Applied when an accept does not name a time control.
    pub default_time_control: TimeControl,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            retention: Duration::from_secs(300),
            clock_runs_while_disconnected: true,
            default_time_control: TimeControl::default(),
        }
    }
}

impl MatchConfig {
    /// Read overrides from the environment, falling back to defaults.
    ///
    /// - `MATCH_TICK_MILLIS`
    /// - `MATCH_RETENTION_SECS`
    /// - `MATCH_CLOCK_RUNS_WHILE_DISCONNECTED`
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var("MATCH_TICK_MILLIS").ok(),
            std::env::var("MATCH_RETENTION_SECS").ok(),
            std::env::var("MATCH_CLOCK_RUNS_WHILE_DISCONNECTED").ok(),
        )
    }

    fn from_values(
        tick_millis: Option<String>,
        retention_secs: Option<String>,
        clock_runs: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            tick_interval: tick_millis
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            retention: retention_secs
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.retention),
            clock_runs_while_disconnected: clock_runs
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(defaults.clock_runs_while_disconnected),
            default_time_control: defaults.default_time_control,
        }
    }
}
