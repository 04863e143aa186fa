//! Service configuration, from command-line flags or `DISPATCH_*` environment variables.

use crate::backend::types::BackendKind;

use anyhow::{bail, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "compute-dispatch",
    version,
    about = "Dispatch compute tasks to execution backends and reconcile their results.",
    long_about = None
)]
pub struct Config {
    /// Address the HTTP API listens on.
    #[arg(long, env = "DISPATCH_BIND", default_value = "127.0.0.1:7777")]
    pub bind: SocketAddr,

    /// Maximum number of computations running at once.
    #[arg(long, env = "DISPATCH_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Period of the background reconciliation loop.
    #[arg(long, env = "DISPATCH_RECONCILE_INTERVAL_MS", default_value_t = 1000)]
    pub reconcile_interval_ms: u64,

    /// Reconcile finished tasks before answering each poll.
    #[arg(
        long,
        env = "DISPATCH_RECONCILE_ON_POLL",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub reconcile_on_poll: bool,

    /// Evict tasks that have not finished after this many seconds.
    #[arg(long, env = "DISPATCH_STALE_AFTER_SECS")]
    pub stale_after_secs: Option<u64>,

    /// Backend used when a submit request does not name one.
    #[arg(long, env = "DISPATCH_DEFAULT_BACKEND", default_value = "function")]
    pub default_backend: BackendKind,

    /// Compute program used when a submit request does not name one.
    #[arg(long, env = "DISPATCH_DEFAULT_PROGRAM", default_value = "mock")]
    pub default_program: String,

    /// Root URL of a remote workflow engine. Without it an in-process engine is used.
    #[arg(long, env = "DISPATCH_LAUNCHPAD_URL", value_name = "URL")]
    pub launchpad_url: Option<String>,

    /// Also expose the in-process workflow engine under `/workflows`.
    #[arg(long, env = "DISPATCH_SERVE_LAUNCHPAD")]
    pub serve_launchpad: bool,

    /// JSON file of reference data, shaped `{namespace: {key: data}}`, loaded at startup.
    #[arg(long, env = "DISPATCH_REFERENCES", value_name = "PATH")]
    pub references: Option<PathBuf>,

    /// Username required in the `username` header. Auth is open when unset.
    #[arg(long, env = "DISPATCH_API_USER")]
    pub api_user: Option<String>,

    #[arg(long, env = "DISPATCH_API_PASSWORD", hide_env_values = true)]
    pub api_password: Option<String>,

    #[arg(long, env = "DISPATCH_LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("--workers must be at least 1");
        }
        if self.reconcile_interval_ms == 0 {
            bail!("--reconcile-interval-ms must be greater than 0");
        }
        if self.stale_after_secs == Some(0) {
            bail!("--stale-after-secs must be greater than 0");
        }
        if self.api_user.is_some() != self.api_password.is_some() {
            bail!("--api-user and --api-password must be set together");
        }
        if self.launchpad_url.is_some() && self.serve_launchpad {
            bail!("--serve-launchpad needs the in-process engine; drop --launchpad-url");
        }
        Ok(())
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms)
    }

    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after_secs.map(Duration::from_secs)
    }

    /// `(username, password)` when authentication is enabled.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.api_user, &self.api_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["compute-dispatch"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = parse(&[]);

        assert_eq!(config.workers, 4);
        assert_eq!(config.default_backend, BackendKind::Function);
        assert!(config.reconcile_on_poll);
        assert!(config.credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_aliases_parse() {
        let config = parse(&["--default-backend", "fireworks"]);
        assert_eq!(config.default_backend, BackendKind::Workflow);

        assert!(Config::try_parse_from(["compute-dispatch", "--default-backend", "slurm"]).is_err());
    }

    #[test]
    fn test_half_configured_credentials_rejected() {
        let config = parse(&["--api-user", "alice"]);
        assert!(config.validate().is_err());

        let config = parse(&["--api-user", "alice", "--api-password", "s3cret"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.credentials(), Some(("alice", "s3cret")));
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(parse(&["--workers", "0"]).validate().is_err());
        assert!(parse(&["--reconcile-interval-ms", "0"]).validate().is_err());
        assert!(parse(&["--stale-after-secs", "0"]).validate().is_err());
    }

    #[test]
    fn test_reconcile_on_poll_can_be_disabled() {
        let config = parse(&["--reconcile-on-poll", "false", "--stale-after-secs", "600"]);

        assert!(!config.reconcile_on_poll);
        assert_eq!(config.stale_after(), Some(Duration::from_secs(600)));
    }
}
