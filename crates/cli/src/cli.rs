use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use qdmsync_domain::{Result, TimeWindow};

/// Directory used when neither `--path` nor `QDM_PATH` is given.
const DEFAULT_DIR_NAME: &str = ".qdm-sync";

#[derive(Debug, Parser)]
#[command(
    name = "qdm-sync",
    version,
    about = "Sync QDM e-commerce data (orders, customers, customer groups) into a local document store"
)]
pub struct Cli {
    /// Working directory holding `config.toml` or `config.json` (default: ~/.qdm-sync).
    #[arg(long, global = true, env = "QDM_PATH")]
    pub path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn work_dir(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_work_dir)
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initiate a data synchronization.
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
}

#[derive(Debug, Subcommand)]
pub enum SyncTarget {
    /// Orders created inside a time window.
    Orders(WindowArgs),
    /// Customers registered inside a time window.
    Customers(WindowArgs),
    /// Every customer group.
    CustomerGroups,
}

#[derive(Debug, Clone, Args)]
pub struct WindowArgs {
    /// Window start, RFC 3339 (e.g. 2024-01-01T00:00:00+08:00).
    #[arg(long = "start-time", visible_aliases = ["start", "since"], value_parser = parse_timestamp)]
    pub start: DateTime<Local>,

    /// Window end, RFC 3339 (default: now).
    #[arg(long = "end-time", visible_alias = "end", value_parser = parse_timestamp)]
    pub end: Option<DateTime<Local>>,
}

impl WindowArgs {
    /// Resolve the window, ending at `now` when no end was given.
    pub fn window(&self, now: DateTime<Local>) -> Result<TimeWindow> {
        TimeWindow::new(self.start, self.end.unwrap_or(now))
    }
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Local>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Local))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

fn default_work_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(DEFAULT_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use clap::CommandFactory;
    use qdmsync_domain::QdmSyncError;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_orders_with_since_alias() {
        let cli = Cli::try_parse_from([
            "qdm-sync",
            "--path",
            "/tmp/qdm",
            "sync",
            "orders",
            "--since",
            "2024-01-01T00:00:00Z",
            "--end",
            "2024-02-01T00:00:00Z",
        ])
        .unwrap();

        assert_eq!(cli.work_dir(), PathBuf::from("/tmp/qdm"));
        let Commands::Sync { target: SyncTarget::Orders(args) } = cli.command else {
            panic!("expected sync orders");
        };
        let window = args.window(Local::now()).unwrap();
        assert_eq!(window.start().timestamp(), 1_704_067_200);
        assert_eq!(window.end().timestamp(), 1_706_745_600);
    }

    #[test]
    fn end_defaults_to_now() {
        let cli = Cli::try_parse_from([
            "qdm-sync",
            "sync",
            "customers",
            "--start",
            "2024-01-01T00:00:00+08:00",
            "--path",
            "/tmp/qdm",
        ])
        .unwrap();

        let Commands::Sync { target: SyncTarget::Customers(args) } = cli.command else {
            panic!("expected sync customers");
        };
        assert_eq!(args.end, None);

        let now = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(args.window(now).unwrap().end(), now);
    }

    #[test]
    fn start_is_required_for_windowed_syncs() {
        assert!(Cli::try_parse_from(["qdm-sync", "sync", "orders"]).is_err());
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let result = Cli::try_parse_from(["qdm-sync", "sync", "orders", "--start", "yesterday"]);
        assert!(result.is_err());
    }

    #[test]
    fn inverted_window_is_invalid_input() {
        let args = WindowArgs {
            start: Local.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end: Some(Local.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
        };
        assert!(matches!(args.window(Local::now()), Err(QdmSyncError::InvalidInput(_))));
    }

    #[test]
    fn customer_groups_take_no_window() {
        let cli = Cli::try_parse_from(["qdm-sync", "sync", "customer-groups"]).unwrap();
        assert!(matches!(cli.command, Commands::Sync { target: SyncTarget::CustomerGroups }));
    }
}
