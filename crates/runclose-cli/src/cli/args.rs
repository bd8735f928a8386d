use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "runclose",
    version,
    about = "Reconcile test-run results against the test-management service and complete finished runs"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Append every remote result to the result log
    Fetch(ApiArgs),
    /// Pick runs whose cases all ended on a pass (offline)
    Select,
    /// Cross-check selected runs against the remote case lists
    Validate(ApiArgs),
    /// Complete the confirmed runs
    Complete(ApiArgs),
    /// Complete every run the service reports as in progress
    CompleteAll(ApiArgs),
    /// Fetch, select, validate and complete in one go
    Run(RunArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// Directory holding the result log and hand-off files
    #[arg(long, global = true, default_value = ".", env = "RUNCLOSE_WORKDIR")]
    pub workdir: PathBuf,

    /// Settings file [default: <workdir>/runclose.yaml, if present]
    #[arg(long, global = true, env = "RUNCLOSE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Connection and pacing options for commands that talk to the service.
#[derive(Args, Clone, Debug, Default)]
pub struct ApiArgs {
    /// API token
    #[arg(long, env = "QASE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Project code
    #[arg(long, env = "QASE_PROJECT_CODE")]
    pub project: Option<String>,

    /// API base URL
    #[arg(long, env = "QASE_API_URL")]
    pub api_url: Option<String>,

    /// Transport timeout in seconds
    #[arg(long, env = "QASE_API_TIMEOUT")]
    pub api_timeout: Option<u64>,

    /// Maximum requests in flight (overrides settings)
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Request starts per second (overrides settings)
    #[arg(long)]
    pub requests_per_second: Option<u32>,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Skip fetching and work from the existing result log
    #[arg(long)]
    pub no_fetch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "runclose",
            "--workdir",
            "/tmp/w",
            "run",
            "--no-fetch",
            "--token",
            "t",
            "--project",
            "DEMO",
            "--max-concurrent",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.global.workdir, PathBuf::from("/tmp/w"));
        match cli.cmd {
            Command::Run(args) => {
                assert!(args.no_fetch);
                assert_eq!(args.api.project.as_deref(), Some("DEMO"));
                assert_eq!(args.api.max_concurrent, Some(2));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["runclose", "select", "--log-format", "json"]).unwrap();
        assert_eq!(cli.global.log_format, LogFormat::Json);
        assert!(matches!(cli.cmd, Command::Select));
    }
}
