pub mod query;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::ClientConfig;

/// Run SQL on a remote Spark cluster through a batch job-execution service.
#[derive(Parser, Debug)]
#[command(
    name = "sjq",
    version,
    about = "Run SQL on a remote Spark cluster through a batch job-execution service"
)]
pub struct Cli {
    /// Path to a JSON connection config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Job service API base URL (overrides config)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Bearer token for the job service (overrides config)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a SQL statement as a remote job and print the result
    Query {
        /// SQL text to run
        #[arg(short = 'q', long, conflicts_with = "file")]
        sql: Option<String>,

        /// Read the SQL text from a file
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Fetch and print Spark events after the run
        #[arg(long)]
        events: bool,
    },
}

/// Default config location under the user config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sjq").join("config.json"))
}

/// Resolve the effective config: explicit file, else the default location if
/// present, else built-in defaults; flag overrides applied last.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = if let Some(path) = &cli.config {
        ClientConfig::load(path)?
    } else if let Some(path) = default_config_path().filter(|p| p.exists()) {
        ClientConfig::load(&path)?
    } else {
        ClientConfig::default()
    };

    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.access_token = token.clone();
    }

    if config.api_base_url.is_empty() {
        anyhow::bail!(
            "No API base URL configured. Pass --api-url or set api_base_url in the config file"
        );
    }
    Ok(config)
}

/// Dispatch the CLI command to the appropriate handler.
pub async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Query {
            sql,
            file,
            json,
            events,
        }) => query::cmd_query(cli, sql.as_deref(), file.as_deref(), *json, *events).await,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_version_flag() {
        let result = Cli::try_parse_from(["sjq", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        assert!(err.to_string().contains("0.1.0"));
    }

    #[test]
    fn test_cli_query_inline_sql() {
        let cli = Cli::try_parse_from(["sjq", "query", "-q", "SELECT 1"])
            .expect("Should parse query -q");

        match &cli.command {
            Some(Commands::Query {
                sql,
                file,
                json,
                events,
            }) => {
                assert_eq!(sql.as_deref(), Some("SELECT 1"));
                assert!(file.is_none());
                assert!(!json);
                assert!(!events);
            }
            other => panic!("Expected Query command, got: {:?}", other),
        }
    }

    #[test]
    fn test_cli_query_from_file() {
        let cli = Cli::try_parse_from(["sjq", "query", "-f", "statement.sql", "--json"])
            .expect("Should parse query -f");

        match &cli.command {
            Some(Commands::Query {
                sql, file, json, ..
            }) => {
                assert!(sql.is_none());
                assert_eq!(file.as_deref().unwrap().to_str(), Some("statement.sql"));
                assert!(json);
            }
            other => panic!("Expected Query command, got: {:?}", other),
        }
    }

    #[test]
    fn test_cli_query_sql_and_file_conflict() {
        let result =
            Cli::try_parse_from(["sjq", "query", "-q", "SELECT 1", "-f", "statement.sql"]);
        assert!(result.is_err(), "-q and -f should conflict");
    }

    #[test]
    fn test_cli_global_overrides() {
        let cli = Cli::try_parse_from([
            "sjq",
            "query",
            "-q",
            "SELECT 1",
            "--api-url",
            "https://cde.example.com/api/v1",
            "--token",
            "tok",
        ])
        .expect("Should parse global overrides");

        assert_eq!(
            cli.api_url.as_deref(),
            Some("https://cde.example.com/api/v1")
        );
        assert_eq!(cli.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_cli_events_flag() {
        let cli = Cli::try_parse_from(["sjq", "query", "-q", "SELECT 1", "--events"])
            .expect("Should parse --events");
        match &cli.command {
            Some(Commands::Query { events, .. }) => assert!(events),
            other => panic!("Expected Query command, got: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_config_requires_api_url() {
        let cli = Cli::try_parse_from(["sjq", "query", "-q", "SELECT 1"]).expect("parse");
        // No config file flag, no --api-url: resolution must fail loudly
        // unless a default config file happens to exist on this machine.
        if default_config_path().map(|p| p.exists()) != Some(true) {
            assert!(resolve_config(&cli).is_err());
        }
    }

    #[test]
    fn test_resolve_config_applies_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "https://old/", "access_token": "a"}"#)
            .expect("write");

        let cli = Cli::try_parse_from([
            "sjq",
            "--config",
            path.to_str().unwrap(),
            "--api-url",
            "https://new/",
            "query",
            "-q",
            "SELECT 1",
        ])
        .expect("parse");

        let config = resolve_config(&cli).expect("resolve");
        assert_eq!(config.api_base_url, "https://new/");
        assert_eq!(config.access_token, "a");
    }
}
