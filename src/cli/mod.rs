//! Command-line interface for elaster
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading, overrides and validation
//! - Subcommands (version, completion, config)

use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{Config, LogLevel};
use crate::error::{ConfigError, ElasterError, Result};
use crate::utils::uri::sanitize;

pub mod completion;

/// elaster - re-index MongoDB collections into Elasticsearch
#[derive(Parser, Debug)]
#[command(
    name = "elaster",
    version,
    about = "Export MongoDB collections into Elasticsearch indexes",
    long_about = "Drops and recreates each configured Elasticsearch index, applies its mapping,
then streams the matching MongoDB documents into it one at a time."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// MongoDB connection URI, overrides `mongo.connection`
    ///
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    #[arg(long, value_name = "URI")]
    pub mongo_uri: Option<String>,

    /// Elasticsearch base URL, overrides `elastic.host`
    #[arg(long, value_name = "URL")]
    pub elastic_host: Option<String>,

    /// Export only this collection (repeatable)
    #[arg(long, value_name = "NAME", action = ArgAction::Append)]
    pub only: Vec<String>,

    /// Disable the progress bar
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for elaster
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish)
        #[arg(value_name = "SHELL")]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,

        /// Print configured collection names, one per line
        #[arg(long = "list-collections")]
        list_collections: bool,
    },
}

impl CliArgs {
    /// Whether this invocation cannot work without a configuration file
    fn requires_config(&self) -> bool {
        !matches!(
            self.command,
            Some(Commands::Version) | Some(Commands::Completion { .. })
        )
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Effective configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args, |key| std::env::var(key).ok())?;
        Ok(Self { args, config })
    }

    /// Load configuration and layer environment and CLI overrides on top
    ///
    /// Export runs also validate the result and apply `--only`.
    fn load_config<F>(args: &CliArgs, env: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match Config::load_from_file(args.config_file.as_deref()) {
            Ok(config) => config,
            Err(ElasterError::Config(ConfigError::FileNotFound(_))) if !args.requires_config() => {
                Config::default()
            }
            Err(e) => return Err(e),
        };

        config.apply_overrides(env)?;
        Self::apply_args_to_config(&mut config, args);

        if args.command.is_none() {
            config.validate()?;
            config.select_collections(&args.only)?;
        }

        Ok(config)
    }

    /// Apply CLI arguments to configuration
    ///
    /// # Arguments
    /// * `config` - Configuration to modify
    /// * `args` - Parsed arguments
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(uri) = &args.mongo_uri {
            config.mongo.connection = uri.clone();
        }
        if let Some(host) = &args.elastic_host {
            config.elastic.host = host.clone();
        }

        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };

        if args.no_progress || args.quiet {
            config.progress.enabled = false;
        }
        if args.no_color {
            config.progress.color = false;
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if subcommand was handled, false to run the export
    pub async fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Version) => {
                self.show_version();
                Ok(true)
            }
            Some(Commands::Completion { shell }) => {
                print!("{}", completion::generate_completion(shell)?);
                Ok(true)
            }
            Some(Commands::Config {
                show,
                validate,
                list_collections,
            }) => {
                self.handle_config_command(*show, *validate, *list_collections)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Show version information
    fn show_version(&self) {
        println!("elaster version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    fn handle_config_command(&self, show: bool, validate: bool, list: bool) -> Result<()> {
        if list {
            for desc in &self.config.collections {
                println!("{}", desc.name);
            }
            return Ok(());
        }

        if validate {
            println!("Validating configuration file: {}", self.config_path().display());
            self.config.validate()?;
            println!(
                "Configuration is valid ({} collection(s))",
                self.config.collections.len()
            );
        }

        if show {
            println!("Configuration file: {}", self.config_path().display());
            println!();
            println!("=== Effective Configuration ===");
            println!();
            println!("{}", self.config.to_toml()?);
        }

        Ok(())
    }

    /// Configuration file path (from args or default)
    pub fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .as_deref()
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::default_config_path)
    }

    /// Whether the terminal progress bar should be used
    pub fn progress_bar_enabled(&self) -> bool {
        self.config.progress.enabled && !self.args.quiet
    }

    /// Print the endpoints and the start time
    pub fn print_banner(&self) {
        if self.args.quiet {
            return;
        }
        println!("Using elaster: {}", env!("CARGO_PKG_VERSION"));
        println!("Source: {}", sanitize(&self.config.mongo.connection));
        println!("Destination: {}", sanitize(&self.config.elastic.host));
        println!(
            "Started at: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = r#"
[mongo]
connection = "mongodb://localhost:27017/app"

[[collections]]
name = "users"
index = "users_idx"
type = "user"

[[collections]]
name = "orders"
index = "orders_idx"
type = "order"
"#;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "elaster-cli-{}-{}.toml",
            name,
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_args_parsing() {
        let args = parse(&["elaster"]);
        assert!(args.config_file.is_none());
        assert!(args.only.is_empty());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_cli_args_with_flags() {
        let args = parse(&["elaster", "--no-color", "--quiet", "--no-progress"]);
        assert!(args.no_color);
        assert!(args.quiet);
        assert!(args.no_progress);
    }

    #[test]
    fn test_only_is_repeatable() {
        let args = parse(&["elaster", "--only", "users", "--only", "orders"]);
        assert_eq!(args.only, ["users", "orders"]);
    }

    #[test]
    fn test_config_subcommand() {
        let args = parse(&["elaster", "config", "--show", "--validate"]);
        match args.command {
            Some(Commands::Config {
                show,
                validate,
                list_collections,
            }) => {
                assert!(show);
                assert!(validate);
                assert!(!list_collections);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_args_override_config() {
        let args = parse(&[
            "elaster",
            "--mongo-uri",
            "mongodb://db:27017/prod",
            "--elastic-host",
            "http://search:9200",
            "-v",
            "--no-color",
        ]);
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);

        assert_eq!(config.mongo.connection, "mongodb://db:27017/prod");
        assert_eq!(config.elastic.host, "http://search:9200");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(!config.progress.color);
        assert!(config.progress.enabled);
    }

    #[test]
    fn test_quiet_disables_progress() {
        let args = parse(&["elaster", "-q"]);
        let mut config = Config::default();
        CliInterface::apply_args_to_config(&mut config, &args);
        assert_eq!(config.logging.level, LogLevel::Error);
        assert!(!config.progress.enabled);
    }

    #[test]
    fn test_load_config_applies_only() {
        let path = write_config("only", SAMPLE);
        let args = parse(&["elaster", "-c", path.to_str().unwrap(), "--only", "orders"]);

        let config = CliInterface::load_config(&args, no_env).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.collections.len(), 1);
        assert_eq!(config.collections[0].name, "orders");
    }

    #[test]
    fn test_load_config_rejects_unknown_only() {
        let path = write_config("unknown", SAMPLE);
        let args = parse(&["elaster", "-c", path.to_str().unwrap(), "--only", "nope"]);

        let result = CliInterface::load_config(&args, no_env);
        fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(ElasterError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_env_applies_before_args() {
        let path = write_config("env", SAMPLE);
        let args = parse(&[
            "elaster",
            "-c",
            path.to_str().unwrap(),
            "--elastic-host",
            "http://cli:9200",
        ]);

        let config = CliInterface::load_config(&args, |key| match key {
            "ELASTER_ELASTIC_HOST" => Some("http://env:9200".to_string()),
            "ELASTER_MONGO_DATABASE" => Some("reporting".to_string()),
            _ => None,
        })
        .unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.elastic.host, "http://cli:9200");
        assert_eq!(config.mongo.database.as_deref(), Some("reporting"));
    }

    #[test]
    fn test_missing_config_file() {
        let args = parse(&["elaster", "-c", "/nonexistent/elaster.toml"]);
        assert!(matches!(
            CliInterface::load_config(&args, no_env),
            Err(ElasterError::Config(ConfigError::FileNotFound(_)))
        ));

        let args = parse(&["elaster", "-c", "/nonexistent/elaster.toml", "version"]);
        assert!(CliInterface::load_config(&args, no_env).is_ok());
    }

    #[test]
    fn test_invalid_config_fails_export_run() {
        let path = write_config("empty", "[mongo]\nconnection = \"mongodb://localhost\"\n");
        let args = parse(&["elaster", "-c", path.to_str().unwrap()]);

        let result = CliInterface::load_config(&args, no_env);
        fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(ElasterError::Config(ConfigError::MissingField(_)))
        ));
    }
}
