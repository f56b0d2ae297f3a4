use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;
use crate::config::Config;
use crate::commands::{configure, query, repl};

#[derive(Parser)]
#[command(name = "mathhelper")]
#[command(about = "An interactive helper for algebra and calculus queries")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Log debug output to stderr")]
    pub debug: bool,

    #[arg(long, help = "Require the command word at the start of each query")]
    pub strict: bool,

    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Fold command line overrides into the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.strict {
            config.general.match_mode = crate::core::query::MatchMode::Strict;
        }
        if self.no_color {
            config.general.color = false;
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::config_file_path)
    }
}

impl Commands {
    /// Run the command; returns whether it succeeded
    pub fn execute(self, config: Config, config_path: PathBuf) -> Result<bool> {
        match self {
            Commands::Repl => {
                repl::handle_repl_command(config)?;
                Ok(true)
            }
            Commands::Query(args) => query::handle_query_command(config, &args),
            Commands::Config(args) => {
                configure::handle_config_command(config, &config_path, args.command)?;
                Ok(true)
            }
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive session (default)
    Repl,

    /// Run a single query and print its result
    Query(QueryArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct QueryArgs {
    /// Query text, e.g. `derivative x^2`
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}

impl QueryArgs {
    pub fn line(&self) -> String {
        self.text.join(" ")
    }
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: Option<ConfigCommands>,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::MatchMode;

    #[test]
    fn test_no_subcommand_means_session() {
        let cli = Cli::try_parse_from(["mathhelper"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_query_collects_words() {
        let cli = Cli::try_parse_from(["mathhelper", "query", "solve", "x^2", "=", "-1"]).unwrap();
        match cli.command {
            Some(Commands::Query(args)) => assert_eq!(args.line(), "solve x^2 = -1"),
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from(["mathhelper", "--strict", "--no-color", "repl"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.general.match_mode, MatchMode::Strict);
        assert!(!config.general.color);
    }

    #[test]
    fn test_config_reset_force() {
        let cli = Cli::try_parse_from(["mathhelper", "config", "reset", "--force"]).unwrap();
        match cli.command {
            Some(Commands::Config(ConfigArgs {
                command: Some(ConfigCommands::Reset { force }),
            })) => assert!(force),
            _ => panic!("expected config reset"),
        }
    }
}
