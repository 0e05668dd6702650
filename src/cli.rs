use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_OPTIONS_FILE;

#[derive(Parser, Debug)]
#[command(name = "modweave", version, about)]
pub struct Args {
    /// Path to the options file; relative module directories resolve against its folder
    #[arg(long, default_value = DEFAULT_OPTIONS_FILE)]
    pub config: PathBuf,

    /// Log each phase's sub-step outcomes (overrides `verbose` in the options file)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the whole pipeline and write generated files
    Build {
        /// Output directory for generated files
        #[arg(long, default_value = ".modweave")]
        out: PathBuf,
    },

    /// Resolve, validate and order modules, then print the load order
    Plan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_defaults() {
        let args = Args::parse_from(["modweave", "build"]);
        assert_eq!(args.config, PathBuf::from("modweave.toml"));
        assert_eq!(
            args.command,
            Command::Build {
                out: PathBuf::from(".modweave")
            }
        );
        assert!(!args.verbose);
    }

    #[test]
    fn plan_with_config() {
        let args = Args::parse_from(["modweave", "--config", "app/modweave.toml", "-v", "plan"]);
        assert_eq!(args.config, PathBuf::from("app/modweave.toml"));
        assert_eq!(args.command, Command::Plan);
        assert!(args.verbose);
    }
}
