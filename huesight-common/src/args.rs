//! CLI argument parsing for pollers.

use std::path::PathBuf;

use clap::Parser;

/// Common CLI arguments for all pollers.
#[derive(Parser, Debug, Clone)]
#[command(about = "HueSight bridge poller")]
#[command(version)]
pub struct BridgeArgs {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl BridgeArgs {
    /// Parse CLI arguments with a default config path.
    ///
    /// If no `--config` argument is provided, uses the default.
    pub fn parse_with_default(default_config: &'static str) -> Self {
        Self::parse_from_with_default(std::env::args_os(), default_config)
    }

    /// Parse the given arguments with a default config path.
    ///
    /// Exits the process with clap's usage message on invalid input.
    pub fn parse_from_with_default<I, T>(args: I, default_config: &'static str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = <Self as clap::CommandFactory>::command()
            .mut_arg("config", |arg| {
                arg.default_value(default_config).required(false)
            })
            .get_matches_from(args);

        <Self as clap::FromArgMatches>::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_config() {
        let args = BridgeArgs::parse_from_with_default(["huesight"], "huesight.json5");
        assert_eq!(args.config, PathBuf::from("huesight.json5"));
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn test_args_log_level_keeps_default_config() {
        let args =
            BridgeArgs::parse_from_with_default(["huesight", "--log-level", "warn"], "hue.json5");
        assert_eq!(args.config, PathBuf::from("hue.json5"));
        assert_eq!(args.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_args_overrides() {
        let args = BridgeArgs::parse_from_with_default(
            ["huesight", "--config", "/etc/huesight.json5", "--log-level", "debug"],
            "huesight.json5",
        );
        assert_eq!(args.config, PathBuf::from("/etc/huesight.json5"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }
}
