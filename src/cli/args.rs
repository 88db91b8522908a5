//! Command-line argument parsing

use crate::config::RegistryOptions;
use clap::{Args as ClapArgs, Parser, Subcommand};

const PUSH_ABOUT: &str = "Upload a chart to a registry.

If the chart has an associated provenance file,
it will also be uploaded.";

#[derive(Debug, Parser)]
#[command(name = "chart-pusher")]
#[command(about = "A tool to push packaged charts to remote registries")]
#[command(version, author)]
pub struct Args {
    /// Enable verbose output
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Only print the push summary and errors
    #[arg(long = "quiet", short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Push a chart to remote
    #[command(long_about = PUSH_ABOUT)]
    Push(PushArgs),
}

#[derive(Debug, ClapArgs)]
pub struct PushArgs {
    /// Path to the packaged chart (.tgz)
    #[arg(value_name = "CHART")]
    pub chart: String,

    /// Destination, e.g. oci://registry.example.com/charts
    #[arg(value_name = "REMOTE")]
    pub remote: String,

    #[command(flatten)]
    pub registry: RegistryOptions,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_push_with_flags() {
        let args = Args::try_parse_from([
            "chart-pusher",
            "push",
            "mychart-1.2.0.tgz",
            "oci://registry.example.com/charts",
            "--ca-file",
            "ca.pem",
            "--insecure-skip-tls-verify",
            "--username",
            "admin",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        let Command::Push(push) = args.command;
        assert_eq!(push.chart, "mychart-1.2.0.tgz");
        assert_eq!(push.remote, "oci://registry.example.com/charts");
        assert_eq!(push.registry.ca_file.as_deref(), Some("ca.pem"));
        assert!(push.registry.insecure_skip_tls_verify);
        assert!(!push.registry.plain_http);
        assert_eq!(push.registry.username.as_deref(), Some("admin"));
    }

    #[test]
    fn test_push_requires_two_positionals() {
        assert!(Args::try_parse_from(["chart-pusher", "push", "mychart.tgz"]).is_err());
        let extra = ["chart-pusher", "push", "a.tgz", "oci://h/x", "extra"];
        assert!(Args::try_parse_from(extra).is_err());
    }
}
