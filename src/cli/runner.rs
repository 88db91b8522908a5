//! Runs parsed command-line arguments

use crate::cli::args::{Args, Command, PushArgs};
use crate::config;
use crate::digest::DigestUtils;
use crate::error::Result;
use crate::output::OutputManager;
use crate::push::{Push, PushResult};
use std::io::Write;

pub struct Runner {
    output: OutputManager,
    push: Push,
}

impl Runner {
    pub fn new(args: &Args) -> Self {
        let output = if args.quiet {
            OutputManager::new_quiet()
        } else {
            OutputManager::new(args.verbose)
        };

        Self {
            output,
            push: Push::new(),
        }
    }

    pub fn with_push(mut self, push: Push) -> Self {
        self.push = push;
        self
    }

    pub fn output(&self) -> &OutputManager {
        &self.output
    }

    /// Execute `args`, writing the result to `out`
    pub async fn run<W: Write + ?Sized>(&self, args: Args, out: &mut W) -> Result<()> {
        match args.command {
            Command::Push(push_args) => self.run_push(push_args, out).await.map(|_| ()),
        }
    }

    async fn run_push<W: Write + ?Sized>(&self, args: PushArgs, out: &mut W) -> Result<PushResult> {
        self.output.section("Chart Pusher");
        self.output.step(&format!("Chart: {}", args.chart));
        self.output.step(&format!("Destination: {}", args.remote));

        let registry_config = config::resolve_from_env(args.registry);
        self.output.detail(&format!(
            "plain-http: {}, insecure-skip-tls-verify: {}, credentials: {}",
            registry_config.plain_http,
            registry_config.insecure_skip_tls_verify,
            if registry_config.has_credentials() { "provided" } else { "none" }
        ));

        let result = self
            .push
            .run(&args.chart, &args.remote, &registry_config, out)
            .await?;

        self.output.detail(&format!(
            "Chart digest: {}",
            DigestUtils::format_digest_short(&result.outcome.chart_digest)
        ));
        self.output.step(&format!("Completed in {}", self.output.elapsed_time()));
        Ok(result)
    }
}
