use chart_pusher::cli::{Args, Runner};
use chart_pusher::logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();
    logging::init(args.verbose, args.quiet);

    let runner = Runner::new(&args);
    let mut stdout = std::io::stdout();

    match runner.run(args, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            runner.output().error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
