use std::{process::ExitCode, time::Duration};

use clap::Parser;
use edu_hub_e2e::{EducationHub, config::HubConfig};
use edu_hub_runner::{Tester, TestRunnerConfiguration};

/// Per-case timeout unless `--timeout-ms` is given.
const CASE_TIMEOUT: Duration = Duration::from_secs(600);

/// Runs the Education Hub workflows against a live deployment.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    hub: HubConfig,
    #[command(flatten)]
    runner: TestRunnerConfiguration,
}

#[tokio::main]
async fn main() -> ExitCode {
    edu_hub_runner::init();

    let Cli { hub, runner } = Cli::parse();
    let mut tester =
        Tester::new(hub).with_runner_config(runner.with_default_timeout(CASE_TIMEOUT));
    tester.add_suite(EducationHub::new());

    if tester.run().await.was_successful() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
