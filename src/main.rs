//! Command-line entry point: analyse one decision and print the report.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use decision_advisor::adapters::{provider_from_config, ReportFormatter};
use decision_advisor::application::PipelineRunner;
use decision_advisor::config::AppConfig;
use decision_advisor::domain::schemas::DecisionInput;

#[derive(Parser, Debug)]
#[command(author, version, about = "Analyse a decision with a multi-step AI pipeline", long_about = None)]
struct Cli {
    /// The decision to analyse, e.g. "Should I accept the job offer?"
    decision: String,

    /// Background that should inform the analysis
    #[arg(long)]
    context: Option<String>,

    /// When the decision has to be made or take effect
    #[arg(long)]
    timeframe: Option<String>,

    /// Print the final analysis state as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.logging.init() {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let mut input = match DecisionInput::new(cli.decision) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Invalid decision: {}", e);
            return ExitCode::from(2);
        }
    };
    if let Some(context) = cli.context {
        input = input.with_context(context);
    }
    if let Some(timeframe) = cli.timeframe {
        input = input.with_timeframe(timeframe);
    }

    let generator = match provider_from_config(&config.ai) {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("Failed to create {} backend: {}", config.ai.provider, e);
            return ExitCode::FAILURE;
        }
    };

    let runner = PipelineRunner::new(generator)
        .with_config(config.pipeline.clone())
        .with_temperature(config.ai.temperature);

    eprintln!("Step 1/5: Planning analysis...");
    let progress = |label: &str, percent: u8| eprintln!("[{:>3}%] {}", percent, label);
    let state = runner.run(input, Some(&progress)).await;

    if cli.json {
        match serde_json::to_string_pretty(&state) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize analysis: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", ReportFormatter::analysis(&state));
    }

    if state.has_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
