use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use airsight::config::FormConfig;
use airsight::validation::{self, Field};
use airsight::{
    AirQualityReport, AirSightConfig, AirSightError, FormController, FormInput, SubmitOutcome,
    VERSION,
};
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

/// Current air quality and health advice for any city
#[derive(Debug, Parser)]
#[command(name = "airsight", version, about)]
struct Cli {
    /// Configuration file (defaults to the user config dir)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log request details at debug level.
    #[arg(long = "verbose", action = clap::ArgAction::SetTrue)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up one location and print the report
    Check(CheckArgs),
    /// Prompt for locations until end of input
    Interactive,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[arg(long = "city", value_name = "CITY")]
    city: String,
    /// State, province or region
    #[arg(long = "region", value_name = "REGION")]
    region: String,
    /// Falls back to the configured default country
    #[arg(long = "country", value_name = "COUNTRY")]
    country: Option<String>,
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report here instead of stdout
    #[arg(long = "output", value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Html,
    Json,
}

fn render(report: &AirQualityReport, format: OutputFormat) -> airsight::Result<String> {
    Ok(match format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Html => report.render_html(),
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| AirSightError::general(format!("Failed to serialize report: {e}")))?,
    })
}

/// Print the report, or write it to `output` when given
fn emit(report: &AirQualityReport, format: OutputFormat, output: Option<&Path>) -> airsight::Result<()> {
    let body = render(report, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, body)?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", body.trim_end()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = AirSightConfig::load_from_path(cli.config.clone())?;
    airsight::logging::init(&config.logging, cli.verbose)?;
    debug!("Loaded configuration: {:?}", config);

    match cli.command {
        Some(Command::Check(args)) => check(&config, args).await,
        Some(Command::Interactive) => interactive(&config).await,
        None => {
            usage(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn usage(config: &AirSightConfig) {
    println!("AirSight {VERSION}");
    println!("  geocoding:   {}", config.geocoding.base_url);
    println!("  air quality: {}", config.air_quality.base_url);
    println!();
    println!("Run `airsight check --city <CITY> --region <REGION>` or `airsight interactive`.");
}

async fn check(config: &AirSightConfig, args: CheckArgs) -> Result<ExitCode> {
    let controller = FormController::from_config(config)?;
    let input = FormInput::new(args.city, args.region, args.country);

    let result = match controller.submit(&input).await {
        SubmitOutcome::Rendered(report) => emit(&report, args.format, args.output.as_deref()),
        SubmitOutcome::Rejected(errors) => {
            eprintln!("{}", AirSightError::Validation(errors).user_message());
            return Ok(ExitCode::from(2));
        }
        SubmitOutcome::Failed(err) => Err(err),
        SubmitOutcome::Busy | SubmitOutcome::NothingToRetry => {
            Err(AirSightError::general("no submission was run"))
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

enum AfterFailure {
    Retry,
    Clear,
    Quit,
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

/// Prompt until the field passes its live check. `None` on end of input.
async fn prompt_field(
    lines: &mut Lines<BufReader<Stdin>>,
    field: Field,
    rules: &FormConfig,
) -> Result<Option<String>> {
    let prompt = match field {
        Field::Country => format!("{} [{}]: ", field.label(), rules.default_country),
        _ => format!("{}: ", field.label()),
    };
    loop {
        let Some(value) = read_line(lines, &prompt).await? else {
            return Ok(None);
        };
        match validation::validate_field(field, &value, rules) {
            Ok(()) => return Ok(Some(value)),
            Err(error) => eprintln!("  {}", error.message),
        }
    }
}

async fn read_form(
    lines: &mut Lines<BufReader<Stdin>>,
    rules: &FormConfig,
) -> Result<Option<FormInput>> {
    let Some(city) = prompt_field(lines, Field::City, rules).await? else {
        return Ok(None);
    };
    let Some(region) = prompt_field(lines, Field::Region, rules).await? else {
        return Ok(None);
    };
    let Some(country) = prompt_field(lines, Field::Country, rules).await? else {
        return Ok(None);
    };
    Ok(Some(FormInput::new(city, region, Some(country))))
}

async fn read_choice(lines: &mut Lines<BufReader<Stdin>>) -> Result<AfterFailure> {
    loop {
        let Some(answer) = read_line(lines, "[r]etry, [c]lear or [q]uit? ").await? else {
            return Ok(AfterFailure::Quit);
        };
        match answer.trim().to_lowercase().as_str() {
            "r" | "retry" => return Ok(AfterFailure::Retry),
            "c" | "clear" => return Ok(AfterFailure::Clear),
            "q" | "quit" => return Ok(AfterFailure::Quit),
            _ => {}
        }
    }
}

async fn interactive(config: &AirSightConfig) -> Result<ExitCode> {
    let controller = FormController::from_config(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    'form: loop {
        let Some(input) = read_form(&mut lines, controller.rules()).await? else {
            break;
        };
        let mut outcome = controller.submit(&input).await;

        loop {
            match outcome {
                SubmitOutcome::Rendered(report) => {
                    println!();
                    println!("{}", report.render_text());
                    continue 'form;
                }
                SubmitOutcome::Rejected(errors) => {
                    eprintln!("{errors}");
                    continue 'form;
                }
                SubmitOutcome::Failed(err) => {
                    eprintln!("{}", err.user_message());
                    match read_choice(&mut lines).await? {
                        AfterFailure::Retry => outcome = controller.retry().await,
                        AfterFailure::Clear => {
                            controller.clear();
                            continue 'form;
                        }
                        AfterFailure::Quit => break 'form,
                    }
                }
                SubmitOutcome::Busy | SubmitOutcome::NothingToRetry => continue 'form,
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
