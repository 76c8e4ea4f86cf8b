use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::{json, Value};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use transfer_forms::config::parse_indent;
use transfer_forms::{
    canonical_schema, relaxed_schema, to_pretty_json, FailureMode, FormKind, FormPipeline, PipelineConfig,
    PipelineError,
};
use transfer_models::{BucketType, Choice, EmailNotificationType, FieldViolation, Modality, Platform};

const EXIT_REJECTED: u8 = 1;
const EXIT_BAD_REQUEST: u8 = 2;

fn form_arg() -> Arg {
    Arg::new("form")
        .long("form")
        .short('f')
        .required(true)
        .value_parser(value_parser!(FormKind))
        .help("Form to process: modality, upload-job or submit-job")
}

fn input_arg() -> Arg {
    Arg::new("input")
        .default_value("-")
        .value_parser(value_parser!(PathBuf))
        .help("JSON file to read, or - for stdin")
}

fn cli() -> Command {
    Command::new("transfer-forms")
        .version(transfer_forms::VERSION)
        .about("Normalize and validate data-transfer job submission forms")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("YAML or JSON configuration file"),
        )
        .arg(
            Arg::new("failure-mode")
                .long("failure-mode")
                .global(true)
                .value_parser(value_parser!(FailureMode))
                .help("On canonical rejection: omit (default) or detailed"),
        )
        .arg(
            Arg::new("indent")
                .long("indent")
                .global(true)
                .value_parser(parse_indent)
                .help("Indent width of printed JSON, at most 16"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("submit")
                .about("Run a form submission through normalize, lift and validate")
                .arg(form_arg())
                .arg(input_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the response as JSON"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a canonical record without lifting")
                .arg(form_arg())
                .arg(input_arg()),
        )
        .subcommand(
            Command::new("schema")
                .about("Print a form's JSON Schema")
                .arg(form_arg())
                .arg(
                    Arg::new("canonical")
                        .long("canonical")
                        .action(ArgAction::SetTrue)
                        .help("Print the canonical schema instead of the form schema"),
                ),
        )
        .subcommand(Command::new("choices").about("Print dropdown options for every enumerated field"))
}

fn load_config(matches: &ArgMatches) -> Result<PipelineConfig> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let mut config = config.with_process_env()?;

    if let Some(mode) = matches.get_one::<FailureMode>("failure-mode") {
        config = config.with_failure_mode(*mode);
    }
    if let Some(indent) = matches.get_one::<usize>("indent") {
        config = config.with_output_indent(*indent);
    }
    Ok(config)
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_input(args: &ArgMatches) -> Result<String> {
    let path = args
        .get_one::<PathBuf>("input")
        .context("input has a default value")?;
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading submission from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

fn form(args: &ArgMatches) -> Result<FormKind> {
    args.get_one::<FormKind>("form")
        .copied()
        .context("--form is required")
}

fn report_violations(violations: &[FieldViolation]) {
    for violation in violations {
        eprintln!("  {violation}");
    }
}

fn submit(pipeline: &FormPipeline, args: &ArgMatches) -> Result<ExitCode> {
    let kind = form(args)?;
    let text = read_input(args)?;
    let indent = pipeline.config().output_indent;

    match pipeline.respond_str(kind, &text) {
        Ok(response) => {
            if args.get_flag("json") {
                println!("{}", to_pretty_json(&response, indent)?);
            } else {
                print!("{}", response.render_text(indent)?);
            }
            Ok(if response.is_validated() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_REJECTED)
            })
        }
        Err(err) => Ok(report_failure(&err)),
    }
}

fn report_failure(err: &PipelineError) -> ExitCode {
    error!(error = %err, "submission failed");
    eprintln!("error: {err}");
    report_violations(err.violations());
    if err.is_shape_error() {
        ExitCode::from(EXIT_BAD_REQUEST)
    } else {
        ExitCode::from(EXIT_REJECTED)
    }
}

fn validate(pipeline: &FormPipeline, args: &ArgMatches) -> Result<ExitCode> {
    let kind = form(args)?;
    let text = read_input(args)?;
    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("error: {kind} record is not valid JSON: {err}");
            return Ok(ExitCode::from(EXIT_BAD_REQUEST));
        }
    };

    match pipeline.validate_canonical(kind, &value) {
        Ok(validated) => {
            println!("{}", to_pretty_json(&validated.payload, pipeline.config().output_indent)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(errors) => Ok(report_failure(&PipelineError::CanonicalRejection(errors))),
    }
}

fn schema(args: &ArgMatches, indent: usize) -> Result<ExitCode> {
    let kind = form(args)?;
    let document = if args.get_flag("canonical") {
        canonical_schema(kind)?
    } else {
        relaxed_schema(kind)?
    };
    println!("{}", to_pretty_json(&document, indent)?);
    Ok(ExitCode::SUCCESS)
}

fn choices() -> Value {
    json!({
        "modality": Modality::options(),
        "platform": Platform::options(),
        "s3_bucket": BucketType::options(),
        "email_notification_types": EmailNotificationType::options(),
    })
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let config = load_config(matches)?;
    init_tracing(&config.log_level, matches.get_flag("log-json"));
    debug!(?config, "configuration loaded");
    let indent = config.output_indent;

    match matches.subcommand() {
        Some(("submit", args)) => submit(&FormPipeline::new(config)?, args),
        Some(("validate", args)) => validate(&FormPipeline::new(config)?, args),
        Some(("schema", args)) => schema(args, indent),
        Some(("choices", _)) => {
            println!("{}", to_pretty_json(&choices(), indent)?);
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::from(EXIT_BAD_REQUEST)),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_REJECTED)
        }
    }
}
