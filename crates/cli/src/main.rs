use circoord_core::{
    apply_stage, config_hash, invariant_search, translation_search, BaseMetricKind, MetricError,
    SearchMode, SequenceError, ShiftSearchConfig, ShiftSearchOutcome, Stage,
};
use clap::{error::ErrorKind, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "circoord",
    version,
    about = "Invariant distances between circular coordinate sequences"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short = 'j', global = true)]
    json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON file with shift search settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Unwrap and/or orient one sequence
    Normalize {
        #[arg(allow_hyphen_values = true)]
        sequence: String,
        #[arg(long, value_enum, default_value = "full")]
        stage: StageArg,
    },
    /// Invariant distance between two sequences
    Distance {
        #[arg(allow_hyphen_values = true)]
        left: String,
        #[arg(allow_hyphen_values = true)]
        right: String,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Print the effective shift search settings
    Config {
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct SearchArgs {
    #[arg(long, value_enum, default_value = "euclidean")]
    base: BaseArg,
    /// Let the shift leave the [min-min, max-max] range
    #[arg(long)]
    unbounded: bool,
    #[arg(long)]
    tolerance: Option<f64>,
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Fail instead of warning when the shift search does not converge
    #[arg(long)]
    require_convergence: bool,
    /// Skip unwrap/orientation and only minimize over shifts
    #[arg(long)]
    translation_only: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StageArg {
    Unwrap,
    Orient,
    Full,
}

impl From<StageArg> for Stage {
    fn from(value: StageArg) -> Self {
        match value {
            StageArg::Unwrap => Stage::Unwrap,
            StageArg::Orient => Stage::Orient,
            StageArg::Full => Stage::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BaseArg {
    Euclidean,
    MeanAbsoluteError,
    MeanDifference,
    Dtw,
}

impl From<BaseArg> for BaseMetricKind {
    fn from(value: BaseArg) -> Self {
        match value {
            BaseArg::Euclidean => BaseMetricKind::Euclidean,
            BaseArg::MeanAbsoluteError => BaseMetricKind::MeanAbsoluteError,
            BaseArg::MeanDifference => BaseMetricKind::MeanDifference,
            BaseArg::Dtw => BaseMetricKind::DynamicTimeWarping,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum AppErrorKind {
    Usage,
    Input,
    Computation,
    Io,
    Internal,
}

#[derive(Clone, Debug)]
struct AppError {
    kind: AppErrorKind,
    code: &'static str,
    message: String,
    details: Box<Value>,
}

impl AppError {
    fn new(kind: AppErrorKind, code: &'static str, message: String) -> Self {
        Self {
            kind,
            code,
            message,
            details: Box::new(Value::Null),
        }
    }

    fn usage(message: String) -> Self {
        Self::new(AppErrorKind::Usage, "CLI_USAGE", message)
    }

    fn config_invalid(message: String) -> Self {
        Self::new(AppErrorKind::Input, "CONFIG_INVALID", message)
    }

    fn sequence_parse(message: String) -> Self {
        Self::new(AppErrorKind::Input, "SEQUENCE_PARSE", message)
    }

    fn io(message: String) -> Self {
        Self::new(AppErrorKind::Io, "IO_ERROR", message)
    }

    fn internal(message: String) -> Self {
        Self::new(AppErrorKind::Internal, "INTERNAL_ERROR", message)
    }

    fn exit_code(&self) -> i32 {
        match self.kind {
            AppErrorKind::Usage => 1,
            AppErrorKind::Input
            | AppErrorKind::Computation
            | AppErrorKind::Io
            | AppErrorKind::Internal => 2,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Box::new(details);
        self
    }
}

#[derive(Clone, Debug, Serialize)]
struct AuditTrace {
    tool_version: &'static str,
    config_hash: String,
    search_mode: Option<&'static str>,
    base_metric: Option<&'static str>,
}

impl AuditTrace {
    fn unavailable() -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION"),
            config_hash: "UNAVAILABLE".to_string(),
            search_mode: None,
            base_metric: None,
        }
    }
}

#[derive(Serialize)]
struct JsonEnvelope {
    status: String,
    error: Option<ErrorEnvelope>,
    audit_trace: AuditTrace,
    data: Option<Value>,
}

#[derive(Clone, Debug, Serialize)]
struct ErrorEnvelope {
    code: String,
    message: String,
    details: Value,
}

impl From<&AppError> for ErrorEnvelope {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.to_string(),
            message: err.message.clone(),
            details: (*err.details).clone(),
        }
    }
}

/// Resolved settings for one distance computation.
#[derive(Clone, Debug)]
struct SearchPlan {
    base: BaseMetricKind,
    config: ShiftSearchConfig,
    translation_only: bool,
    audit: AuditTrace,
}

impl SearchPlan {
    fn run(&self, left: &[f64], right: &[f64]) -> Result<ShiftSearchOutcome, MetricError> {
        if self.translation_only {
            translation_search(self.base, left, right, self.config.clone())
        } else {
            invariant_search(self.base, left, right, self.config.clone())
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let wants_json = args.iter().any(|arg| arg == "--json" || arg == "-j");

    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_tracing(cli.verbose);
            let json = cli.json || wants_json;
            match run(cli, json) {
                Ok(envelope) => {
                    if json {
                        print_json(&envelope);
                    }
                    std::process::exit(0);
                }
                Err((err, audit)) => {
                    let exit_code = err.exit_code();
                    if json {
                        print_json(&error_envelope(&err, audit));
                    } else {
                        eprintln!("{}", err.message);
                    }
                    std::process::exit(exit_code);
                }
            }
        }
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                std::process::exit(0);
            }
            _ => {
                if wants_json {
                    let usage = AppError::usage(err.to_string());
                    print_json(&error_envelope(&usage, AuditTrace::unavailable()));
                } else {
                    let _ = err.print();
                }
                std::process::exit(1);
            }
        },
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli, json: bool) -> Result<JsonEnvelope, (AppError, AuditTrace)> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Normalize { sequence, stage } => {
            normalize(&sequence, stage, json).map_err(|err| (err, AuditTrace::unavailable()))
        }
        Commands::Distance {
            left,
            right,
            search,
        } => {
            let plan =
                resolve_plan(config_path, &search).map_err(|err| (err, AuditTrace::unavailable()))?;
            distance(&left, &right, &plan, json).map_err(|err| (err, plan.audit.clone()))
        }
        Commands::Config { search } => {
            let plan =
                resolve_plan(config_path, &search).map_err(|err| (err, AuditTrace::unavailable()))?;
            if !json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&plan.config)
                        .map_err(|err| (AppError::internal(err.to_string()), plan.audit.clone()))?
                );
                println!("config_hash: {}", plan.audit.config_hash);
            }
            Ok(JsonEnvelope {
                status: "OK".to_string(),
                error: None,
                audit_trace: plan.audit.clone(),
                data: Some(json!({
                    "config": plan.config,
                    "base_metric": plan.base.id(),
                    "translation_only": plan.translation_only,
                })),
            })
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ShiftSearchConfig, AppError> {
    let Some(path) = path else {
        return Ok(ShiftSearchConfig::default());
    };
    let raw = fs::read_to_string(path).map_err(|err| {
        AppError::io(format!(
            "failed to read config file {}: {}",
            path.display(),
            err
        ))
    })?;
    serde_json::from_str(&raw).map_err(|err| {
        AppError::config_invalid(format!("invalid config file {}: {}", path.display(), err))
    })
}

fn resolve_plan(config_path: Option<&Path>, search: &SearchArgs) -> Result<SearchPlan, AppError> {
    let mut config = load_config(config_path)?;
    if search.unbounded {
        config.mode = SearchMode::Unbounded;
    }
    if let Some(tolerance) = search.tolerance {
        config.x_tolerance = tolerance;
    }
    if let Some(max_iterations) = search.max_iterations {
        config.max_iterations = max_iterations;
    }
    if search.require_convergence {
        config.require_convergence = true;
    }
    config.validate().map_err(map_metric_error)?;

    let hash = config_hash(&config)
        .map_err(|err| AppError::internal(format!("failed to hash config: {}", err)))?;
    let base = BaseMetricKind::from(search.base);
    debug!(config_hash = %hash, base = base.id(), "resolved search plan");
    Ok(SearchPlan {
        base,
        audit: AuditTrace {
            tool_version: env!("CARGO_PKG_VERSION"),
            config_hash: hash,
            search_mode: Some(config.mode.id()),
            base_metric: Some(base.id()),
        },
        config,
        translation_only: search.translation_only,
    })
}

fn normalize(sequence: &str, stage: StageArg, json: bool) -> Result<JsonEnvelope, AppError> {
    let values = parse_sequence(sequence, "sequence")?;
    let out = apply_stage(stage.into(), &values).map_err(|err| map_sequence_error(err, None))?;
    if !json {
        println!("{}", format_sequence(&out));
    }
    Ok(JsonEnvelope {
        status: "OK".to_string(),
        error: None,
        audit_trace: AuditTrace::unavailable(),
        data: Some(json!({ "stage": stage_id(stage), "sequence": out })),
    })
}

fn distance(
    left: &str,
    right: &str,
    plan: &SearchPlan,
    json: bool,
) -> Result<JsonEnvelope, AppError> {
    let left = parse_sequence(left, "left")?;
    let right = parse_sequence(right, "right")?;
    let outcome = plan.run(&left, &right).map_err(map_metric_error)?;
    info!(
        distance = outcome.distance,
        shift = outcome.shift,
        converged = outcome.converged,
        "distance computed"
    );
    if !json {
        print_outcome(&outcome);
    }
    Ok(JsonEnvelope {
        status: "OK".to_string(),
        error: None,
        audit_trace: plan.audit.clone(),
        data: Some(json!(outcome)),
    })
}

/// Comma-separated numbers, or `@path` to a JSON array of numbers.
fn parse_sequence(raw: &str, label: &str) -> Result<Vec<f64>, AppError> {
    if let Some(path) = raw.strip_prefix('@') {
        let text = fs::read_to_string(path).map_err(|err| {
            AppError::io(format!("failed to read {} sequence {}: {}", label, path, err))
        })?;
        return serde_json::from_str::<Vec<f64>>(&text).map_err(|err| {
            AppError::sequence_parse(format!(
                "{} sequence file {} is not a JSON number array: {}",
                label, path, err
            ))
        });
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(',')
        .enumerate()
        .map(|(index, token)| {
            token.trim().parse::<f64>().map_err(|err| {
                AppError::sequence_parse(format!(
                    "{} sequence: token {} ({:?}) is not a number: {}",
                    label, index, token, err
                ))
                .with_details(json!({ "sequence": label, "index": index }))
            })
        })
        .collect()
}

fn format_sequence(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn print_outcome(outcome: &ShiftSearchOutcome) {
    println!(
        "distance={:.9} shift={:.9} range=[{:.6}, {:.6}] evaluations={} converged={}",
        outcome.distance,
        outcome.shift,
        outcome.range.lower,
        outcome.range.upper,
        outcome.evaluations,
        outcome.converged
    );
}

fn stage_id(stage: StageArg) -> &'static str {
    match stage {
        StageArg::Unwrap => "unwrap",
        StageArg::Orient => "orient",
        StageArg::Full => "full",
    }
}

fn sequence_check(err: &SequenceError) -> Value {
    match err {
        SequenceError::Empty => json!({ "check": "length" }),
        SequenceError::NonFinite { index, .. } => json!({ "check": "finite", "index": index }),
    }
}

fn map_sequence_error(err: SequenceError, role: Option<&str>) -> AppError {
    let mut details = sequence_check(&err);
    if let (Some(role), Some(obj)) = (role, details.as_object_mut()) {
        obj.insert("sequence".to_string(), Value::String(role.to_string()));
    }
    let message = match role {
        Some(role) => format!("{} sequence rejected: {}", role, err),
        None => format!("sequence rejected: {}", err),
    };
    AppError::new(AppErrorKind::Input, "INVALID_SEQUENCE", message).with_details(details)
}

fn map_metric_error(err: MetricError) -> AppError {
    match &err {
        MetricError::InvalidSequence { role, source } => {
            let role = role.to_string();
            map_sequence_error(*source, Some(role.as_str()))
        }
        MetricError::BaseMetric { shift, .. } => {
            AppError::new(AppErrorKind::Computation, "BASE_METRIC_FAILED", err.to_string())
                .with_details(json!({ "shift": shift }))
        }
        MetricError::NonFiniteDistance { shift, .. } => {
            AppError::new(AppErrorKind::Computation, "NON_FINITE_DISTANCE", err.to_string())
                .with_details(json!({ "shift": shift }))
        }
        MetricError::NonConvergence {
            iterations,
            best_shift,
            best_distance,
        } => AppError::new(AppErrorKind::Computation, "NON_CONVERGENCE", err.to_string())
            .with_details(json!({
                "iterations": iterations,
                "best_shift": best_shift,
                "best_distance": best_distance,
            })),
        MetricError::InvalidConfig { field, .. } => {
            AppError::config_invalid(err.to_string()).with_details(json!({ "field": field }))
        }
    }
}

fn error_envelope(err: &AppError, audit_trace: AuditTrace) -> JsonEnvelope {
    JsonEnvelope {
        status: "ERROR".to_string(),
        error: Some(ErrorEnvelope::from(err)),
        audit_trace,
        data: None,
    }
}

fn print_json(envelope: &JsonEnvelope) {
    match serde_json::to_string(envelope) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize json output: {err}"),
    }
}
