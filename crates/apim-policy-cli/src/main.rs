// crates/apim-policy-cli/src/main.rs
// ============================================================================
// Module: APIM Policy CLI Entry Point
// Description: Command dispatcher for policy attachment workflows.
// Purpose: Drive create, read, update, delete, and import from local files.
// Dependencies: apim-policy-client, apim-policy-config, apim-policy-core, clap
// ============================================================================

//! ## Overview
//! The `apim-policy` binary applies policy declarations to API instances.
//! Declarations are TOML or JSON attribute files; resource state is kept as
//! a JSON attribute file between invocations. Diagnostics are written to
//! stderr one per line and any failure exits non-zero.
//!
//! Security posture: input files are untrusted and read with hard size
//! limits; credentials come only from the configuration file or environment.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use apim_policy_client::ClientError;
use apim_policy_client::ConfiguredAuth;
use apim_policy_client::HttpPolicyOperations;
use apim_policy_client::connect;
use apim_policy_config::ApimPolicyConfig;
use apim_policy_config::ConfigError;
use apim_policy_core::AttributeBag;
use apim_policy_core::Diagnostics;
use apim_policy_core::PolicyResource;
use apim_policy_core::attributes::validate_attributes;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a declaration or state file.
const MAX_INPUT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "apim-policy", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to apim-policy.toml or `APIM_POLICY_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a declaration without contacting the platform.
    Validate(DeclarationArgs),
    /// Attach a new policy and write its state.
    Create(PlanArgs),
    /// Refresh state from the platform.
    Read(StateArgs),
    /// Apply a changed declaration to an attached policy.
    Update(PlanArgs),
    /// Detach a policy and remove its state.
    Delete(StateArgs),
    /// Adopt an existing policy by composite id.
    Import(ImportArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Declaration input.
#[derive(Args, Debug)]
struct DeclarationArgs {
    /// Declaration file (`.toml` or `.json`).
    #[arg(long, value_name = "PATH")]
    declaration: PathBuf,
}

/// Declaration input plus state file.
#[derive(Args, Debug)]
struct PlanArgs {
    /// Declaration file (`.toml` or `.json`).
    #[arg(long, value_name = "PATH")]
    declaration: PathBuf,
    /// State file (JSON).
    #[arg(long, value_name = "PATH")]
    state: PathBuf,
}

/// State file only.
#[derive(Args, Debug)]
struct StateArgs {
    /// State file (JSON).
    #[arg(long, value_name = "PATH")]
    state: PathBuf,
}

/// Import inputs.
#[derive(Args, Debug)]
struct ImportArgs {
    /// Composite id `org_id/env_id/api_instance_id/policy_id`.
    #[arg(long, value_name = "ID")]
    id: String,
    /// State file to write (JSON).
    #[arg(long, value_name = "PATH")]
    state: PathBuf,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate,
}

/// Attribute file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    /// TOML document.
    Toml,
    /// JSON object.
    Json,
}

impl InputFormat {
    /// Selects the format from the file extension; anything but `.toml` is JSON.
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Resource entry points bound to the HTTP transport.
type HttpPolicyResource = PolicyResource<HttpPolicyOperations, ConfiguredAuth>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failures.
#[derive(Debug, Error)]
enum CliError {
    /// Input or output failure.
    #[error("error: {0}")]
    Message(String),
    /// Resource diagnostics, already prefixed by severity.
    #[error("{0}")]
    Diagnostics(Diagnostics),
    /// Configuration could not be loaded.
    #[error("error: config load failed: {0}")]
    Config(#[from] ConfigError),
    /// Client could not be assembled.
    #[error("error: client setup failed: {0}")]
    Client(#[from] ClientError),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Validate(args) => command_validate(&args),
        Commands::Create(args) => command_create(config_path, &args),
        Commands::Read(args) => command_read(config_path, &args),
        Commands::Update(args) => command_update(config_path, &args),
        Commands::Delete(args) => command_delete(config_path, &args),
        Commands::Import(args) => command_import(config_path, &args),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(config_path),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Validates a declaration locally.
fn command_validate(args: &DeclarationArgs) -> CliResult<ExitCode> {
    let planned = read_attribute_file(&args.declaration)?;
    let declaration = validate_attributes(&planned).map_err(CliError::Diagnostics)?;
    output_line(&format!(
        "declaration valid: {} {}",
        declaration.kind().as_str(),
        declaration.asset.asset_version
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Attaches a new policy.
fn command_create(config_path: Option<&Path>, args: &PlanArgs) -> CliResult<ExitCode> {
    let planned = read_attribute_file(&args.declaration)?;
    let resource = open_resource(config_path)?;
    let state = resource.create(&planned).map_err(CliError::Diagnostics)?;
    write_state(&args.state, &state)?;
    output_line(&format!("created policy {}", state_id(&state)))?;
    Ok(ExitCode::SUCCESS)
}

/// Refreshes stored state; removes the state file when the policy is gone.
fn command_read(config_path: Option<&Path>, args: &StateArgs) -> CliResult<ExitCode> {
    let state = read_attribute_file(&args.state)?;
    let resource = open_resource(config_path)?;
    match resource.read(&state).map_err(CliError::Diagnostics)? {
        Some(refreshed) => {
            write_state(&args.state, &refreshed)?;
            output_line(&format!("refreshed policy {}", state_id(&refreshed)))?;
        }
        None => {
            remove_state(&args.state)?;
            output_line("policy no longer exists; state removed")?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Applies a changed declaration.
fn command_update(config_path: Option<&Path>, args: &PlanArgs) -> CliResult<ExitCode> {
    let planned = read_attribute_file(&args.declaration)?;
    let state = read_attribute_file(&args.state)?;
    let resource = open_resource(config_path)?;
    let updated = resource.update(&state, &planned).map_err(CliError::Diagnostics)?;
    write_state(&args.state, &updated)?;
    output_line(&format!("updated policy {}", state_id(&updated)))?;
    Ok(ExitCode::SUCCESS)
}

/// Detaches a policy.
fn command_delete(config_path: Option<&Path>, args: &StateArgs) -> CliResult<ExitCode> {
    let state = read_attribute_file(&args.state)?;
    let resource = open_resource(config_path)?;
    resource.delete(&state).map_err(CliError::Diagnostics)?;
    remove_state(&args.state)?;
    output_line(&format!("deleted policy {}", state_id(&state)))?;
    Ok(ExitCode::SUCCESS)
}

/// Adopts an existing policy.
fn command_import(config_path: Option<&Path>, args: &ImportArgs) -> CliResult<ExitCode> {
    let resource = open_resource(config_path)?;
    let state = resource.import(&args.id).map_err(CliError::Diagnostics)?;
    write_state(&args.state, &state)?;
    output_line(&format!("imported policy {}", state_id(&state)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates configuration.
fn command_config_validate(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let _config = ApimPolicyConfig::load(config_path)?;
    output_line("config valid")?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads configuration and assembles the resource entry points.
fn open_resource(config_path: Option<&Path>) -> CliResult<HttpPolicyResource> {
    let config = ApimPolicyConfig::load(config_path)?;
    Ok(PolicyResource::new(connect(&config)?))
}

/// Returns the stored policy id for messages.
fn state_id(state: &AttributeBag) -> &str {
    state.get("id").and_then(Value::as_str).unwrap_or("<unknown>")
}

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads a TOML or JSON attribute file into a bag.
fn read_attribute_file(path: &Path) -> CliResult<AttributeBag> {
    let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::Message(format!("failed to read {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::Message(format!(
            "{} is {size} bytes, exceeding the {limit} byte limit",
            path.display()
        )),
    })?;
    let text = String::from_utf8(bytes)
        .map_err(|_| CliError::Message(format!("{} is not valid utf-8", path.display())))?;
    parse_attributes(&text, InputFormat::from_path(path))
        .map_err(|err| CliError::Message(format!("failed to parse {}: {err}", path.display())))
}

/// Parses attribute text in the given format.
fn parse_attributes(text: &str, format: InputFormat) -> Result<AttributeBag, String> {
    let map = match format {
        InputFormat::Toml => {
            toml::from_str::<Map<String, Value>>(text).map_err(|err| err.to_string())?
        }
        InputFormat::Json => {
            serde_json::from_str::<Map<String, Value>>(text).map_err(|err| err.to_string())?
        }
    };
    Ok(AttributeBag::from_map(map))
}

/// Writes state as pretty JSON.
fn write_state(path: &Path, state: &AttributeBag) -> CliResult<()> {
    let mut text = serde_json::to_string_pretty(state.as_map())
        .map_err(|err| CliError::Message(format!("failed to encode state: {err}")))?;
    text.push('\n');
    fs::write(path, text)
        .map_err(|err| CliError::Message(format!("failed to write {}: {err}", path.display())))
}

/// Removes a state file.
fn remove_state(path: &Path) -> CliResult<()> {
    fs::remove_file(path)
        .map_err(|err| CliError::Message(format!("failed to remove {}: {err}", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout, mapping failures to [`CliError`].
fn output_line(message: &str) -> CliResult<()> {
    write_stdout_line(message)
        .map_err(|err| CliError::Message(format!("failed to write to stdout: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
