// crates/octane-cli/src/main.rs
// ============================================================================
// Module: Octane CLI Entry Point
// Description: Command dispatcher for Octane profile, entity, and script tasks.
// Purpose: Expose the SDK from a shell using an octane.toml profile.
// Dependencies: clap, octane-config, octane-sdk, serde_json, thiserror, tracing.
// ============================================================================

//! ## Overview
//! The Octane CLI loads a connection profile, optionally overrides its scope
//! from flags, and runs one SDK operation per invocation. Results are written
//! to stdout as pretty JSON; diagnostics go to stderr and are filtered by the
//! `OCTANE_LOG` environment variable. Offline commands (`context`,
//! `config validate`) never contact the server.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use octane_config::OctaneConfig;
use octane_sdk::DEFAULT_PAGE_SIZE;
use octane_sdk::Octane;
use octane_sdk::OctaneConnection;
use octane_sdk::Query;
use octane_sdk::QueryValue;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "OCTANE_LOG";
/// Filter used when `OCTANE_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "octane", version, disable_help_subcommand = true)]
struct Cli {
    /// Profile path (defaults to `OCTANE_CONFIG`, then `octane.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Shared space override.
    #[arg(long, value_name = "ID", global = true)]
    shared_space: Option<String>,
    /// Workspace override.
    #[arg(long, value_name = "ID", global = true, conflicts_with = "all_workspaces")]
    workspace: Option<i64>,
    /// Targets every workspace of the shared space.
    #[arg(long, global = true)]
    all_workspaces: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the base URL selected by the profile and overrides.
    Context,
    /// Profile utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Entity collection utilities.
    Entities {
        /// Selected entities subcommand.
        #[command(subcommand)]
        command: EntitiesCommand,
    },
    /// Entity and field metadata.
    Metadata {
        /// Selected metadata subcommand.
        #[command(subcommand)]
        command: MetadataCommand,
    },
    /// Attachment utilities.
    Attachments {
        /// Selected attachments subcommand.
        #[command(subcommand)]
        command: AttachmentsCommand,
    },
    /// Manual test script utilities.
    Script {
        /// Selected script subcommand.
        #[command(subcommand)]
        command: ScriptCommand,
    },
}

/// Profile subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the profile, including credential variables.
    Validate,
}

/// Entity subcommands.
#[derive(Subcommand, Debug)]
enum EntitiesCommand {
    /// List entities of a collection.
    List(ListCommand),
    /// Fetch one entity by id.
    Get {
        /// Collection name, e.g. `defects`.
        entity: String,
        /// Entity id.
        id: String,
        /// Comma-separated fields to return.
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// Delete one entity by id.
    Delete {
        /// Collection name.
        entity: String,
        /// Entity id.
        id: String,
    },
}

/// Arguments for `entities list`.
#[derive(Args, Debug)]
struct ListCommand {
    /// Collection name, e.g. `defects`.
    entity: String,
    /// Comma-separated fields to return.
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,
    /// Equality filter `FIELD=VALUE`; repeated filters are combined with AND.
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,
    /// Sort field; append `:desc` for descending order.
    #[arg(long = "order-by", value_name = "FIELD[:desc]")]
    order_by: Vec<String>,
    /// Page size.
    #[arg(long)]
    limit: Option<u32>,
    /// Number of entities to skip.
    #[arg(long)]
    offset: Option<u32>,
    /// Follow paging until every matching entity is read.
    #[arg(long, conflicts_with_all = ["limit", "offset"])]
    all: bool,
}

/// Metadata subcommands.
#[derive(Subcommand, Debug)]
enum MetadataCommand {
    /// Describe entity types (all when none are named).
    Entities {
        /// Entity type names.
        names: Vec<String>,
    },
    /// Describe fields of entity types (all when none are named).
    Fields {
        /// Entity type names.
        entities: Vec<String>,
    },
}

/// Attachment subcommands.
#[derive(Subcommand, Debug)]
enum AttachmentsCommand {
    /// List attachments in scope.
    List {
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Download attachment content to a file.
    Download {
        /// Attachment id.
        id: String,
        /// Destination file.
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
}

/// Script subcommands.
#[derive(Subcommand, Debug)]
enum ScriptCommand {
    /// Print the script of a manual test.
    Show {
        /// Test id.
        test_id: String,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Rendered message.
    message: String,
}

impl CliError {
    /// Creates a new CLI error.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// Result alias for CLI operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Installs the stderr log subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parses arguments and dispatches the selected command.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Context => command_context(&config),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(&config),
        Commands::Entities {
            command,
        } => with_octane(&config, |octane| command_entities(octane, command)),
        Commands::Metadata {
            command,
        } => with_octane(&config, |octane| command_metadata(octane, command)),
        Commands::Attachments {
            command,
        } => with_octane(&config, |octane| command_attachments(octane, command)),
        Commands::Script {
            command,
        } => with_octane(&config, |octane| command_script(octane, command)),
    }
}

// ============================================================================
// SECTION: Profile Handling
// ============================================================================

/// Loads the profile and applies scope overrides from flags.
fn load_config(cli: &Cli) -> CliResult<OctaneConfig> {
    let mut config = OctaneConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load profile: {err}")))?;
    if let Some(shared_space) = &cli.shared_space {
        config.context.shared_space = Some(shared_space.clone());
        config.context.workspace = None;
        config.context.all_workspaces = false;
    }
    if let Some(workspace) = cli.workspace {
        config.context.workspace = Some(workspace);
        config.context.all_workspaces = false;
    }
    if cli.all_workspaces {
        config.context.workspace = None;
        config.context.all_workspaces = true;
    }
    config.validate().map_err(|err| CliError::new(format!("invalid scope override: {err}")))?;
    Ok(config)
}

/// Signs in, runs `action` against the configured context, and signs out.
fn with_octane<F>(config: &OctaneConfig, action: F) -> CliResult<ExitCode>
where
    F: FnOnce(&Octane) -> CliResult<ExitCode>,
{
    let authentication = config
        .authentication()
        .map_err(|err| CliError::new(format!("failed to resolve credentials: {err}")))?;
    let connection = OctaneConnection::connect(
        config.server_url(),
        authentication,
        config.http_client_config(),
    )
    .map_err(|err| CliError::new(format!("failed to connect: {err}")))?;
    let octane = config.context.apply(connection.builder()).build();
    tracing::debug!(base_url = octane.base_url(), "context ready");
    let result = action(&octane);
    if let Err(err) = connection.sign_out() {
        tracing::warn!(error = %err, "sign-out failed");
    }
    result
}

// ============================================================================
// SECTION: Offline Commands
// ============================================================================

/// Prints the base URL without contacting the server.
fn command_context(config: &OctaneConfig) -> CliResult<ExitCode> {
    write_line(&config.context.base_url(config.server_url()))?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves credential variables as a final validation step.
fn command_config_validate(config: &OctaneConfig) -> CliResult<ExitCode> {
    let authentication = config
        .authentication()
        .map_err(|err| CliError::new(format!("invalid profile: {err}")))?;
    write_line(&format!(
        "profile valid: {} as {}",
        config.server_url(),
        authentication.principal()
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Network Commands
// ============================================================================

/// Runs an entities subcommand.
fn command_entities(octane: &Octane, command: EntitiesCommand) -> CliResult<ExitCode> {
    match command {
        EntitiesCommand::List(list) => {
            let entities = octane.entity_list(&list.entity);
            let mut request = entities.get().add_fields(list.fields);
            if let Some(query) = build_query(&list.filters)? {
                request = request.query(query);
            }
            for order in &list.order_by {
                let (field, ascending) = parse_order(order)?;
                request = request.add_order_by(field, ascending);
            }
            if list.all {
                let all = request.execute_all(DEFAULT_PAGE_SIZE).map_err(sdk_error)?;
                return write_json(&all);
            }
            if let Some(limit) = list.limit {
                request = request.limit(limit);
            }
            if let Some(offset) = list.offset {
                request = request.offset(offset);
            }
            write_json(&request.execute().map_err(sdk_error)?)
        }
        EntitiesCommand::Get {
            entity,
            id,
            fields,
        } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let model = octane.entity_list(&entity).at(&id).get(&fields).map_err(sdk_error)?;
            write_json(&model)
        }
        EntitiesCommand::Delete {
            entity,
            id,
        } => {
            octane.entity_list(&entity).at(&id).delete().map_err(sdk_error)?;
            write_line(&format!("deleted {entity}/{id}"))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Runs a metadata subcommand.
fn command_metadata(octane: &Octane, command: MetadataCommand) -> CliResult<ExitCode> {
    match command {
        MetadataCommand::Entities {
            names,
        } => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            write_json(&octane.metadata().entities(&names).map_err(sdk_error)?)
        }
        MetadataCommand::Fields {
            entities,
        } => {
            let entities: Vec<&str> = entities.iter().map(String::as_str).collect();
            write_json(&octane.metadata().fields(&entities).map_err(sdk_error)?)
        }
    }
}

/// Runs an attachments subcommand.
fn command_attachments(octane: &Octane, command: AttachmentsCommand) -> CliResult<ExitCode> {
    match command {
        AttachmentsCommand::List {
            limit,
        } => {
            let attachments = octane.attachment_list();
            let mut request = attachments.get();
            if let Some(limit) = limit {
                request = request.limit(limit);
            }
            write_json(&request.execute().map_err(sdk_error)?)
        }
        AttachmentsCommand::Download {
            id,
            out,
        } => {
            let content = octane.attachment_list().at(&id).content().map_err(sdk_error)?;
            fs::write(&out, &content).map_err(|err| {
                CliError::new(format!("failed to write {}: {err}", out.display()))
            })?;
            write_line(&format!("wrote {} bytes to {}", content.len(), out.display()))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Runs a script subcommand.
fn command_script(octane: &Octane, command: ScriptCommand) -> CliResult<ExitCode> {
    match command {
        ScriptCommand::Show {
            test_id,
        } => {
            let script = octane.test_script(&test_id).get().map_err(sdk_error)?;
            write_line(&script.render())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

/// Combines `FIELD=VALUE` filters into one AND query.
///
/// Values that parse as integers or booleans are sent unquoted.
fn build_query(filters: &[String]) -> CliResult<Option<Query>> {
    let mut combined: Option<Query> = None;
    for filter in filters {
        let Some((field, value)) = filter.split_once('=') else {
            return Err(CliError::new(format!("filter must be FIELD=VALUE: {filter}")));
        };
        let field = field.trim();
        if field.is_empty() {
            return Err(CliError::new(format!("filter field is empty: {filter}")));
        }
        let statement = Query::equal_to(field, filter_value(value));
        combined = Some(match combined {
            Some(existing) => existing.and(statement),
            None => statement,
        });
    }
    Ok(combined)
}

/// Interprets a filter value literal.
fn filter_value(raw: &str) -> QueryValue {
    if let Ok(number) = raw.parse::<i64>() {
        return QueryValue::Integer(number);
    }
    match raw {
        "true" => QueryValue::Bool(true),
        "false" => QueryValue::Bool(false),
        "null" => QueryValue::Null,
        _ => QueryValue::String(raw.to_string()),
    }
}

/// Splits `FIELD[:asc|:desc]` into the field and direction.
fn parse_order(raw: &str) -> CliResult<(&str, bool)> {
    let (field, ascending) = match raw.split_once(':') {
        None => (raw, true),
        Some((field, "asc")) => (field, true),
        Some((field, "desc")) => (field, false),
        Some((_, direction)) => {
            return Err(CliError::new(format!("unknown sort direction: {direction}")));
        }
    };
    if field.is_empty() {
        return Err(CliError::new(format!("sort field is empty: {raw}")));
    }
    Ok((field, ascending))
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Formats an SDK error.
fn sdk_error(err: octane_sdk::OctaneError) -> CliError {
    CliError::new(format!("request failed: {err}"))
}

/// Writes a value to stdout as pretty JSON.
fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<ExitCode> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render output: {err}")))?;
    write_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

/// Writes a line to stdout, mapping failures to a CLI error.
fn write_line(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Formats a write failure for `stream`.
fn output_error(stream: &str, err: &std::io::Error) -> String {
    format!("failed to write {stream}: {err}")
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Reports an error on stderr and returns a failing exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
