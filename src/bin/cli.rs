//! MCP Workbench CLI
//!
//! Connects to the bridge through the store and prints state-derived views:
//! the tool catalog, discovered execution contexts and tool call results.

use clap::{Parser, Subcommand};
use console::style;
use mcp_workbench::config::{
    apply_env_overrides, config_path, load_config, load_config_from_path, validate_config,
    Config, LoggingConfig,
};
use mcp_workbench::mcp::StdioBridge;
use mcp_workbench::store::{AppState, FieldWidget, Intent, Store};
use mcp_workbench::{Error, Result, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mcp-workbench",
    author = "MCP Workbench Contributors",
    version = VERSION,
    about = "MCP Workbench - browse and invoke IDE tools over an MCP bridge",
    long_about = None
)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "MCP_WORKBENCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tools the bridge exposes
    Tools {
        /// Case-insensitive substring filter on name and description
        #[arg(long, short)]
        filter: Option<String>,
    },

    /// List the execution contexts found by the discovery tool
    Contexts,

    /// Invoke a tool and print its result
    Call {
        /// Tool name
        tool: String,
        /// Parameter as key=value, repeatable
        #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Print the effective configuration
    Config {
        /// Validate and report issues
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref())?;

    init_logging(&config.logging);
    debug!("Loaded configuration: {:?}", config);

    match cli.command {
        Commands::Tools { filter } => list_tools(&config, filter).await,
        Commands::Contexts => list_contexts(&config).await,
        Commands::Call { tool, params } => call_tool(&config, &tool, params).await,
        Commands::Config { validate } => show_config(&config, cli.config.as_ref(), validate),
    }
}

fn load(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = load_config_from_path(path)?;
            apply_env_overrides(&mut config);
            Ok(config)
        }
        None => load_config(),
    }
}

/// RUST_LOG wins over the configured level
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

// ============================================================================
// Store driving
// ============================================================================

/// Connection attempt finished and follow-up loading has drained
fn settled(state: &AppState) -> bool {
    let connection = &state.connection;
    if connection.status.is_connected() {
        !state.catalog.is_loading && !state.contexts.is_discovering
    } else {
        !connection.status.is_busy() && connection.last_error.is_some()
    }
}

/// Spawn a store, connect and wait for the catalog and contexts
async fn connect(config: &Config) -> Result<(Store, AppState)> {
    let bridge = Arc::new(StdioBridge::new(config.bridge.clone()));
    let store = Store::spawn(bridge, config.discovery.clone());

    store.dispatch(Intent::Connect)?;
    let state = store.wait_for(settled).await?;

    if !state.connection.status.is_connected() {
        let message = state.connection.last_error.clone().unwrap_or_default();
        store.shutdown().await;
        return Err(Error::Connect(message));
    }
    if let Some(ref message) = state.catalog.last_error {
        let message = message.clone();
        store.shutdown().await;
        return Err(Error::Transport(message));
    }

    if let Some(ref server) = state.connection.server_info {
        info!("Connected to {} {}", server.name, server.version);
    }

    Ok((store, state))
}

async fn disconnect(store: Store) -> Result<()> {
    store.dispatch(Intent::Disconnect)?;
    store.wait_for(|s| !s.connection.status.is_connected()).await?;
    store.shutdown().await;
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

async fn list_tools(config: &Config, filter: Option<String>) -> Result<ExitCode> {
    let (store, mut state) = connect(config).await?;

    if let Some(filter) = filter {
        store.dispatch(Intent::SetFilter(filter.clone()))?;
        state = store.wait_for(|s| s.catalog.filter_text == filter).await?;
    }

    let tools = state.catalog.filtered_tools();
    println!(
        "{} {} of {} tools",
        style("●").green(),
        tools.len(),
        state.catalog.tools.len()
    );
    for tool in tools {
        let summary = tool
            .description
            .as_deref()
            .and_then(|d| d.lines().next())
            .unwrap_or("");
        println!("  {}  {}", style(&tool.name).cyan().bold(), style(summary).dim());
    }

    disconnect(store).await?;
    Ok(ExitCode::SUCCESS)
}

async fn list_contexts(config: &Config) -> Result<ExitCode> {
    let (store, state) = connect(config).await?;

    let contexts = state.available_contexts();
    if contexts.is_empty() {
        println!("{} No execution contexts found", style("○").dim());
    }
    for context in contexts {
        println!("  {}", context.display_name());
        println!("     └─ {}", style(&context.location_path).dim());
    }

    disconnect(store).await?;
    Ok(ExitCode::SUCCESS)
}

async fn call_tool(config: &Config, name: &str, params: Vec<(String, String)>) -> Result<ExitCode> {
    let (store, state) = connect(config).await?;

    let Some(tool) = state.catalog.tool(name).cloned() else {
        disconnect(store).await?;
        return Err(Error::NotFound(format!("Tool '{}' is not exposed by the bridge", name)));
    };

    store.dispatch(Intent::Select(tool))?;
    let state = store
        .wait_for(|s| s.session.as_ref().map_or(false, |session| session.tool().name == name))
        .await?;

    for (key, value) in params {
        store.dispatch(Intent::SetParameter { key, value })?;
    }

    // Fresh discovery fills the context parameter when the user left it out
    let rounds = state.contexts.discoveries;
    store.dispatch(Intent::RefreshContexts)?;
    let state = store.wait_for(|s| s.contexts.discoveries > rounds).await?;

    if let Some(session) = state.session.as_ref() {
        for (field, widget) in session.field_widgets(&config.discovery.context_parameter) {
            let value = session.parameters.get(&field.key).map(String::as_str).unwrap_or("");
            if field.is_required && value.is_empty() {
                println!("{} missing required parameter {}", style("!").yellow(), field.key);
            }
            if let FieldWidget::Enumerated(options) = widget {
                if !value.is_empty() && !options.iter().any(|o| o == value) {
                    println!(
                        "{} {}={} is not one of {}",
                        style("!").yellow(),
                        field.key,
                        value,
                        options.join(", ")
                    );
                }
            }
        }
    }

    store.dispatch(Intent::Execute)?;
    let state = store
        .wait_for(|s| {
            s.session.as_ref().map_or(true, |session| {
                !session.is_executing() && (session.result.is_some() || session.error.is_some())
            })
        })
        .await?;

    let code = match state.session.as_ref() {
        Some(session) => {
            if let Some(text) = session.result_text() {
                println!("{}", text);
            }
            match session.error {
                Some(ref error) => {
                    eprintln!("{} {}", style("✗").red(), error);
                    ExitCode::FAILURE
                }
                None => ExitCode::SUCCESS,
            }
        }
        None => ExitCode::FAILURE,
    };

    disconnect(store).await?;
    Ok(code)
}

fn show_config(config: &Config, path: Option<&PathBuf>, validate: bool) -> Result<ExitCode> {
    let path = path.cloned().unwrap_or_else(config_path);
    println!("{} {}", style("#").dim(), style(path.display()).dim());
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| Error::Internal(format!("Failed to render config: {}", e)))?;
    println!("{}", rendered);

    if !validate {
        return Ok(ExitCode::SUCCESS);
    }

    let result = validate_config(config);
    for issue in &result.errors {
        println!("{} {}", style("✗").red(), issue);
    }
    for issue in &result.warnings {
        println!("{} {}", style("⚠").yellow(), issue);
    }

    if result.valid {
        println!("{} Configuration is valid", style("✓").green());
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
