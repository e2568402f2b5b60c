//! # CLI Layer
//!
//! One client of the attribute library. This is the **only** place that:
//! - knows about stdout, stderr and exit codes
//! - resolves default directories
//! - installs the tracing subscriber
//!
//! ## Structure
//!
//! - `run()`: parse, set up, dispatch (called by `main.rs`)
//! - `init_context()`: config, data directory, `AttributeManager<FsBackend>`
//! - `handle_*()`: one per subcommand, calling the API and printing

use super::render::{print_success, render_attribute, render_search_page};
use super::setup::{Cli, Commands, FlagArgs};
use clap::Parser;
use cmdb_attrs::api::{AttributeManager, AttributeQuery};
use cmdb_attrs::config::AttrsConfig;
use cmdb_attrs::error::{AttrError, Result};
use cmdb_attrs::model::{AttrId, AttributeUpdate, ChoiceValue, FlagsUpdate, NewAttribute, ValueType};
use cmdb_attrs::search_index::{FileIndex, SearchIndex, SearchIndexSync};
use cmdb_attrs::store::fs_backend::FsBackend;
use directories::ProjectDirs;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

const INDEX_FILENAME: &str = "search_index.json";

struct AppContext {
    manager: AttributeManager<FsBackend>,
    json: bool,
    color: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let ctx = init_context(&cli)?;

    match cli.command {
        Commands::Search {
            name,
            alias,
            page,
            page_size,
        } => handle_search(&ctx, name, alias, page, page_size),
        Commands::Get { key } => handle_get(&ctx, &key),
        Commands::Add {
            name,
            alias,
            value_type,
            choices,
            flags,
        } => handle_add(&ctx, name, alias, value_type, choices, flags),
        Commands::Update {
            id,
            name,
            alias,
            choices,
            flags,
        } => handle_update(&ctx, id, name, alias, choices, flags),
        Commands::Delete { id } => handle_delete(&ctx, id),
    }
}

/// Logs go to stderr. `RUST_LOG` wins; otherwise `-v` selects debug.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let dirs = ProjectDirs::from("org", "cmdb", "cmdb-attrs");

    let config_file = cli
        .config
        .clone()
        .or_else(|| dirs.as_ref().map(|d| d.config_dir().join("config.toml")));
    let config = AttrsConfig::load(config_file.as_deref())?;

    let data_dir: PathBuf = cli
        .data_dir
        .clone()
        .or_else(|| config.store.data_dir.clone())
        .or_else(|| dirs.as_ref().map(|d| d.data_dir().to_path_buf()))
        .ok_or_else(|| {
            AttrError::Config("could not determine a data directory; pass --data-dir".to_string())
        })?;
    debug!(data_dir = %data_dir.display(), "using data directory");

    let index: Arc<dyn SearchIndex> = Arc::new(FileIndex::new(data_dir.join(INDEX_FILENAME)));
    let index_sync = SearchIndexSync::from_config(&config.search_index, index);
    let manager = AttributeManager::new(FsBackend::new(data_dir)).with_index_sync(index_sync);

    Ok(AppContext {
        manager,
        json: cli.json,
        color: std::io::stdout().is_terminal(),
    })
}

fn handle_search(
    ctx: &AppContext,
    name: Option<String>,
    alias: Option<String>,
    page: usize,
    page_size: Option<usize>,
) -> Result<()> {
    let query = AttributeQuery {
        name,
        alias,
        page,
        page_size,
    };
    let result = ctx.manager.search(&query)?;
    if ctx.json {
        return print_json(&result);
    }
    print!("{}", render_search_page(&result, ctx.color));
    Ok(())
}

fn handle_get(ctx: &AppContext, key: &str) -> Result<()> {
    let view = ctx
        .manager
        .get_by_cache_key(key)?
        .ok_or_else(|| AttrError::NotFound(key.to_string()))?;
    if ctx.json {
        return print_json(&view);
    }
    print!("{}", render_attribute(&view, ctx.color));
    Ok(())
}

fn handle_add(
    ctx: &AppContext,
    name: String,
    alias: Option<String>,
    value_type: ValueType,
    choices: Vec<String>,
    flags: FlagArgs,
) -> Result<()> {
    let new = NewAttribute {
        name,
        alias,
        value_type,
        flags: flags.into(),
        choice_values: parse_choices(choices),
    };
    let display_name = new.name.clone();
    let id = ctx.manager.add(new)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "id": id }));
    }
    print_success(&format!("Attribute added ({}): {}", id, display_name));
    Ok(())
}

fn handle_update(
    ctx: &AppContext,
    id: AttrId,
    name: Option<String>,
    alias: Option<String>,
    choices: Vec<String>,
    flags: FlagArgs,
) -> Result<()> {
    let update = AttributeUpdate {
        name,
        alias,
        value_type: None,
        flags: FlagsUpdate::from(flags),
        choice_values: Some(parse_choices(choices)),
    };
    let id = ctx.manager.update(id, update)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "id": id }));
    }
    print_success(&format!("Attribute updated ({})", id));
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: AttrId) -> Result<()> {
    let name = ctx.manager.delete(id)?;
    if ctx.json {
        return print_json(&serde_json::json!({ "id": id, "name": name }));
    }
    print_success(&format!("Attribute deleted ({}): {}", id, name));
    Ok(())
}

/// Choice values arrive as text; the choice tables coerce them per value type.
fn parse_choices(raw: Vec<String>) -> Vec<ChoiceValue> {
    raw.into_iter().map(ChoiceValue::from).collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).map_err(AttrError::Serialization)?;
    println!("{}", out);
    Ok(())
}
