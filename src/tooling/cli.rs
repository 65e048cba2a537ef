//! CLI Tooling
//!
//! Command-line interface for one-shot synchronization, watch mode, store
//! inspection and configuration management.

use crate::config::{ConfigLoader, SyncConfig};
use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::logging::LoggingConfig;
use crate::session::SyncSession;
use crate::store::{MemoryStore, SledStore};
use crate::tree::{CollectionNode, ItemNode};
use crate::types::{CollectionId, Parent};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Notesync CLI - keep a note store in sync with a directory tree
#[derive(Parser)]
#[command(name = "notesync")]
#[command(about = "Synchronize a hierarchical note store with a plain directory tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory to synchronize (overrides the configured base path)
    #[arg(long)]
    pub base_path: Option<PathBuf>,

    /// Never write to the directory tree
    #[arg(long)]
    pub read_only: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Discover every collection and item and record them in the store
    Sync {
        /// Scan only; do not touch the persistent store
        #[arg(long)]
        dry_run: bool,
    },
    /// Keep the store synchronized until interrupted
    Watch,
    /// Show the collections and items held in the store
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Interactively choose the base path and read-only mode
    Configure,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Logging configuration with the command-line overrides applied
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }
}

/// CLI context holding the effective configuration
pub struct CliContext {
    config: SyncConfig,
    config_path: Option<PathBuf>,
}

impl CliContext {
    /// Load configuration and apply command-line overrides
    pub fn new(
        config_path: Option<PathBuf>,
        base_path: Option<PathBuf>,
        read_only: bool,
    ) -> Result<Self, SyncError> {
        let mut config = ConfigLoader::load_with_override(config_path.as_deref())?;
        if let Some(base_path) = base_path {
            config.base_path = base_path;
        }
        if read_only {
            config.read_only = true;
        }
        Ok(Self::from_config(config, config_path))
    }

    pub fn from_config(config: SyncConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, SyncError> {
        match command {
            Commands::Sync { dry_run } => self.handle_sync(*dry_run),
            Commands::Watch => self.handle_watch(),
            Commands::Status { format } => self.handle_status(format),
            Commands::Config { command } => match command {
                ConfigCommands::Show => self.handle_config_show(),
                ConfigCommands::Init { force } => self.handle_config_init(*force),
            },
            Commands::Configure => self.handle_configure(),
        }
    }

    fn store_path(&self) -> Result<PathBuf, SyncError> {
        self.config
            .storage
            .resolve_store_path(&self.config.resolved_base_path())
    }

    fn settings_path(&self) -> Result<PathBuf, SyncError> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => ConfigLoader::default_config_path(),
        }
    }

    fn handle_sync(&self, dry_run: bool) -> Result<String, SyncError> {
        if dry_run {
            let mut engine = SyncEngine::detached(self.config.clone(), MemoryStore::new())?;
            engine.full_resync();
            return Ok(format!(
                "Dry run: {} collections, {} items under {}",
                engine.hierarchy().collection_count(),
                engine.hierarchy().item_count(),
                engine.base_path().display()
            ));
        }

        let store_path = self.store_path()?;
        let store = SledStore::open(&store_path)?;
        let mut engine = SyncEngine::detached(self.config.clone(), store)?;
        engine.full_resync();
        engine.store().flush()?;
        info!(store = %store_path.display(), "Synchronization complete");
        Ok(format!(
            "Synchronized {} collections, {} items\nStore: {}",
            engine.hierarchy().collection_count(),
            engine.hierarchy().item_count(),
            store_path.display()
        ))
    }

    fn handle_watch(&self) -> Result<String, SyncError> {
        let store = SledStore::open(&self.store_path()?)?;
        let session = SyncSession::start(self.config.clone(), store)?;
        session.synchronize()?;
        eprintln!(
            "{} {} (Ctrl-C to stop)",
            "Watching".bold(),
            self.config.resolved_base_path().display()
        );
        session.wait();
        Ok("Watch stopped".to_string())
    }

    fn handle_status(&self, format: &str) -> Result<String, SyncError> {
        let store_path = self.store_path()?;
        let store = SledStore::open(&store_path)?;
        let collections = store.list_collections()?;
        let items = store.list_items()?;
        let paths = collection_paths(&collections);

        if format == "json" {
            let collections_json: Vec<serde_json::Value> = collections
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id.to_string(),
                        "name": c.name,
                        "path": paths.get(&c.id).map(|p| p.display().to_string()),
                        "read_only": c.rights.is_read_only(),
                    })
                })
                .collect();
            let items_json: Vec<serde_json::Value> = items
                .iter()
                .map(|i| {
                    json!({
                        "id": i.id.to_string(),
                        "path": item_path(&paths, i).map(|p| p.display().to_string()),
                        "modified": i.modified.map(|m| m.to_rfc3339()),
                    })
                })
                .collect();
            let out = json!({
                "store": store_path.display().to_string(),
                "collections": collections_json,
                "items": items_json,
            });
            return serde_json::to_string_pretty(&out)
                .map_err(|e| SyncError::StorageError(e.to_string()));
        }
        if format != "text" {
            return Err(SyncError::ConfigError(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                format
            )));
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Kind", "Id", "Path", "Modified"]);
        for collection in &collections {
            let path = paths
                .get(&collection.id)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec!["collection".to_string(), collection.id.to_string(), path, "-".to_string()]);
        }
        for item in &items {
            let path = item_path(&paths, item)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            let modified = item
                .modified
                .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec!["item".to_string(), item.id.to_string(), path, modified]);
        }

        Ok(format!(
            "{}\n  Store: {}\n  Collections: {}\n  Items: {}\n\n{}",
            "Store Status".bold().underline(),
            store_path.display(),
            collections.len(),
            items.len(),
            table
        ))
    }

    fn handle_config_show(&self) -> Result<String, SyncError> {
        toml::to_string_pretty(&self.config)
            .map_err(|e| SyncError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    fn handle_config_init(&self, force: bool) -> Result<String, SyncError> {
        let path = self.settings_path()?;
        if path.exists() && !force {
            return Err(SyncError::ConfigError(format!(
                "Configuration file {} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        ConfigLoader::save(&self.config, &path)?;
        Ok(format!("Configuration written to {}", path.display()))
    }

    fn handle_configure(&self) -> Result<String, SyncError> {
        use dialoguer::{Confirm, Input};

        let current = self.config.base_path.display().to_string();
        let base_path: String = Input::new()
            .with_prompt("Directory to synchronize")
            .with_initial_text(current)
            .validate_with(|input: &String| check_base_path(Path::new(input.trim())))
            .interact_text()
            .map_err(|e| SyncError::ConfigError(format!("Failed to get user input: {}", e)))?;

        let read_only = Confirm::new()
            .with_prompt("Open the directory read-only?")
            .default(self.config.read_only)
            .interact()
            .map_err(|e| SyncError::ConfigError(format!("Failed to get user input: {}", e)))?;

        let mut config = self.config.clone();
        config.base_path = PathBuf::from(base_path.trim());
        config.read_only = read_only;
        config.validate()?;

        let path = self.settings_path()?;
        ConfigLoader::save(&config, &path)?;

        let mut out = format!("{} {}", "Saved".green(), path.display());
        if config.read_only && !read_only {
            out.push_str(&format!(
                "\n{} the directory is not writable, read-only mode was enabled",
                "Note:".yellow()
            ));
        }
        Ok(out)
    }
}

/// Validation used by the interactive prompt
pub fn check_base_path(path: &Path) -> Result<(), String> {
    if path.as_os_str().is_empty() {
        return Err("The selected path is empty.".to_string());
    }
    if path.exists() && !path.is_dir() {
        return Err(format!("The selected path '{}' is not a directory.", path.display()));
    }
    Ok(())
}

/// Directory path of each stored collection, computed from parent links
fn collection_paths(collections: &[CollectionNode]) -> BTreeMap<CollectionId, PathBuf> {
    let by_id: BTreeMap<CollectionId, &CollectionNode> =
        collections.iter().map(|c| (c.id, c)).collect();
    let mut out = BTreeMap::new();
    for collection in collections {
        let mut segments = Vec::new();
        let mut current = Some(collection);
        while let Some(node) = current {
            segments.push(node.remote_id.as_str());
            if segments.len() > collections.len() {
                break;
            }
            current = match node.parent {
                Parent::Root => None,
                Parent::Collection(parent) => by_id.get(&parent).copied(),
            };
        }
        let path: PathBuf = segments.into_iter().rev().collect();
        out.insert(collection.id, path);
    }
    out
}

fn item_path(paths: &BTreeMap<CollectionId, PathBuf>, item: &ItemNode) -> Option<PathBuf> {
    paths.get(&item.parent).map(|p| p.join(&item.remote_id))
}
