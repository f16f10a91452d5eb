//! Command-line interface for sfdocs.
//!
//! Provides commands for fetching object metadata, inspecting the
//! persisted documents, and managing the index and checkpoint.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{DescribeClient, DirectoryClient, SalesforceClient};
use crate::config::{self, paths};
use crate::core::{FetchOptions, ObjectOutcome, ObjectStore, Orchestrator, ProgressTracker};
use crate::library::ObjectLookup;

/// sfdocs - Salesforce object schema documentation aggregator
#[derive(Parser, Debug)]
#[command(name = "sfdocs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output directory (or use SFDOCS_OUTPUT env; defaults to the config file)
    #[arg(short, long, global = true, env = "SFDOCS_OUTPUT")]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where describe results come from
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read saved describe results from a directory instead of the REST API
    #[arg(long)]
    pub from_dir: Option<PathBuf>,

    /// Org base URL (or use SF_INSTANCE_URL env)
    #[arg(long, env = "SF_INSTANCE_URL")]
    pub instance_url: Option<String>,

    /// OAuth access token (or use SF_ACCESS_TOKEN env)
    #[arg(long, env = "SF_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// REST API version, e.g. 60.0 (or use SF_API_VERSION env)
    #[arg(long, env = "SF_API_VERSION")]
    pub api_version: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Describe every object and merge the results into the output tree
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// Continue from the saved checkpoint
        #[arg(long)]
        resume: bool,

        /// Start at this catalog index, ignoring any checkpoint
        #[arg(long, conflicts_with = "resume")]
        start: Option<usize>,

        /// Objects described concurrently before pausing
        #[arg(long)]
        batch_size: Option<usize>,

        /// Pause between batches in milliseconds
        #[arg(long)]
        pause_ms: Option<u64>,

        /// Skip custom objects
        #[arg(long)]
        skip_custom: bool,

        /// Only these objects (names or glob patterns, comma-separated)
        #[arg(long, value_delimiter = ',')]
        objects: Vec<String>,
    },

    /// Describe a single object and merge it into the output tree
    Describe {
        /// Object API name
        object: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print a persisted object document as JSON
    Get {
        /// Object key or API name
        name: String,

        /// Only print the description
        #[arg(short, long)]
        description: bool,
    },

    /// Search object names (or descriptions) by substring or glob
    Search {
        /// Pattern; `*`, `?` and `[` make it a glob
        pattern: String,

        /// Match descriptions instead of names
        #[arg(short, long)]
        descriptions: bool,

        /// Maximum number of results to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Rebuild index.json from the object tree
    Index,

    /// Show or clear the fetch checkpoint
    Progress {
        /// Delete the checkpoint
        #[arg(long)]
        clear: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let output = self.output;
        match self.command {
            Commands::Fetch {
                source,
                resume,
                start,
                batch_size,
                pause_ms,
                skip_custom,
                objects,
            } => {
                let mut options = FetchOptions::from(&config::config()?.fetch);
                options.resume = resume;
                options.start_index = start;
                options.skip_custom |= skip_custom;
                if let Some(size) = batch_size {
                    options.batch_size = size;
                }
                if let Some(ms) = pause_ms {
                    options.batch_pause = Duration::from_millis(ms);
                }
                if !objects.is_empty() {
                    options.objects = objects;
                }
                fetch(output, &source, &options).await
            }
            Commands::Describe { object, source } => describe(output, &source, &object).await,
            Commands::Get { name, description } => get_object(output, &name, description).await,
            Commands::Search {
                pattern,
                descriptions,
                limit,
            } => search(output, &pattern, descriptions, limit).await,
            Commands::Index => rebuild_index(output).await,
            Commands::Progress { clear } => show_progress(output, clear).await,
            Commands::Config => show_config(output),
        }
    }
}

/// Output root from the flag or configuration
fn output_root(output: Option<PathBuf>) -> Result<PathBuf> {
    match output {
        Some(path) => Ok(path),
        None => config::output_dir(),
    }
}

/// Build the describe client for a command
fn build_client(source: &SourceArgs) -> Result<Arc<dyn DescribeClient>> {
    if let Some(dir) = &source.from_dir {
        return Ok(Arc::new(DirectoryClient::new(dir)));
    }

    let connection = &config::config()?.connection;
    let instance_url = source
        .instance_url
        .clone()
        .or_else(|| connection.instance_url.clone())
        .context("Missing instance URL. Set --instance-url, SF_INSTANCE_URL, or salesforce.instance_url in .sfdocs/config.yaml")?;
    let access_token = source
        .access_token
        .clone()
        .or_else(|| connection.access_token.clone())
        .context("Missing access token. Set --access-token or SF_ACCESS_TOKEN (e.g. from `sf org display`)")?;
    let api_version = source
        .api_version
        .clone()
        .unwrap_or_else(|| connection.api_version.clone());

    Ok(Arc::new(SalesforceClient::new(
        instance_url,
        access_token,
        api_version,
    )))
}

/// Run a bulk describe pass
async fn fetch(output: Option<PathBuf>, source: &SourceArgs, options: &FetchOptions) -> Result<()> {
    let root = output_root(output)?;
    let client = build_client(source)?;
    let orchestrator = Orchestrator::new(client, ObjectStore::new(&root));

    let report = orchestrator.run(options).await?;

    println!("Output: {}", root.display());
    println!(
        "Processed {} of {} objects (started at index {})",
        report.processed.len(),
        report.total,
        report.start_index
    );
    println!("  Created: {}", report.created);
    println!("  Updated: {}", report.updated);

    if !report.failed.is_empty() {
        println!("  Skipped: {}", report.failed.len());
        for failed in &report.failed {
            println!("    {:<40} {}", failed.name, failed.reason);
        }
    }

    Ok(())
}

/// Describe and merge one object
async fn describe(output: Option<PathBuf>, source: &SourceArgs, object: &str) -> Result<()> {
    let root = output_root(output)?;
    let client = build_client(source)?;
    let store = ObjectStore::new(&root);
    let orchestrator = Orchestrator::new(client, store.clone());

    let applied = orchestrator.process_object(object).await?;
    let path = store.object_path(&applied.document.name)?;

    let verb = match applied.outcome {
        ObjectOutcome::Created => "Created",
        ObjectOutcome::Updated => "Updated",
    };
    println!(
        "{} {} ({} fields): {}",
        verb,
        applied.document.name,
        applied.document.field_count(),
        path.display()
    );
    println!("Run `sfdocs index` to refresh index.json");

    Ok(())
}

/// Print one object
async fn get_object(output: Option<PathBuf>, name: &str, description_only: bool) -> Result<()> {
    let lookup = ObjectLookup::new(output_root(output)?);

    if description_only {
        let description = lookup
            .get_object_description(name)
            .await
            .with_context(|| format!("Object not found: {}", name))?;
        println!("{}", description);
        return Ok(());
    }

    let doc = lookup.get_object(name).await.with_context(|| {
        format!("Object not found: {}. Try `sfdocs search {}`", name, name)
    })?;
    println!("{}", serde_json::to_string_pretty(doc.as_ref())?);

    Ok(())
}

/// Search the index
async fn search(output: Option<PathBuf>, pattern: &str, descriptions: bool, limit: usize) -> Result<()> {
    let lookup = ObjectLookup::new(output_root(output)?);

    let names = if descriptions {
        lookup.search_objects_by_description(pattern).await
    } else {
        lookup.search_objects(pattern).await
    };

    if names.is_empty() {
        println!("No objects match '{}'", pattern);
        return Ok(());
    }

    let index = lookup.load_index().await?;
    println!("{:<45} {:>7}  DESCRIPTION", "OBJECT", "FIELDS");
    println!("{}", "-".repeat(100));

    for name in names.iter().take(limit) {
        let (fields, description) = index
            .get(name)
            .map(|e| (e.field_count, truncate(&e.description, 45)))
            .unwrap_or_default();
        println!("{:<45} {:>7}  {}", name, fields, description);
    }

    if names.len() > limit {
        println!("... and {} more", names.len() - limit);
    }

    Ok(())
}

/// Rebuild index.json
async fn rebuild_index(output: Option<PathBuf>) -> Result<()> {
    let store = ObjectStore::new(output_root(output)?);
    let index = store.rebuild_index().await?;
    println!(
        "Indexed {} objects: {}",
        index.total_objects,
        store.index_path().display()
    );
    Ok(())
}

/// Show or clear the checkpoint
async fn show_progress(output: Option<PathBuf>, clear: bool) -> Result<()> {
    let tracker = match output {
        Some(root) => ProgressTracker::for_root(&root),
        None => ProgressTracker::new(paths::default_progress_file()?),
    };

    if clear {
        tracker.clear().await?;
        println!("Checkpoint cleared: {}", tracker.path().display());
        return Ok(());
    }

    match tracker.load().await {
        Some(state) => {
            println!("Checkpoint: {}", tracker.path().display());
            println!(
                "  Last processed: {} (index {})",
                state.last_processed_object, state.last_processed_index
            );
            println!("  Progress:       {}/{}", state.processed_count, state.total_objects);
            println!("  Started:        {}", state.started_at);
            println!("  Updated:        {}", state.last_updated_at);
            println!("  Resume at:      {}", state.resume_index());
        }
        None => println!("No checkpoint"),
    }

    Ok(())
}

fn show_config(output: Option<PathBuf>) -> Result<()> {
    let cfg = config::config()?;
    let root = output.unwrap_or_else(|| cfg.output.clone());

    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Output:     {}", root.display());
    println!("  Objects:    {}", root.join(paths::OBJECTS_DIR).display());
    println!("  Index:      {}", paths::index_file(&root).display());
    println!("  Checkpoint: {}", paths::progress_file(&root).display());
    if root == cfg.output {
        println!("  (default index: {})", paths::default_index_file()?.display());
    }
    println!();
    println!("Salesforce:");
    println!(
        "  Instance URL: {}",
        cfg.connection.instance_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  Access token: {}",
        if cfg.connection.access_token.is_some() { "(set)" } else { "(not set)" }
    );
    println!("  API version:  {}", cfg.connection.api_version);
    println!();
    println!("Fetch:");
    println!("  Batch size:          {}", cfg.fetch.batch_size);
    println!("  Batch pause:         {}ms", cfg.fetch.batch_pause_ms);
    println!("  Checkpoint interval: {}", cfg.fetch.checkpoint_interval);
    println!("  Skip custom:         {}", cfg.fetch.skip_custom);
    if cfg.fetch.objects.is_empty() {
        println!("  Objects:             (all)");
    } else {
        println!("  Objects:             {}", cfg.fetch.objects.join(", "));
    }

    Ok(())
}

/// Truncate to a display width on a char boundary
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
