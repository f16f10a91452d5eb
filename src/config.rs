//! Configuration for sfdocs.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SFDOCS_OUTPUT, SF_INSTANCE_URL, SF_ACCESS_TOKEN, SF_API_VERSION)
//! 2. Config file (.sfdocs/config.yaml)
//! 3. Defaults (./sfdocs-data, API v60.0)
//!
//! Config file discovery:
//! - Searches current directory and parents for .sfdocs/config.yaml
//! - Paths in config file are relative to the project root (parent of .sfdocs/)

pub mod paths;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Default Salesforce REST API version
pub const DEFAULT_API_VERSION: &str = "60.0";

/// Default output directory name
const DEFAULT_OUTPUT_DIR: &str = "sfdocs-data";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    /// Output directory (relative to the project root)
    pub output: Option<String>,
    #[serde(default)]
    pub salesforce: Option<SalesforceConfig>,
    #[serde(default)]
    pub fetch: Option<FetchConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalesforceConfig {
    pub instance_url: Option<String>,
    pub access_token: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchConfig {
    pub batch_size: Option<usize>,
    pub batch_pause_ms: Option<u64>,
    pub checkpoint_interval: Option<usize>,
    pub skip_custom: Option<bool>,
    /// Object allow-list (names or glob patterns)
    #[serde(default)]
    pub objects: Vec<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Root of the persisted object tree
    pub output: PathBuf,
    /// Salesforce connection settings
    pub connection: ConnectionSettings,
    /// Bulk fetch settings
    pub fetch: FetchSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub instance_url: Option<String>,
    pub access_token: Option<String>,
    pub api_version: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            instance_url: None,
            access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub batch_size: usize,
    pub batch_pause_ms: u64,
    pub checkpoint_interval: usize,
    pub skip_custom: bool,
    pub objects: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_pause_ms: 1000,
            checkpoint_interval: 10,
            skip_custom: false,
            objects: Vec::new(),
        }
    }
}

impl FetchSettings {
    fn from_file(config: Option<&FetchConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };

        Self {
            batch_size: config.batch_size.unwrap_or(defaults.batch_size),
            batch_pause_ms: config.batch_pause_ms.unwrap_or(defaults.batch_pause_ms),
            checkpoint_interval: config
                .checkpoint_interval
                .unwrap_or(defaults.checkpoint_interval),
            skip_custom: config.skip_custom.unwrap_or(defaults.skip_custom),
            objects: config.objects.clone(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".sfdocs").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Expand a leading `~/` to the user's home directory
fn expand_home(path_str: &str) -> PathBuf {
    match (path_str.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path_str),
    }
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = expand_home(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_file = find_config_file();

    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    // Project root is the parent of .sfdocs/
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.clone());

    let output = if let Some(env_output) = env_var("SFDOCS_OUTPUT") {
        expand_home(&env_output)
    } else if let Some(ref out) = file.as_ref().and_then(|f| f.output.clone()) {
        resolve_path(&base_dir, out)
    } else {
        cwd.join(DEFAULT_OUTPUT_DIR)
    };

    let sf = file
        .as_ref()
        .and_then(|f| f.salesforce.clone())
        .unwrap_or_default();

    let connection = ConnectionSettings {
        instance_url: env_var("SF_INSTANCE_URL").or(sf.instance_url),
        access_token: env_var("SF_ACCESS_TOKEN").or(sf.access_token),
        api_version: env_var("SF_API_VERSION")
            .or(sf.api_version)
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
    };

    let fetch = FetchSettings::from_file(file.as_ref().and_then(|f| f.fetch.as_ref()));

    Ok(ResolvedConfig {
        output,
        connection,
        fetch,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the output directory.
pub fn output_dir() -> Result<PathBuf> {
    Ok(config()?.output.clone())
}
