//! TOML configuration.
//!
//! Every setting has a default, so the tool runs without a config file.
//! Command-line flags override whatever the file says.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::report::ReportFormat;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "./fltool.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    /// Subdirectory that marks a directory as a vault root.
    #[serde(default = "default_marker_dir")]
    pub marker_dir: String,
    /// Template for new people pages, relative to the vault root.
    #[serde(default = "default_template")]
    pub template: PathBuf,
    /// Extension of page files, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Keep front-matter keys this tool does not know about when saving.
    #[serde(default)]
    pub preserve_unknown_keys: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            marker_dir: default_marker_dir(),
            template: default_template(),
            extension: default_extension(),
            exclude_globs: Vec::new(),
            preserve_unknown_keys: false,
        }
    }
}

fn default_marker_dir() -> String {
    ".obsidian".to_string()
}
fn default_template() -> PathBuf {
    PathBuf::from("Templates").join("People.md")
}
fn default_extension() -> String {
    "md".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Folder rules, `folder[:keyword1,keyword2,...]`.
    #[serde(default = "default_create_people_in")]
    pub create_people_in: Vec<String>,
    #[serde(default = "default_create_blocked_in")]
    pub create_blocked_in: String,
    /// Profile URL prefix; the user id is appended directly after it.
    #[serde(default = "default_profile_url_prefix")]
    pub profile_url_prefix: String,
    #[serde(default = "default_blocked_tag")]
    pub blocked_tag: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            create_people_in: default_create_people_in(),
            create_blocked_in: default_create_blocked_in(),
            profile_url_prefix: default_profile_url_prefix(),
            blocked_tag: default_blocked_tag(),
        }
    }
}

fn default_create_people_in() -> Vec<String> {
    vec!["People".to_string()]
}
fn default_create_blocked_in() -> String {
    "Bad People".to_string()
}
fn default_profile_url_prefix() -> String {
    "https://fetlife.com/users/".to_string()
}
fn default_blocked_tag() -> String {
    "blocked".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_basename")]
    pub basename: String,
    #[serde(default)]
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            basename: default_basename(),
            format: ReportFormat::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_basename() -> String {
    "fetlife-export".to_string()
}

/// Load the configuration file.
///
/// A missing file at [`DEFAULT_CONFIG_PATH`] yields the defaults; a missing
/// file anywhere else was asked for explicitly and is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.vault.marker_dir.trim().is_empty() {
        bail!("vault.marker_dir must not be empty");
    }
    if config.vault.extension.trim().is_empty() {
        bail!("vault.extension must not be empty");
    }
    if config.sync.profile_url_prefix.is_empty() {
        bail!("sync.profile_url_prefix must not be empty");
    }
    if config.sync.blocked_tag.is_empty() {
        bail!("sync.blocked_tag must not be empty");
    }
    validate_folder_rules(&config.sync.create_people_in, "sync.create_people_in")?;
    Ok(())
}

/// Reject folder rules with an empty folder name. `source` names where the
/// rules came from in the error message.
pub fn validate_folder_rules(rules: &[String], source: &str) -> Result<()> {
    for rule in rules {
        if crate::routing::parse_folder_rule(rule).folder.trim().is_empty() {
            bail!("{} has a rule without a folder name: '{}'", source, rule);
        }
    }
    Ok(())
}
