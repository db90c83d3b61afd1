//! Obsidian vault loading and page front-matter handling.
//!
//! A [`Vault`] is an in-memory snapshot of every page under a root
//! directory. Pages are markdown files with an optional YAML front-matter
//! block:
//!
//! ```text
//! ---
//! tags:
//! - person
//! url: https://fetlife.com/users/12345
//! ---
//! # Notes
//! ```
//!
//! Only six keys are understood (`tags`, `aliases`, `url`, `url-aliases`,
//! `web-badge-color`, `web-message`). A recognized key holding a value of
//! the wrong shape reads as empty. Saving rebuilds the block from the
//! current field values, so empty fields disappear and, unless the vault
//! was opened with `preserve_unknown_keys`, so do keys this module does
//! not know.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};

const DELIMITER: &str = "---";

/// Options controlling how a vault is scanned and how its pages are saved.
#[derive(Debug, Clone)]
pub struct VaultOptions {
    pub marker_dir: String,
    pub extension: String,
    pub exclude_globs: Vec<String>,
    pub preserve_unknown_keys: bool,
}

impl Default for VaultOptions {
    fn default() -> Self {
        VaultOptions::from(&VaultConfig::default())
    }
}

impl From<&VaultConfig> for VaultOptions {
    fn from(config: &VaultConfig) -> Self {
        Self {
            marker_dir: config.marker_dir.clone(),
            extension: config.extension.clone(),
            exclude_globs: config.exclude_globs.clone(),
            preserve_unknown_keys: config.preserve_unknown_keys,
        }
    }
}

#[derive(Debug)]
pub struct Vault {
    pub path: PathBuf,
    /// Every page found by the last [`Vault::load`], plus pages added since.
    /// No two pages share a `file_path`.
    pub pages: Vec<Page>,
    options: VaultOptions,
}

/// A single markdown page and its decoded front-matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// File name without the extension.
    pub title: String,
    /// Directory relative to the vault root; `.` for the root itself.
    pub folder: String,
    pub tags: Vec<String>,
    pub aliases: Vec<String>,
    /// Canonical profile URL.
    pub url: String,
    pub url_aliases: Vec<String>,
    /// HTML color code shown as a badge by the browser plugin. Not validated.
    pub web_badge_color: String,
    /// Message the browser plugin displays on the profile.
    pub web_message: String,
    pub file_path: PathBuf,
    /// Markdown after the front-matter block, byte for byte.
    pub content: String,
    /// Unrecognized front-matter keys. Only populated when the vault keeps them.
    pub extra: Mapping,
}

const KEY_TAGS: &str = "tags";
const KEY_ALIASES: &str = "aliases";
const KEY_URL: &str = "url";
const KEY_URL_ALIASES: &str = "url-aliases";
const KEY_WEB_BADGE_COLOR: &str = "web-badge-color";
const KEY_WEB_MESSAGE: &str = "web-message";

/// A sequence of strings; anything else reads as empty and non-string
/// entries are skipped.
fn lenient_list(value: Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// A string scalar; anything else (numbers, lists, null, tagged values)
/// reads as empty.
fn lenient_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        _ => String::new(),
    }
}

fn insert_list(mapping: &mut Mapping, key: &str, items: &[String]) {
    if !items.is_empty() {
        mapping.insert(Value::from(key), Value::from(items.to_vec()));
    }
}

fn insert_string(mapping: &mut Mapping, key: &str, value: &str) {
    if !value.is_empty() {
        mapping.insert(Value::from(key), Value::from(value));
    }
}

impl Vault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, VaultOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: VaultOptions) -> Self {
        Self {
            path: path.into(),
            pages: Vec::new(),
            options,
        }
    }

    /// Create and load a vault in one step.
    pub fn open(path: impl Into<PathBuf>, options: VaultOptions) -> Result<Self> {
        let mut vault = Self::with_options(path, options);
        vault.load()?;
        Ok(vault)
    }

    pub fn options(&self) -> &VaultOptions {
        &self.options
    }

    /// Walk the vault root and load every page into [`Vault::pages`].
    ///
    /// Directories, files with another extension, and files matching an
    /// exclude glob are skipped. Walk order is whatever the filesystem
    /// returns. Pages from an earlier load are discarded.
    pub fn load(&mut self) -> Result<()> {
        let exclude_set = build_globset(&self.options.exclude_globs)?;
        self.pages.clear();

        for entry in WalkDir::new(&self.path) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if !has_extension(path, &self.options.extension) {
                continue;
            }

            let relative = path.strip_prefix(&self.path).unwrap_or(path);
            if exclude_set.is_match(relative) {
                continue;
            }

            let page = read_page(
                path,
                &self.path,
                &self.options.extension,
                self.options.preserve_unknown_keys,
            )?;
            self.pages.push(page);
        }

        Ok(())
    }

    /// Load a single page with this vault's settings, without adding it.
    pub fn load_page(&self, file_path: &Path) -> Result<Page> {
        read_page(
            file_path,
            &self.path,
            &self.options.extension,
            self.options.preserve_unknown_keys,
        )
    }

    /// Add a page created after the initial load and return its index.
    /// A page already held for the same file is replaced in place.
    pub fn add_page(&mut self, page: Page) -> usize {
        if let Some(idx) = self.pages.iter().position(|p| p.file_path == page.file_path) {
            self.pages[idx] = page;
            return idx;
        }
        self.pages.push(page);
        self.pages.len() - 1
    }

    /// Pages directly in `folder`. An empty string means the vault root.
    pub fn in_folder(&self, folder: &str) -> Vec<&Page> {
        let folder = if folder.is_empty() { "." } else { folder };
        self.pages.iter().filter(|p| p.folder == folder).collect()
    }

    /// Pages carrying `tag`, compared case-sensitively.
    pub fn with_tag(&self, tag: &str) -> Vec<&Page> {
        self.pages.iter().filter(|p| p.has_tag(tag)).collect()
    }
}

impl Page {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Append `tag` unless it is already present. Returns whether it was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Render the page as file content: front-matter (if any field is set)
    /// followed by the body.
    pub fn to_markdown(&self) -> Result<String> {
        let mut front_matter = Mapping::new();
        insert_list(&mut front_matter, KEY_TAGS, &self.tags);
        insert_list(&mut front_matter, KEY_ALIASES, &self.aliases);
        insert_string(&mut front_matter, KEY_URL, &self.url);
        insert_list(&mut front_matter, KEY_URL_ALIASES, &self.url_aliases);
        insert_string(&mut front_matter, KEY_WEB_BADGE_COLOR, &self.web_badge_color);
        insert_string(&mut front_matter, KEY_WEB_MESSAGE, &self.web_message);
        for (key, value) in &self.extra {
            front_matter.insert(key.clone(), value.clone());
        }

        let mut out = String::new();
        if !front_matter.is_empty() {
            let yaml = serde_yaml::to_string(&front_matter).map_err(|source| {
                VaultError::Serialize {
                    path: self.file_path.clone(),
                    source,
                }
            })?;
            out.push_str(DELIMITER);
            out.push('\n');
            out.push_str(&yaml);
            if !yaml.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(DELIMITER);
            out.push('\n');
        }
        out.push_str(&self.content);
        Ok(out)
    }

    /// Write the page back to [`Page::file_path`].
    pub fn save(&self) -> Result<()> {
        let rendered = self.to_markdown()?;
        std::fs::write(&self.file_path, rendered).map_err(|e| VaultError::io(&self.file_path, e))
    }
}

/// Load one page from disk, dropping unrecognized front-matter keys.
pub fn load_page(file_path: &Path, vault_path: &Path) -> Result<Page> {
    let extension = file_path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    read_page(file_path, vault_path, &extension, false)
}

fn read_page(
    file_path: &Path,
    vault_path: &Path,
    extension: &str,
    keep_extra: bool,
) -> Result<Page> {
    let raw = std::fs::read_to_string(file_path).map_err(|e| VaultError::io(file_path, e))?;
    let mut page = parse_page(&raw, file_path)?;
    if !keep_extra {
        page.extra.clear();
    }

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = format!(".{}", extension);
    page.title = file_name
        .strip_suffix(suffix.as_str())
        .unwrap_or(&file_name)
        .to_string();

    let relative = file_path.strip_prefix(vault_path).unwrap_or(file_path);
    page.folder = match relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().to_string(),
        _ => ".".to_string(),
    };
    page.file_path = file_path.to_path_buf();

    Ok(page)
}

/// Decode raw file content into a page. Title and folder are left empty.
fn parse_page(raw: &str, file_path: &Path) -> Result<Page> {
    let Some((block, body)) = split_front_matter(raw) else {
        return Ok(Page {
            content: raw.to_string(),
            ..Page::default()
        });
    };

    let mapping = if block.trim().is_empty() {
        Mapping::new()
    } else {
        let value: Value = serde_yaml::from_str(block).map_err(|source| VaultError::FrontMatter {
            path: file_path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            other => serde_yaml::from_value(other).map_err(|source| VaultError::FrontMatter {
                path: file_path.to_path_buf(),
                source,
            })?,
        }
    };

    let mut page = Page {
        content: body.to_string(),
        ..Page::default()
    };
    for (key, value) in mapping {
        match key.as_str() {
            Some(KEY_TAGS) => page.tags = lenient_list(value),
            Some(KEY_ALIASES) => page.aliases = lenient_list(value),
            Some(KEY_URL) => page.url = lenient_string(value),
            Some(KEY_URL_ALIASES) => page.url_aliases = lenient_list(value),
            Some(KEY_WEB_BADGE_COLOR) => page.web_badge_color = lenient_string(value),
            Some(KEY_WEB_MESSAGE) => page.web_message = lenient_string(value),
            _ => {
                page.extra.insert(key, value);
            }
        }
    }
    Ok(page)
}

/// Split content into (front-matter block, body).
///
/// Returns `None` when the content does not open with a `---` line or the
/// block is never closed; the whole content is then body.
fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---\n")?;

    if let Some(body) = rest.strip_prefix("---\n") {
        return Some(("", body));
    }
    if rest == DELIMITER {
        return Some(("", ""));
    }
    if let Some(idx) = rest.find("\n---\n") {
        return Some((&rest[..idx + 1], &rest[idx + 5..]));
    }
    if let Some(block) = rest.strip_suffix(DELIMITER) {
        if block.ends_with('\n') {
            return Some((block, ""));
        }
    }
    None
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == extension)
        .unwrap_or(false)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// A directory is a vault root when it holds the marker directory.
pub fn is_vault_path(path: &Path, marker_dir: &str) -> bool {
    std::fs::metadata(path.join(marker_dir))
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Like [`is_vault_path`], but returns a descriptive error.
pub fn ensure_vault_path(path: &Path, marker_dir: &str) -> Result<()> {
    if is_vault_path(path, marker_dir) {
        Ok(())
    } else {
        Err(VaultError::NotAVault {
            path: path.to_path_buf(),
            marker: marker_dir.to_string(),
        })
    }
}
