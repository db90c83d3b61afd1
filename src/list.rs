//! `vault list`: print the people pages.

use anyhow::{Context, Result};
use std::fmt::Write;
use std::path::Path;

use crate::config::Config;
use crate::routing::DEFAULT_PEOPLE_FOLDER;
use crate::vault::{ensure_vault_path, Page, Vault, VaultOptions};

/// Render one page the way `vault list` shows it. Empty fields are left out.
pub fn describe_page(page: &Page) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Person: {}", page.title);
    let _ = writeln!(out, "  Folder: {}", page.folder);
    if !page.url.is_empty() {
        let _ = writeln!(out, "  URL: {}", page.url);
    }
    if !page.aliases.is_empty() {
        let _ = writeln!(out, "  Aliases: {}", page.aliases.join(", "));
    }
    if !page.url_aliases.is_empty() {
        let _ = writeln!(out, "  URL Aliases: {}", page.url_aliases.join(", "));
    }
    if !page.web_badge_color.is_empty() {
        let _ = writeln!(out, "  Web Badge Color: {}", page.web_badge_color);
    }
    if !page.web_message.is_empty() {
        let _ = writeln!(out, "  Web Message: {}", page.web_message);
    }
    out
}

/// Pages in the people folder, sorted by title.
pub fn people(vault: &Vault) -> Vec<&Page> {
    let mut pages = vault.in_folder(DEFAULT_PEOPLE_FOLDER);
    pages.sort_by(|a, b| a.title.cmp(&b.title));
    pages
}

/// Run `vault list`. Returns the number of people printed.
pub fn run_list(config: &Config, vault_path: &Path) -> Result<usize> {
    ensure_vault_path(vault_path, &config.vault.marker_dir)?;

    let vault = Vault::open(vault_path, VaultOptions::from(&config.vault))
        .with_context(|| format!("Failed to load vault: {}", vault_path.display()))?;
    tracing::info!(page_count = vault.pages.len(), "Loaded vault");

    let people = people(&vault);
    for page in &people {
        print!("{}", describe_page(page));
    }
    Ok(people.len())
}
