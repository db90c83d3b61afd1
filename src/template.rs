//! Creating new person pages from the vault's people template.

use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};
use crate::vault::Vault;

/// Placeholder replaced with the page name.
pub const TITLE_PLACEHOLDER: &str = "{{title}}";

/// Where the template lives and how profile URLs are formed.
#[derive(Debug, Clone)]
pub struct TemplateSettings {
    /// Template path relative to the vault root.
    pub template: PathBuf,
    pub profile_url_prefix: String,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        let config = crate::config::Config::default();
        Self {
            template: config.vault.template,
            profile_url_prefix: config.sync.profile_url_prefix,
        }
    }
}

/// Template used when the vault has none. The URL is left at the bare
/// prefix so the id substitution fills it in.
pub fn default_template(profile_url_prefix: &str) -> String {
    format!(
        "---\ntags:\n  - person\nurl: {}\n---\n\n# Notes\n",
        profile_url_prefix
    )
}

/// Page name for a user: the nickname, or `user-<id>` without one.
pub fn page_name(user_id: &str, nickname: &str) -> String {
    if nickname.is_empty() {
        format!("user-{}", user_id)
    } else {
        nickname.to_string()
    }
}

/// Fill in a template for one user.
///
/// `{{title}}` becomes the page name and the literal `url: <prefix>` gains
/// the user id right after the prefix. A template whose URL line does not
/// start with exactly that text is left unchanged.
pub fn render_template(template: &str, page_name: &str, user_id: &str, profile_url_prefix: &str) -> String {
    let content = template.replace(TITLE_PLACEHOLDER, page_name);
    let url_line = format!("url: {}", profile_url_prefix);
    content.replace(&url_line, &format!("{}{}", url_line, user_id))
}

/// Create `<folder>/<page name>.md` for a user, add it to the vault, and
/// return its index in [`Vault::pages`].
///
/// The folder is created if needed. An existing file at the target path
/// is overwritten. The returned page is read back from disk, so it holds
/// exactly what was written.
pub fn create_page_in_folder(
    vault: &mut Vault,
    user_id: &str,
    nickname: &str,
    folder: &str,
    settings: &TemplateSettings,
) -> Result<usize> {
    let name = page_name(user_id, nickname);

    let folder_path = vault.path.join(folder);
    std::fs::create_dir_all(&folder_path).map_err(|e| VaultError::io(&folder_path, e))?;

    let file_path = folder_path.join(format!("{}.{}", name, vault.options().extension));
    if file_path.exists() {
        tracing::warn!(
            page = %name,
            path = %file_path.display(),
            "Page file already exists without a matching URL, overwriting"
        );
    }

    let template = read_template(&vault.path, &settings.template, &settings.profile_url_prefix);
    let content = render_template(&template, &name, user_id, &settings.profile_url_prefix);
    std::fs::write(&file_path, content).map_err(|e| VaultError::io(&file_path, e))?;

    let page = vault.load_page(&file_path)?;
    let idx = vault.add_page(page);

    tracing::info!(
        page = %name,
        path = %file_path.display(),
        folder,
        "Created new page from template"
    );

    Ok(idx)
}

fn read_template(vault_path: &Path, template: &Path, profile_url_prefix: &str) -> String {
    let path = vault_path.join(template);
    match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Template not found, using default"
            );
            default_template(profile_url_prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{load_page, VaultOptions};
    use tempfile::TempDir;

    const TEMPLATE: &str = "---\ntags:\n  - person\nurl: https://fetlife.com/users/\n---\n\n# {{title}}\n";

    fn vault_with_template(template: Option<&str>) -> (TempDir, Vault) {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".obsidian")).unwrap();
        if let Some(t) = template {
            std::fs::create_dir_all(tmp.path().join("Templates")).unwrap();
            std::fs::write(tmp.path().join("Templates").join("People.md"), t).unwrap();
        }
        let vault = Vault::open(tmp.path(), VaultOptions::default()).unwrap();
        (tmp, vault)
    }

    #[test]
    fn nickname_names_the_page() {
        let (tmp, mut vault) = vault_with_template(Some(TEMPLATE));
        let before = vault.pages.len();

        let idx = create_page_in_folder(&mut vault, "12345", "TestUser", "People", &TemplateSettings::default())
            .unwrap();

        let page = &vault.pages[idx];
        assert_eq!(vault.pages.len(), before + 1);
        assert_eq!(page.title, "TestUser");
        assert_eq!(page.folder, "People");
        assert_eq!(page.url, "https://fetlife.com/users/12345");
        assert_eq!(page.tags, vec!["person"]);
        assert_eq!(page.content, "\n# TestUser\n");
        assert_eq!(page.file_path, tmp.path().join("People").join("TestUser.md"));
    }

    #[test]
    fn missing_nickname_uses_user_id() {
        let (_tmp, mut vault) = vault_with_template(Some(TEMPLATE));
        let idx = create_page_in_folder(&mut vault, "99999", "", "People", &TemplateSettings::default())
            .unwrap();
        assert_eq!(vault.pages[idx].title, "user-99999");
    }

    #[test]
    fn nested_folder_is_created() {
        let (tmp, mut vault) = vault_with_template(Some(TEMPLATE));
        create_page_in_folder(&mut vault, "1", "Nick", "Contacts/Bad People", &TemplateSettings::default())
            .unwrap();
        let path = tmp.path().join("Contacts").join("Bad People").join("Nick.md");
        assert!(path.exists());
        let page = load_page(&path, tmp.path()).unwrap();
        assert_eq!(page.folder, Path::new("Contacts").join("Bad People").to_string_lossy());
    }

    #[test]
    fn missing_template_falls_back_to_default() {
        let (tmp, mut vault) = vault_with_template(None);
        let idx = create_page_in_folder(&mut vault, "12345", "", "People", &TemplateSettings::default())
            .unwrap();

        let raw = std::fs::read_to_string(tmp.path().join("People").join("user-12345.md")).unwrap();
        assert!(raw.contains("tags:"));
        assert!(raw.contains("person"));
        assert!(raw.contains("url: https://fetlife.com/users/12345\n"));

        let page = &vault.pages[idx];
        assert_eq!(page.tags, vec!["person"]);
        assert_eq!(page.url, "https://fetlife.com/users/12345");
    }

    #[test]
    fn template_with_other_prefix_is_left_alone() {
        let rendered = render_template(
            "---\nurl: http://fetlife.com/users/\n---\n",
            "x",
            "42",
            "https://fetlife.com/users/",
        );
        assert_eq!(rendered, "---\nurl: http://fetlife.com/users/\n---\n");
    }

    #[test]
    fn every_title_placeholder_is_replaced() {
        let rendered = render_template("{{title}} / {{title}}", "Bob", "1", "https://x/");
        assert_eq!(rendered, "Bob / Bob");
    }

    #[test]
    fn custom_prefix_and_template_path() {
        let (tmp, mut vault) = vault_with_template(None);
        std::fs::create_dir_all(tmp.path().join("_tpl")).unwrap();
        std::fs::write(
            tmp.path().join("_tpl").join("person.md"),
            "---\nurl: https://example.org/u/\n---\n# {{title}}\n",
        )
        .unwrap();
        let settings = TemplateSettings {
            template: PathBuf::from("_tpl/person.md"),
            profile_url_prefix: "https://example.org/u/".to_string(),
        };

        let idx = create_page_in_folder(&mut vault, "7", "Seven", "People", &settings).unwrap();
        assert_eq!(vault.pages[idx].url, "https://example.org/u/7");
        assert_eq!(vault.pages[idx].content, "# Seven\n");
    }
}
