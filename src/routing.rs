//! Choosing the folder for a newly created person page.
//!
//! Folder rules have the form `folder[:keyword1,keyword2,...]`. Keywords
//! are matched case-insensitively as substrings of the private note. The
//! first rule (in configured order) with a matching keyword wins; if none
//! matches, the first rule's folder is used regardless of its keywords.

/// Folder used when no rules are configured at all.
pub const DEFAULT_PEOPLE_FOLDER: &str = "People";

/// A parsed folder rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRule {
    /// Folder name relative to the vault root, verbatim.
    pub folder: String,
    /// Lowercased keywords; `None` when the rule has none.
    pub keywords: Option<Vec<String>>,
}

/// Parse `folder[:keyword1,keyword2,...]`.
///
/// Keywords are trimmed and lowercased and empty ones are dropped, so
/// `"Folder:"` and `"Folder: , "` parse the same as `"Folder"`.
pub fn parse_folder_rule(config: &str) -> FolderRule {
    let (folder, keywords) = match config.split_once(':') {
        Some((folder, rest)) => {
            let keywords: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_lowercase)
                .collect();
            (folder, (!keywords.is_empty()).then_some(keywords))
        }
        None => (config, None),
    };

    FolderRule {
        folder: folder.to_string(),
        keywords,
    }
}

/// Pick the folder for a person whose private note is `note`.
pub fn route_user(rules: &[String], note: &str) -> String {
    route_user_with_match(rules, note).0
}

/// Like [`route_user`], also returning the keyword that decided the route.
pub fn route_user_with_match(rules: &[String], note: &str) -> (String, Option<String>) {
    let Some(first) = rules.first() else {
        return (DEFAULT_PEOPLE_FOLDER.to_string(), None);
    };

    if !note.is_empty() {
        let lower_note = note.to_lowercase();
        for rule in rules.iter().map(|r| parse_folder_rule(r)) {
            let Some(keywords) = rule.keywords else {
                continue;
            };
            if let Some(keyword) = keywords.into_iter().find(|k| lower_note.contains(k.as_str())) {
                return (rule.folder, Some(keyword));
            }
        }
    }

    (parse_folder_rule(first).folder, None)
}
