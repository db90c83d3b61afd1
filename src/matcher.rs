//! Finding the pages that belong to a FetLife user id.
//!
//! A page refers to a user when its `url`, or any of its `url-aliases`,
//! contains `/users/<id>` or ends with `/<id>`. This is a loose textual
//! test rather than URL parsing: id `5` also matches a URL ending in
//! `/users/55`, and id `45` matches `/users/456`. Callers handle multiple
//! matches by refusing to pick one.

use crate::vault::{Page, Vault};

/// Whether a single URL refers to `user_id`.
pub fn url_refers_to(url: &str, user_id: &str) -> bool {
    url.contains(&format!("/users/{}", user_id)) || url.ends_with(&format!("/{}", user_id))
}

/// Whether the page's URL or one of its URL aliases refers to `user_id`.
pub fn page_refers_to(page: &Page, user_id: &str) -> bool {
    url_refers_to(&page.url, user_id)
        || page
            .url_aliases
            .iter()
            .any(|alias| url_refers_to(alias, user_id))
}

/// Pages referring to `user_id`, in vault order.
pub fn find_by_user_id<'a>(vault: &'a Vault, user_id: &str) -> Vec<&'a Page> {
    vault
        .pages
        .iter()
        .filter(|page| page_refers_to(page, user_id))
        .collect()
}

/// Indices into [`Vault::pages`] of the pages referring to `user_id`.
pub fn find_indices_by_user_id(vault: &Vault, user_id: &str) -> Vec<usize> {
    vault
        .pages
        .iter()
        .enumerate()
        .filter(|(_, page)| page_refers_to(page, user_id))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, url: &str, aliases: &[&str]) -> Page {
        Page {
            title: title.to_string(),
            url: url.to_string(),
            url_aliases: aliases.iter().map(|a| a.to_string()).collect(),
            ..Page::default()
        }
    }

    fn vault_of(pages: Vec<Page>) -> Vault {
        let mut vault = Vault::new("/vault");
        vault.pages = pages;
        vault
    }

    #[test]
    fn matches_users_path_and_suffix() {
        assert!(url_refers_to("https://fetlife.com/users/12345", "12345"));
        assert!(url_refers_to("https://fetlife.com/users/12345/pictures", "12345"));
        assert!(url_refers_to("https://example.com/people/12345", "12345"));
        assert!(!url_refers_to("https://fetlife.com/users/12345", "99999"));
        assert!(!url_refers_to("", "12345"));
    }

    #[test]
    fn loose_match_accepts_numeric_collisions() {
        // Unanchored: "/users/45" is a prefix of "/users/456".
        assert!(url_refers_to("https://fetlife.com/users/456", "45"));
        assert!(url_refers_to("https://fetlife.com/users/45", "45"));
        assert!(!url_refers_to("https://fetlife.com/users/45", "5"));
        assert!(url_refers_to("https://fetlife.com/5", "5"));
    }

    #[test]
    fn aliases_are_checked() {
        let p = page("Emma", "", &["https://fetlife.com/emma", "https://fetlife.com/users/56789"]);
        assert!(page_refers_to(&p, "56789"));
        assert!(!page_refers_to(&p, "12345"));
    }

    #[test]
    fn finds_every_match_in_vault_order() {
        let vault = vault_of(vec![
            page("A", "https://fetlife.com/users/12345", &[]),
            page("B", "https://fetlife.com/users/23456", &[]),
            page("C", "", &["https://fetlife.com/users/12345"]),
        ]);

        let titles: Vec<&str> = find_by_user_id(&vault, "12345")
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert_eq!(find_indices_by_user_id(&vault, "12345"), vec![0, 2]);
        assert_eq!(find_indices_by_user_id(&vault, "23456"), vec![1]);
        assert!(find_by_user_id(&vault, "00000").is_empty());
    }

    #[test]
    fn page_with_url_and_alias_counts_once() {
        let vault = vault_of(vec![page(
            "A",
            "https://fetlife.com/users/12345",
            &["https://fetlife.com/users/12345/about"],
        )]);
        assert_eq!(find_indices_by_user_id(&vault, "12345"), vec![0]);
    }
}
