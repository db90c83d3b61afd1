//! Combining blocked users and private notes into one row per user.

use std::collections::BTreeMap;

use crate::records::{BlockedRecord, PrivateNoteRecord};

/// Everything the export says about one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedUser {
    pub user_id: String,
    /// Only known for blocked users.
    pub nickname: String,
    pub url: String,
    pub blocked: bool,
    pub blocked_at: String,
    pub private_note: String,
    pub note_created: String,
    pub note_updated: String,
}

impl MergedUser {
    fn new(user_id: &str, profile_url_prefix: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            url: format!("{}{}", profile_url_prefix, user_id),
            ..Self::default()
        }
    }

    fn apply_note(&mut self, note: &PrivateNoteRecord) {
        self.private_note = note.private_note.clone();
        self.note_created = note.created_at.clone();
        self.note_updated = note.updated_at.clone();
    }
}

/// Merge both streams keyed by user id.
///
/// Blocked records seed the map. A note for a known id fills in the note
/// columns of that entry; a note for an unknown id adds an unblocked entry
/// with only note columns set. When an id repeats within one stream the
/// later record wins. Iteration order is by user id, compared as text.
pub fn merge_user_data(
    blockeds: &[BlockedRecord],
    notes: &[PrivateNoteRecord],
    profile_url_prefix: &str,
) -> BTreeMap<String, MergedUser> {
    let mut users: BTreeMap<String, MergedUser> = BTreeMap::new();

    for blocked in blockeds {
        let user = MergedUser {
            nickname: blocked.nickname.clone(),
            blocked: true,
            blocked_at: blocked.created_at.clone(),
            ..MergedUser::new(&blocked.user_id, profile_url_prefix)
        };
        users.insert(blocked.user_id.clone(), user);
    }

    for note in notes {
        users
            .entry(note.member_id.clone())
            .or_insert_with(|| MergedUser::new(&note.member_id, profile_url_prefix))
            .apply_note(note);
    }

    users
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://fetlife.com/users/";

    fn blocked(id: &str, nick: &str, at: &str) -> BlockedRecord {
        BlockedRecord {
            user_id: id.into(),
            created_at: at.into(),
            updated_at: at.into(),
            nickname: nick.into(),
        }
    }

    fn note(id: &str, text: &str, at: &str) -> PrivateNoteRecord {
        PrivateNoteRecord {
            member_id: id.into(),
            created_at: at.into(),
            updated_at: format!("{}T12:00", at),
            private_note: text.into(),
        }
    }

    #[test]
    fn blocked_only() {
        let users = merge_user_data(
            &[blocked("123", "BadUser", "2024-01-01"), blocked("456", "AnotherBad", "2024-01-02")],
            &[],
            PREFIX,
        );
        assert_eq!(users.len(), 2);
        for user in users.values() {
            assert!(user.blocked);
            assert!(!user.nickname.is_empty());
            assert!(!user.blocked_at.is_empty());
            assert!(user.private_note.is_empty());
        }
        assert_eq!(users["123"].url, "https://fetlife.com/users/123");
    }

    #[test]
    fn notes_only() {
        let users = merge_user_data(
            &[],
            &[note("789", "Nice person", "2024-01-01"), note("101", "Met at event", "2024-01-02")],
            PREFIX,
        );
        assert_eq!(users.len(), 2);
        let user = &users["101"];
        assert!(!user.blocked);
        assert!(user.nickname.is_empty());
        assert!(user.blocked_at.is_empty());
        assert_eq!(user.private_note, "Met at event");
        assert_eq!(user.note_created, "2024-01-02");
        assert_eq!(user.note_updated, "2024-01-02T12:00");
    }

    #[test]
    fn disjoint_ids_give_one_row_each() {
        let users = merge_user_data(
            &[blocked("1", "A", "d"), blocked("2", "B", "d"), blocked("3", "C", "d")],
            &[note("4", "x", "d"), note("5", "y", "d")],
            PREFIX,
        );
        assert_eq!(users.len(), 5);
        assert!(users["2"].note_created.is_empty());
        assert!(users["5"].nickname.is_empty());
    }

    #[test]
    fn shared_id_merges_into_one_row() {
        let users = merge_user_data(
            &[blocked("123", "BlockedUser", "2024-01-01")],
            &[note("123", "This person is creepy", "2024-01-02")],
            PREFIX,
        );
        assert_eq!(users.len(), 1);
        let user = &users["123"];
        assert_eq!(
            *user,
            MergedUser {
                user_id: "123".into(),
                nickname: "BlockedUser".into(),
                url: "https://fetlife.com/users/123".into(),
                blocked: true,
                blocked_at: "2024-01-01".into(),
                private_note: "This person is creepy".into(),
                note_created: "2024-01-02".into(),
                note_updated: "2024-01-02T12:00".into(),
            }
        );
    }

    #[test]
    fn rows_are_ordered_by_id() {
        let users = merge_user_data(
            &[blocked("333", "C", "d"), blocked("111", "A", "d")],
            &[note("222", "x", "d"), note("111", "y", "d")],
            PREFIX,
        );
        let ids: Vec<&str> = users.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["111", "222", "333"]);
    }

    #[test]
    fn custom_prefix_builds_url() {
        let users = merge_user_data(&[], &[note("9", "x", "d")], "https://example.org/u/");
        assert_eq!(users["9"].url, "https://example.org/u/9");
    }

    #[test]
    fn empty_inputs_give_empty_map() {
        assert!(merge_user_data(&[], &[], PREFIX).is_empty());
    }
}
