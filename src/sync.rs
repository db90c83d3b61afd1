//! Reconciling the FetLife export with the vault.
//!
//! For each blocked user and each private note the engine looks up the
//! page whose URL refers to that user id:
//!
//! - no page: create one from the template (blocked users go to the
//!   blocked folder, noted users to the folder picked by
//!   [`route_user_with_match`]);
//! - one page: update it;
//! - several pages: skip the record and warn, touching nothing.
//!
//! Blocked users get the blocked tag and, if the page has no message yet,
//! a "Blocked on <date>" message. Private notes always replace the
//! message. Every touched page is saved immediately. A record that fails
//! is reported and the loop moves on; only loading the vault or reading
//! the export files aborts the run.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::path::Path;

use crate::config::Config;
use crate::matcher::find_indices_by_user_id;
use crate::records::{self, BlockedRecord, PrivateNoteRecord};
use crate::routing::route_user_with_match;
use crate::template::{create_page_in_folder, TemplateSettings};
use crate::vault::{ensure_vault_path, Vault, VaultOptions};

/// Which export stream a record came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordKind {
    Blocked,
    PrivateNote,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Blocked => "blocked",
            RecordKind::PrivateNote => "private_note",
        }
    }
}

/// Something that happened while reconciling a record.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// No page matched; a new one was created in `folder`.
    PageCreated {
        kind: RecordKind,
        user_id: String,
        page: String,
        folder: String,
    },
    /// A keyword in the private note chose the folder for a new page.
    Routed {
        user_id: String,
        folder: String,
        keyword: String,
    },
    /// The single matching page was updated and saved.
    PageUpdated {
        kind: RecordKind,
        user_id: String,
        page: String,
    },
    /// More than one page matched; nothing was changed.
    AmbiguousMatch {
        kind: RecordKind,
        user_id: String,
        match_count: usize,
    },
    /// Creating or saving the page failed.
    RecordFailed {
        kind: RecordKind,
        user_id: String,
        error: String,
    },
}

/// Receives sync events. The CLI logs them; tests record them.
pub trait SyncReporter {
    fn report(&self, event: SyncEvent);
}

/// Forwards events to `tracing`.
pub struct TracingReporter;

impl SyncReporter for TracingReporter {
    fn report(&self, event: SyncEvent) {
        match event {
            SyncEvent::PageCreated {
                kind,
                user_id,
                page,
                folder,
            } => tracing::info!(
                kind = kind.as_str(),
                user_id = %user_id,
                page = %page,
                folder = %folder,
                "Created page"
            ),
            SyncEvent::Routed {
                user_id,
                folder,
                keyword,
            } => tracing::info!(
                user_id = %user_id,
                folder = %folder,
                keyword = %keyword,
                "Matched keyword, placing in folder"
            ),
            SyncEvent::PageUpdated {
                kind,
                user_id,
                page,
            } => tracing::info!(
                kind = kind.as_str(),
                user_id = %user_id,
                page = %page,
                "Updated page"
            ),
            SyncEvent::AmbiguousMatch {
                kind,
                user_id,
                match_count,
            } => tracing::warn!(
                kind = kind.as_str(),
                user_id = %user_id,
                match_count,
                "Multiple pages found for user ID, skipping"
            ),
            SyncEvent::RecordFailed {
                kind,
                user_id,
                error,
            } => tracing::error!(
                kind = kind.as_str(),
                user_id = %user_id,
                error = %error,
                "Failed to process record"
            ),
        }
    }
}

/// Collects events in memory.
#[derive(Default)]
pub struct RecordingReporter {
    events: RefCell<Vec<SyncEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.borrow().clone()
    }
}

impl SyncReporter for RecordingReporter {
    fn report(&self, event: SyncEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Settings for one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Folder rules for people created from private notes.
    pub create_people_in: Vec<String>,
    /// Folder for people created from the blocked list.
    pub create_blocked_in: String,
    pub blocked_tag: String,
    pub template: TemplateSettings,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            create_people_in: config.sync.create_people_in.clone(),
            create_blocked_in: config.sync.create_blocked_in.clone(),
            blocked_tag: config.sync.blocked_tag.clone(),
            template: TemplateSettings {
                template: config.vault.template.clone(),
                profile_url_prefix: config.sync.profile_url_prefix.clone(),
            },
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What happened to one record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Created,
    Updated,
    Skipped,
}

/// Counters for a sync run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SyncSummary {
    pub blocked_read: usize,
    pub notes_read: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

/// Owns the vault for the duration of a sync and applies records to it.
pub struct SyncEngine<'r> {
    vault: Vault,
    options: SyncOptions,
    reporter: &'r dyn SyncReporter,
    summary: SyncSummary,
}

impl<'r> SyncEngine<'r> {
    pub fn new(vault: Vault, options: SyncOptions, reporter: &'r dyn SyncReporter) -> Self {
        Self {
            vault,
            options,
            reporter,
            summary: SyncSummary::default(),
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn summary(&self) -> &SyncSummary {
        &self.summary
    }

    pub fn into_parts(self) -> (Vault, SyncSummary) {
        (self.vault, self.summary)
    }

    /// Apply every blocked record, continuing past failures.
    pub fn sync_blocked(&mut self, records: &[BlockedRecord]) {
        self.summary.blocked_read += records.len();
        for record in records {
            match self.process_blocked(record) {
                Ok(outcome) => self.summary.record(outcome),
                Err(e) => self.fail(RecordKind::Blocked, &record.user_id, e),
            }
        }
    }

    /// Apply every private note, continuing past failures.
    pub fn sync_private_notes(&mut self, records: &[PrivateNoteRecord]) {
        self.summary.notes_read += records.len();
        for record in records {
            match self.process_private_note(record) {
                Ok(outcome) => self.summary.record(outcome),
                Err(e) => self.fail(RecordKind::PrivateNote, &record.member_id, e),
            }
        }
    }

    fn fail(&mut self, kind: RecordKind, user_id: &str, error: crate::error::VaultError) {
        self.summary.failed += 1;
        self.reporter.report(SyncEvent::RecordFailed {
            kind,
            user_id: user_id.to_string(),
            error: error.to_string(),
        });
    }

    /// Mark one user as blocked.
    pub fn process_blocked(&mut self, record: &BlockedRecord) -> crate::error::Result<Outcome> {
        let kind = RecordKind::Blocked;
        let folder = self.options.create_blocked_in.clone();
        let Some((idx, outcome)) =
            self.resolve_page(kind, &record.user_id, &record.nickname, &folder)?
        else {
            return Ok(Outcome::Skipped);
        };

        let page = &mut self.vault.pages[idx];
        page.add_tag(&self.options.blocked_tag);
        if page.web_message.is_empty() {
            page.web_message = format!("Blocked on {}", record.created_at);
        }
        page.save()?;

        self.report_saved(kind, &record.user_id, idx, outcome);
        Ok(outcome)
    }

    /// Store one private note as the page's message.
    pub fn process_private_note(
        &mut self,
        record: &PrivateNoteRecord,
    ) -> crate::error::Result<Outcome> {
        let kind = RecordKind::PrivateNote;
        let (folder, keyword) =
            route_user_with_match(&self.options.create_people_in, &record.private_note);
        let Some((idx, outcome)) = self.resolve_page(kind, &record.member_id, "", &folder)? else {
            return Ok(Outcome::Skipped);
        };
        if let (Outcome::Created, Some(keyword)) = (outcome, keyword) {
            self.reporter.report(SyncEvent::Routed {
                user_id: record.member_id.clone(),
                folder,
                keyword,
            });
        }

        let page = &mut self.vault.pages[idx];
        page.web_message = record.private_note.clone();
        page.save()?;

        self.report_saved(kind, &record.member_id, idx, outcome);
        Ok(outcome)
    }

    /// Find the page for `user_id`, creating it in `folder` when there is
    /// none. `None` means the match was ambiguous and the record is skipped.
    fn resolve_page(
        &mut self,
        kind: RecordKind,
        user_id: &str,
        nickname: &str,
        folder: &str,
    ) -> crate::error::Result<Option<(usize, Outcome)>> {
        let matches = find_indices_by_user_id(&self.vault, user_id);
        match matches.as_slice() {
            [] => {
                let idx = create_page_in_folder(
                    &mut self.vault,
                    user_id,
                    nickname,
                    folder,
                    &self.options.template,
                )?;
                Ok(Some((idx, Outcome::Created)))
            }
            [idx] => Ok(Some((*idx, Outcome::Updated))),
            _ => {
                self.reporter.report(SyncEvent::AmbiguousMatch {
                    kind,
                    user_id: user_id.to_string(),
                    match_count: matches.len(),
                });
                Ok(None)
            }
        }
    }

    fn report_saved(&self, kind: RecordKind, user_id: &str, idx: usize, outcome: Outcome) {
        let page = &self.vault.pages[idx];
        let event = match outcome {
            Outcome::Created => SyncEvent::PageCreated {
                kind,
                user_id: user_id.to_string(),
                page: page.title.clone(),
                folder: page.folder.clone(),
            },
            _ => SyncEvent::PageUpdated {
                kind,
                user_id: user_id.to_string(),
                page: page.title.clone(),
            },
        };
        self.reporter.report(event);
    }
}

/// Run `vault sync`: load the vault, read both export files, reconcile,
/// and print a summary.
pub fn run_sync(
    config: &Config,
    vault_path: &Path,
    data_dir: &Path,
    options: SyncOptions,
    reporter: &dyn SyncReporter,
) -> Result<SyncSummary> {
    tracing::info!(
        vault = %vault_path.display(),
        data_dir = %data_dir.display(),
        "Starting sync"
    );

    let summary = sync_vault(config, vault_path, data_dir, options, reporter)?;

    println!("sync {}", vault_path.display());
    println!("  blocked records: {}", summary.blocked_read);
    println!("  private notes: {}", summary.notes_read);
    println!("  pages created: {}", summary.created);
    println!("  pages updated: {}", summary.updated);
    println!("  skipped: {}", summary.skipped);
    println!("  failed: {}", summary.failed);
    println!("ok");

    tracing::info!("Sync completed");
    Ok(summary)
}

/// The reconciliation behind [`run_sync`], without printing.
pub fn sync_vault(
    config: &Config,
    vault_path: &Path,
    data_dir: &Path,
    options: SyncOptions,
    reporter: &dyn SyncReporter,
) -> Result<SyncSummary> {
    ensure_vault_path(vault_path, &config.vault.marker_dir)?;

    let vault = Vault::open(vault_path, VaultOptions::from(&config.vault))
        .with_context(|| format!("Failed to load vault: {}", vault_path.display()))?;
    tracing::info!(page_count = vault.pages.len(), "Loaded vault");

    let blockeds = records::read_blockeds(data_dir)
        .with_context(|| format!("Failed to read {}", records::BLOCKEDS_FILE))?;
    tracing::info!(blocked_count = blockeds.len(), "Loaded blockeds");

    let notes = records::read_private_notes(data_dir)
        .with_context(|| format!("Failed to read {}", records::PRIVATE_NOTES_FILE))?;
    tracing::info!(private_note_count = notes.len(), "Loaded private notes");

    let mut engine = SyncEngine::new(vault, options, reporter);
    engine.sync_blocked(&blockeds);
    engine.sync_private_notes(&notes);

    let (_, summary) = engine.into_parts();
    Ok(summary)
}
