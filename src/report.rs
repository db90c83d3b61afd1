//! `generate`: merged spreadsheets from the FetLife export.
//!
//! Reads both export files, merges them per user (see [`crate::merge`])
//! and writes `<basename>.csv`, `<basename>.xlsx`, or both into the output
//! directory. Rows are ordered by user id.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::merge::{merge_user_data, MergedUser};
use crate::records;
use crate::xlsx::{self, Column};

/// Sheet name used in the XLSX output.
pub const SHEET_NAME: &str = "FetLife Data";

/// Report columns and their XLSX widths.
pub const COLUMNS: [Column<'static>; 8] = [
    Column { header: "User ID", width: 12.0 },
    Column { header: "Nickname", width: 20.0 },
    Column { header: "URL", width: 35.0 },
    Column { header: "Blocked", width: 10.0 },
    Column { header: "Blocked At", width: 20.0 },
    Column { header: "Private Note", width: 50.0 },
    Column { header: "Note Created", width: 20.0 },
    Column { header: "Note Updated", width: 20.0 },
];

/// Which files `generate` writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Xlsx,
    Both,
}

impl ReportFormat {
    pub fn wants_csv(self) -> bool {
        matches!(self, ReportFormat::Csv | ReportFormat::Both)
    }

    pub fn wants_xlsx(self) -> bool {
        matches!(self, ReportFormat::Xlsx | ReportFormat::Both)
    }
}

/// Settings for one `generate` run, after CLI flags are applied.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub basename: String,
    pub format: ReportFormat,
}

/// Files written by a `generate` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResult {
    pub user_count: usize,
    pub csv_path: Option<PathBuf>,
    pub xlsx_path: Option<PathBuf>,
}

fn row(user: &MergedUser) -> [&str; 8] {
    [
        user.user_id.as_str(),
        user.nickname.as_str(),
        user.url.as_str(),
        if user.blocked { "Yes" } else { "No" },
        user.blocked_at.as_str(),
        user.private_note.as_str(),
        user.note_created.as_str(),
        user.note_updated.as_str(),
    ]
}

/// Write the merged users as CSV with a header row.
pub fn write_csv(path: &Path, users: &BTreeMap<String, MergedUser>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(COLUMNS.iter().map(|c| c.header))?;
    for user in users.values() {
        writer.write_record(row(user))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the merged users as a single-sheet workbook.
pub fn write_xlsx(path: &Path, users: &BTreeMap<String, MergedUser>) -> Result<()> {
    let rows: Vec<Vec<String>> = users
        .values()
        .map(|user| row(user).iter().map(|v| v.to_string()).collect())
        .collect();
    xlsx::write_workbook(path, SHEET_NAME, &COLUMNS, &rows)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Run `generate` and print what was written.
pub fn run_generate(config: &Config, options: &GenerateOptions) -> Result<GenerateResult> {
    tracing::info!(
        data_dir = %options.data_dir.display(),
        output_dir = %options.output_dir.display(),
        "Starting spreadsheet generation"
    );

    if !options.output_dir.is_dir() {
        bail!(
            "output directory does not exist: {}",
            options.output_dir.display()
        );
    }

    let blockeds = records::read_blockeds(&options.data_dir)
        .with_context(|| format!("Failed to read {}", records::BLOCKEDS_FILE))?;
    tracing::info!(blocked_count = blockeds.len(), "Loaded blocked users");

    let notes = records::read_private_notes(&options.data_dir)
        .with_context(|| format!("Failed to read {}", records::PRIVATE_NOTES_FILE))?;
    tracing::info!(private_note_count = notes.len(), "Loaded private notes");

    let users = merge_user_data(&blockeds, &notes, &config.sync.profile_url_prefix);
    tracing::info!(total_users = users.len(), "Merged user data");

    let mut result = GenerateResult {
        user_count: users.len(),
        ..GenerateResult::default()
    };

    if options.format.wants_csv() {
        let path = options.output_dir.join(format!("{}.csv", options.basename));
        write_csv(&path, &users)?;
        tracing::info!(path = %path.display(), "Generated CSV file");
        result.csv_path = Some(path);
    }

    if options.format.wants_xlsx() {
        let path = options.output_dir.join(format!("{}.xlsx", options.basename));
        write_xlsx(&path, &users)?;
        tracing::info!(path = %path.display(), "Generated XLSX file");
        result.xlsx_path = Some(path);
    }

    println!("generate {}", options.data_dir.display());
    println!("  users: {}", result.user_count);
    for path in result.csv_path.iter().chain(result.xlsx_path.iter()) {
        println!("  wrote: {}", path.display());
    }
    println!("ok");

    Ok(result)
}
