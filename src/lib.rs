//! # fetlife-vault
//!
//! Keeps an [Obsidian](https://obsidian.md) vault of people pages in step
//! with a FetLife data export.
//!
//! Each person page carries its FetLife profile URL in the YAML
//! front-matter. A sync reads the export's blocked list and private notes,
//! finds the page for each user by that URL, and tags or annotates it.
//! Users without a page get one from the vault's people template. The same
//! export can also be flattened into a CSV or XLSX report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────┐
//! │ FetLife      │──▶│ Reconciler │──▶│ Obsidian     │
//! │ export (CSV) │   │ match+route│   │ vault (.md)  │
//! └──────┬───────┘   └────────────┘   └──────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  Merge   │──▶ CSV / XLSX report
//!   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fltool vault --vault ~/Notes sync --data-dir ~/export
//! fltool vault --vault ~/Notes list
//! fltool generate --data-dir ~/export --format both
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`vault`] | Vault loading, page front-matter, saving |
//! | [`records`] | Export file readers |
//! | [`matcher`] | Finding pages by user id |
//! | [`routing`] | Folder rules for new pages |
//! | [`template`] | Creating pages from the people template |
//! | [`sync`] | Applying the export to the vault |
//! | [`merge`] | One row per user for reports |
//! | [`report`] | CSV and XLSX output |
//! | [`xlsx`] | Minimal workbook writer and reader |
//! | [`list`] | Listing people pages |
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error`] | Typed errors |

pub mod config;
pub mod error;
pub mod list;
pub mod logging;
pub mod matcher;
pub mod merge;
pub mod records;
pub mod report;
pub mod routing;
pub mod sync;
pub mod template;
pub mod vault;
pub mod xlsx;
