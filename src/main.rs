//! # fltool
//!
//! Command-line front end for `fetlife-vault`.
//!
//! ## Usage
//!
//! ```bash
//! fltool [--config ./fltool.toml] [--debug|--quiet] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fltool vault sync --data-dir <dir>` | Apply blocked users and private notes to the vault |
//! | `fltool vault list` | Print every page in the `People` folder |
//! | `fltool generate --data-dir <dir>` | Write the export as CSV and/or XLSX |
//! | `fltool version` | Print the version |
//!
//! ## Examples
//!
//! ```bash
//! # New people land in "People", or in "Bad People" when the note says so
//! fltool vault --vault ~/Notes sync --data-dir ~/fetlife-export \
//!     --in People --in "Bad People:creepy,stalker"
//!
//! # Spreadsheet of everyone in the export
//! fltool generate --data-dir ~/fetlife-export --format both
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use fetlife_vault::config::{self, Config};
use fetlife_vault::list;
use fetlife_vault::logging::{self, LogFormat, LogOptions};
use fetlife_vault::report::{self, GenerateOptions, ReportFormat};
use fetlife_vault::sync::{self, SyncOptions, TracingReporter};
use fetlife_vault::vault::ensure_vault_path;

/// Keep an Obsidian vault in step with a FetLife data export.
///
/// Settings are read from an optional TOML file (`--config`); flags
/// override it.
#[derive(Parser)]
#[command(name = "fltool", version)]
struct Cli {
    /// Path to configuration file (TOML). A missing default file is fine.
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log at debug level.
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors.
    #[arg(long, global = true)]
    quiet: bool,

    /// Log format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Auto)]
    output_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with an Obsidian vault.
    ///
    /// The path must contain the vault marker directory (`.obsidian`).
    Vault {
        /// Path to the vault root.
        #[arg(long, env = "VAULT_PATH", default_value = ".")]
        vault: PathBuf,

        #[command(subcommand)]
        action: VaultAction,
    },

    /// Generate spreadsheets from the export.
    ///
    /// Merges blocked users and private notes into one row per user.
    Generate {
        /// Directory containing blockeds.txt and private_notes.txt.
        #[arg(long, env = "DATA_DIR")]
        data_dir: PathBuf,

        /// Directory to write into. Must exist.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// File name without extension.
        #[arg(long)]
        basename: Option<String>,

        /// Which files to write.
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
    },

    /// Print the version.
    Version,
}

#[derive(Subcommand)]
enum VaultAction {
    /// Apply the export to the vault.
    ///
    /// Pages are matched to users by their profile URL. Blocked users get
    /// the blocked tag; private notes become the page's web message. Users
    /// without a page get one from the people template.
    Sync {
        /// Directory containing blockeds.txt and private_notes.txt.
        #[arg(long, env = "DATA_DIR")]
        data_dir: PathBuf,

        /// Folder rule for new people, `folder[:keyword1,keyword2,...]`.
        /// Repeatable; the first rule is the fallback.
        #[arg(long = "create-people-in", visible_alias = "in", value_name = "RULE")]
        create_people_in: Vec<String>,

        /// Folder for new pages of blocked users.
        #[arg(long)]
        create_blocked_in: Option<String>,
    },

    /// List the people pages.
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(LogOptions {
        debug: cli.debug,
        quiet: cli.quiet,
        format: cli.output_format,
    })?;

    if let Err(e) = run(cli) {
        tracing::error!(error = %format!("{:#}", e), "Program failed");
        return Err(e);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Vault { vault, action } => {
            ensure_vault_path(&vault, &cfg.vault.marker_dir)?;
            match action {
                VaultAction::Sync {
                    data_dir,
                    create_people_in,
                    create_blocked_in,
                } => {
                    let options = sync_options(&cfg, create_people_in, create_blocked_in)?;
                    sync::run_sync(&cfg, &vault, &data_dir, options, &TracingReporter)?;
                }
                VaultAction::List => {
                    list::run_list(&cfg, &vault)?;
                }
            }
        }
        Commands::Generate {
            data_dir,
            output_dir,
            basename,
            format,
        } => {
            let options = GenerateOptions {
                data_dir,
                output_dir: output_dir.unwrap_or_else(|| cfg.report.output_dir.clone()),
                basename: basename.unwrap_or_else(|| cfg.report.basename.clone()),
                format: format.unwrap_or(cfg.report.format),
            };
            report::run_generate(&cfg, &options)?;
        }
        Commands::Version => {}
    }

    Ok(())
}

/// Command-line folder settings override the config file and get the same
/// checks.
fn sync_options(
    cfg: &Config,
    create_people_in: Vec<String>,
    create_blocked_in: Option<String>,
) -> anyhow::Result<SyncOptions> {
    let mut options = SyncOptions::from_config(cfg);
    if !create_people_in.is_empty() {
        config::validate_folder_rules(&create_people_in, "--create-people-in")?;
        options.create_people_in = create_people_in;
    }
    if let Some(folder) = create_blocked_in {
        if folder.trim().is_empty() {
            anyhow::bail!("--create-blocked-in must not be empty");
        }
        options.create_blocked_in = folder;
    }
    Ok(options)
}
