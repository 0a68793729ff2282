use std::path::PathBuf;

use clap::Parser;

use crate::convert::{ConversionConfig, Direction};
use crate::error::ConfigError;
use crate::migrate::MigrationOptions;

#[derive(Debug, Parser)]
#[command(
    name = "roll-relocate",
    version,
    about = "Rewrite the film roll folders stored in a photo library database",
    long_about = "Rewrite the film roll folders stored in a photo library database.\n\n\
                  Use this after moving the image library to a new directory, or to a \
                  machine with the other path syntax. Folders starting with --from get \
                  that prefix replaced by --to; --to-windows / --to-unix then rewrite \
                  every separator."
)]
pub struct Cli {
    /// Library database file (e.g. ~/.config/darktable/library.db).
    pub library: PathBuf,

    /// Folder prefix to replace, in the original path syntax.
    #[arg(short = 'f', long = "from", value_name = "PREFIX")]
    pub prefix_from: Option<String>,

    /// Replacement prefix, in the new path syntax.
    #[arg(short = 't', long = "to", value_name = "PREFIX")]
    pub prefix_to: Option<String>,

    /// Convert Unix folders to Windows ('/' becomes '\').
    #[arg(long, conflicts_with = "to_unix")]
    pub to_windows: bool,

    /// Convert Windows folders to Unix ('\' becomes '/').
    #[arg(long)]
    pub to_unix: bool,

    /// Print scan counts and every migrated folder.
    #[arg(short, long)]
    pub verbose: bool,

    /// Show what would change without writing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Apply all updates in one transaction (all or nothing).
    #[arg(long)]
    pub atomic: bool,

    /// Back up the library next to itself before writing.
    #[arg(long)]
    pub backup: bool,

    /// Write a JSON report of the migrated folders.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl Cli {
    pub fn direction(&self) -> Direction {
        if self.to_windows {
            Direction::UnixToWindows
        } else if self.to_unix {
            Direction::WindowsToUnix
        } else {
            Direction::None
        }
    }

    /// Validated conversion settings from the prefix and direction flags.
    pub fn conversion_config(&self) -> Result<ConversionConfig, ConfigError> {
        ConversionConfig::new(
            self.prefix_from.clone(),
            self.prefix_to.clone(),
            self.direction(),
        )
    }

    pub fn migration_options(&self) -> MigrationOptions {
        MigrationOptions {
            dry_run: self.dry_run,
            atomic: self.atomic,
            backup: self.backup,
            report: self.report.clone(),
        }
    }
}
