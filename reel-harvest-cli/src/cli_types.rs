use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "reel-harvest")]
#[command(about = "Harvest streaming catalogs into a checkpoint and app database", long_about = None)]
pub(crate) struct Cli {
    /// Checkpoint file (defaults to the settings value)
    #[arg(long, global = true)]
    pub checkpoint: Option<PathBuf>,

    /// Site strategy: namakade or farsiplex
    #[arg(long, global = true)]
    pub site: Option<String>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show debug output with timestamps
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Worker counts accepted on the command line.
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (1..=reel_harvest_scraper::MAX_WORKERS).contains(&n) {
        Ok(n)
    } else {
        Err(format!(
            "workers must be between 1 and {}",
            reel_harvest_scraper::MAX_WORKERS
        ))
    }
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Walk the site's listing pages and add new items to the checkpoint
    Discover {
        /// Listing pages to scan per category
        #[arg(long, default_value_t = reel_harvest_scraper::DEFAULT_MAX_PAGES)]
        max_pages: u32,
    },

    /// Show checkpoint statistics and a gap summary
    Status,

    /// List outstanding gaps in detail
    Gaps {
        /// Largest episode shortfall still treated as a partial scrape
        #[arg(long)]
        threshold: Option<u32>,

        /// Entries to list per section
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Close gaps: scrape new items, resolve missing videos, verify series
    Harvest {
        /// Concurrent workers (1-10)
        #[arg(short, long, value_parser = parse_workers)]
        workers: Option<usize>,

        /// Also re-scan series with a small episode shortfall
        #[arg(long)]
        verify: bool,

        /// Maximum number of tasks to run
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Re-scan only series whose recorded episodes fall short of the site's count
    Verify {
        /// Concurrent workers (1-10)
        #[arg(short, long, value_parser = parse_workers)]
        workers: Option<usize>,
    },

    /// Checkpoint maintenance
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointAction,
    },

    /// Export the checkpoint into the app's SQLite database
    ExportDb {
        /// Destination database
        #[arg(long)]
        out: PathBuf,

        /// Table layout to create
        #[arg(long, value_enum, default_value_t = SchemaArg::Room)]
        schema: SchemaArg,
    },

    /// Convert a Namakade source database into the app's database
    Convert {
        /// Source database (series and episodes tables)
        #[arg(long)]
        source: PathBuf,

        /// Destination database; replaced if it exists
        #[arg(long)]
        out: PathBuf,

        /// Print coverage statistics after converting
        #[arg(long)]
        stats: bool,

        /// Map an app database back to the source layout instead
        #[arg(long)]
        reverse: bool,
    },

    /// Run discovery and harvest periodically
    Update {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Minutes between cycles
        #[arg(long, default_value_t = 15)]
        interval: u64,

        /// Export the app database after each cycle
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Generate Android image assets
    Assets {
        #[command(subcommand)]
        action: AssetsAction,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum CheckpointAction {
    /// Copy the checkpoint to a timestamped backup
    Backup {
        /// Label in the backup file name
        #[arg(default_value = "manual")]
        label: String,
    },

    /// Set the harvest phase (catalog_discovery, detail_scraping, complete)
    ResetPhase {
        phase: String,
    },

    /// Remove duplicate shows and episodes
    Dedupe,

    /// Write shows and episodes as a JSON catalog
    ExportJson {
        out: PathBuf,
    },
}

#[derive(Subcommand)]
pub(crate) enum AssetsAction {
    /// Launcher icons for every density
    Mipmaps {
        /// Source logo image
        logo: PathBuf,

        /// Asset name (lowercase letters, digits, underscores)
        #[arg(long)]
        name: String,

        /// Resource directory that receives mipmap-* folders
        #[arg(long)]
        out: PathBuf,
    },

    /// TV banner and app icon at 1280x720
    Banner {
        /// Source banner image
        image: PathBuf,

        /// Asset name (lowercase letters, digits, underscores)
        #[arg(long)]
        name: String,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show resolved settings and where they come from
    Show,
    /// Print the settings file path
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum SchemaArg {
    Room,
    Basic,
}

impl From<SchemaArg> for reel_harvest_db::SchemaVariant {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Room => Self::Room,
            SchemaArg::Basic => Self::Basic,
        }
    }
}
