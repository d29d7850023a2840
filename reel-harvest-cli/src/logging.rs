//! Console logging with an optional plain-text copy on disk.
//!
//! Every command reports through the `log` facade. Records are written to
//! stdout as-is (colours included) and, when a log file is configured, a
//! timestamped copy with ANSI escapes stripped is appended to the file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

/// Where the plain-text copy of the log goes.
pub(crate) enum LogFile {
    /// One file for the whole run.
    Fixed(PathBuf),
    /// `reel-harvest_YYYYMMDD.log` in this directory, switching at midnight.
    Daily(PathBuf),
}

pub(crate) fn daily_log_name(date: NaiveDate) -> String {
    format!("reel-harvest_{}.log", date.format("%Y%m%d"))
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

enum FileSink {
    Fixed(File),
    Daily {
        dir: PathBuf,
        date: NaiveDate,
        file: File,
    },
}

impl FileSink {
    fn open(target: &LogFile) -> io::Result<Self> {
        match target {
            LogFile::Fixed(path) => Ok(Self::Fixed(open_append(path)?)),
            LogFile::Daily(dir) => {
                let date = chrono::Local::now().date_naive();
                let file = open_append(&dir.join(daily_log_name(date)))?;
                Ok(Self::Daily {
                    dir: dir.clone(),
                    date,
                    file,
                })
            }
        }
    }

    fn file(&mut self) -> io::Result<&mut File> {
        match self {
            Self::Fixed(file) => Ok(file),
            Self::Daily { dir, date, file } => {
                let today = chrono::Local::now().date_naive();
                if today != *date {
                    *file = open_append(&dir.join(daily_log_name(today)))?;
                    *date = today;
                }
                Ok(file)
            }
        }
    }
}

/// Writes to the console and, stripped of ANSI codes and with each line
/// stamped with the local time, to a file.
struct Tee<W> {
    console: W,
    sink: FileSink,
    line_start: bool,
}

impl<W> Tee<W> {
    fn new(console: W, sink: FileSink) -> Self {
        Self {
            console,
            sink,
            line_start: true,
        }
    }
}

impl<W: Write> Write for Tee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_all(buf)?;
        let plain = strip_ansi_escapes::strip(buf);
        let file = self.sink.file()?;
        for line in plain.split_inclusive(|&b| b == b'\n') {
            if self.line_start {
                write!(file, "{} ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
            }
            file.write_all(line)?;
            self.line_start = line.ends_with(b"\n");
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.console.flush()?;
        self.sink.file()?.flush()
    }
}

/// Install the global logger.
///
/// `quiet` limits output to warnings and errors; `verbose` enables debug
/// records and prefixes each line with a timestamp and target. `RUST_LOG`
/// overrides the level filter when set.
pub(crate) fn init(quiet: bool, verbose: bool, file: Option<&LogFile>) -> io::Result<()> {
    let level = if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let default_filter = format!("warn,reel_harvest={level}");
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));

    builder.format(move |buf, record| {
        if verbose {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        } else {
            match record.level() {
                Level::Error => writeln!(
                    buf,
                    "{} {}",
                    "error:".if_supports_color(Stdout, |t| t.red()),
                    record.args()
                ),
                Level::Warn => writeln!(
                    buf,
                    "{} {}",
                    "\u{26a0}".if_supports_color(Stdout, |t| t.yellow()),
                    record.args()
                ),
                _ => writeln!(buf, "{}", record.args()),
            }
        }
    });

    match file {
        Some(target) => {
            let tee = Tee::new(io::stdout(), FileSink::open(target)?);
            builder.target(env_logger::Target::Pipe(Box::new(tee)));
        }
        None => {
            builder.target(env_logger::Target::Stdout);
        }
    }

    builder.init();
    Ok(())
}
