//! Logger setup: plain messages on stdout, optionally teed to a file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Target, WriteStyle};
use log::{Level, LevelFilter};

use crate::error::CliError;

/// Writes to stdout unchanged and to a file with ANSI codes stripped.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(&strip_ansi_escapes::strip(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

/// Install the global logger.
///
/// `COVER_SYNC_LOG` accepts the usual env_logger filter syntax and wins over
/// the `--quiet`/`--verbose` level.
pub(crate) fn init_logger(
    quiet: bool,
    verbose: bool,
    logfile: Option<&Path>,
) -> Result<(), CliError> {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_env("COVER_SYNC_LOG");
    builder.format(move |buf, record| {
        if verbose {
            writeln!(
                buf,
                "{} {:<5} {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        } else if record.level() <= Level::Warn {
            writeln!(buf, "{}: {}", record.level().as_str().to_lowercase(), record.args())
        } else {
            writeln!(buf, "{}", record.args())
        }
    });

    match logfile {
        Some(path) => {
            let file = File::create(path)?;
            // Colors are decided per message by owo-colors; the tee strips them for the file.
            builder
                .target(Target::Pipe(Box::new(TeeWriter { file })))
                .write_style(WriteStyle::Always);
        }
        None => {
            builder.target(Target::Stdout);
        }
    }

    builder
        .try_init()
        .map_err(|e| CliError::other(format!("Failed to initialize logging: {}", e)))
}
