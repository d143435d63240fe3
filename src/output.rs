//! Terminal output for the `qrs` binary: colored hit listings and a stderr
//! logger.

use std::io::{self, Write};
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record as LogRecord};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use qrs::query::Query;
use qrs::records::{RecUnit, Record};

fn choice(color: bool) -> ColorChoice {
    if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Print one line per record: key, location, score and subrecord count.
pub fn print_records(records: &[Record], unit: RecUnit, color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice(color));

    for rec in records {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        write!(stdout, "{}", rec.key)?;
        stdout.reset()?;

        match unit {
            RecUnit::Section => write!(stdout, ":{}", rec.section)?,
            RecUnit::Position => write!(stdout, ":{}:{}", rec.section, rec.position)?,
            _ => {}
        }

        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(stdout, "  {}", rec.score)?;
        stdout.reset()?;

        if rec.n_subrecs > 1 {
            write!(stdout, "  ({} hits)", rec.n_subrecs)?;
        }
        writeln!(stdout)?;
    }

    Ok(())
}

/// Print the summary line after a listing.
pub fn print_summary(nhits: usize, shown: usize, color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice(color));
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    if shown < nhits {
        writeln!(stdout, "-- {} hits ({} shown)", nhits, shown)?;
    } else {
        writeln!(stdout, "-- {} hits", nhits)?;
    }
    stdout.reset()?;
    Ok(())
}

/// Print a parsed query tree as JSON, followed by any unconsumed input.
pub fn print_query(query: &Query, color: bool) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(choice(color));
    let json = serde_json::to_string_pretty(query)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(stdout, "{}", json)?;

    if !query.rest.is_empty() {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(stdout, "rest:")?;
        stdout.reset()?;
        writeln!(stdout, " {}", query.rest)?;
    }
    Ok(())
}

/// Logger writing level-tagged lines to stderr.
pub struct StderrLogger {
    level: LevelFilter,
    stderr: Mutex<StandardStream>,
}

impl StderrLogger {
    /// Install as the global logger. `verbosity` counts `-v` flags.
    pub fn init(verbosity: u8, color: bool) -> Result<(), log::SetLoggerError> {
        let level = match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        let logger = StderrLogger {
            level,
            stderr: Mutex::new(StandardStream::stderr(choice(color))),
        };
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &LogRecord<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Ok(mut stderr) = self.stderr.lock() else {
            return;
        };
        let color = match record.level() {
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Green,
            Level::Debug => Color::Cyan,
            Level::Trace => Color::Blue,
        };
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stderr, "{:>5}", record.level());
        let _ = stderr.reset();
        let _ = writeln!(stderr, " {}: {}", record.target(), record.args());
    }

    fn flush(&self) {
        if let Ok(mut stderr) = self.stderr.lock() {
            let _ = stderr.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_installs_once() {
        StderrLogger::init(2, false).unwrap();
        assert_eq!(log::max_level(), LevelFilter::Debug);
        log::debug!("logger installed");
        let err = StderrLogger::init(0, false).unwrap_err();
        let _: &dyn std::error::Error = &err;
    }
}
