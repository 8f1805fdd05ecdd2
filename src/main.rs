use std::error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use bibextract::{extract, Error};

use clap::Parser as CLIParser;
use flexi_logger::{DeferredNow, Logger, LoggerHandle};
use log::{info, warn, Record};

/// Extract the entries of a .bib library which are cited in a .tex file
/// and write them to a new, minimal .bib library.
#[derive(clap::Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Settings {
    /// .bib library to be parsed
    #[clap(value_name = "BIB_FILE")]
    bib_file: PathBuf,

    /// .tex file to be parsed
    #[clap(value_name = "TEX_FILE")]
    tex_file: PathBuf,

    /// minimal .bib library to be created
    #[clap(value_name = "NEW_BIB_FILE")]
    new_bib_file: PathBuf,

    /// Print diagnostic output while scanning
    #[clap(short, long)]
    verbose: bool,

    /// Only print errors
    #[clap(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the report as JSON on stdout
    #[cfg(feature = "json")]
    #[clap(long)]
    json: bool,
}

impl Settings {
    fn options(&self) -> extract::Options {
        extract::Options {
            bib_file: self.bib_file.clone(),
            tex_file: self.tex_file.clone(),
            new_bib_file: self.new_bib_file.clone(),
        }
    }

    fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}

// "WRN message"
fn log_format(w: &mut dyn io::Write, _now: &mut DeferredNow, record: &Record) -> io::Result<()> {
    let level = match record.level() {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    };
    write!(w, "{} {}", level, record.args())
}

fn init_logging(settings: &Settings) -> Result<LoggerHandle, flexi_logger::FlexiLoggerError> {
    Logger::try_with_str(settings.log_level())?
        .format(log_format)
        .start()
}

fn run(settings: &Settings) -> Result<(), Box<dyn error::Error>> {
    let report = extract::run(&settings.options())?;

    info!(
        "wrote {} entries to {}",
        report.written.len(),
        settings.new_bib_file.display()
    );
    if !report.is_complete() {
        warn!(
            "{} citation key(s) not found in {}: {}",
            report.unresolved.len(),
            settings.bib_file.display(),
            report.unresolved.join(", ")
        );
    }

    #[cfg(feature = "json")]
    {
        if settings.json {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let settings = Settings::parse();

    let _logger = match init_logging(&settings) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("warning: cannot set up logging: {}", err);
            None
        }
    };

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            match err.downcast_ref::<Error>() {
                Some(Error::Usage(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
