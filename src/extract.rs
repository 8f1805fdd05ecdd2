use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::citations::CitationScanner;
use crate::errors::Error;
use crate::filter::{self, Report};
use crate::parser::Parser;

/// The three files of one extraction run
#[derive(Debug, Clone)]
pub struct Options {
    /// `.bib` library to read entries from
    pub bib_file: PathBuf,
    /// `.tex` document to read citations from
    pub tex_file: PathBuf,
    /// minimal `.bib` library to create
    pub new_bib_file: PathBuf,
}

/// Write the entries of `bib_file` cited in `tex_file` to `new_bib_file`.
///
/// Both sources are scanned before the destination is touched, so a
/// malformed source leaves no output file behind. Unresolved citations
/// are part of the returned `Report`, not an error.
pub fn run(opts: &Options) -> Result<Report, Error> {
    if same_file(&opts.bib_file, &opts.new_bib_file) {
        return Err(Error::Usage(format!(
            "please give different filenames for old and new .bib files (both are '{}')",
            opts.bib_file.display()
        )));
    }

    let table = Parser::from_file(&opts.bib_file)
        .map_err(Error::io("read", &opts.bib_file))?
        .table()
        .map_err(Error::scan(&opts.bib_file))?;
    debug!("{} keys found in {}", table.len(), opts.bib_file.display());

    let citations = CitationScanner::from_file(&opts.tex_file)
        .map_err(Error::io("read", &opts.tex_file))?
        .keys()
        .map_err(Error::scan(&opts.tex_file))?;
    debug!("{} citations in {}", citations.len(), opts.tex_file.display());

    let mut buf = Vec::new();
    let report =
        filter::emit(&table, &citations, &mut buf).map_err(Error::io("write", &opts.new_bib_file))?;
    fs::write(&opts.new_bib_file, &buf).map_err(Error::io("write", &opts.new_bib_file))?;
    debug!(
        "wrote {} entries to {}",
        report.written.len(),
        opts.new_bib_file.display()
    );
    Ok(report)
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
