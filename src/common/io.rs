//! Common, IO-related code.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder, Compression};

/// Path that stands for stdin or stdout.
pub const STDIO: &str = "-";

fn is_gz(path: &Path) -> bool {
    path.extension().map(|s| s.to_str()) == Some(Some("gz"))
}

/// Transparently open a file with gzip decoder; `-` reads from stdin.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if path.as_ref() == Path::new(STDIO) {
        tracing::trace!("Reading from stdin");
        Ok(Box::new(BufReader::new(std::io::stdin())))
    } else if is_gz(path.as_ref()) {
        tracing::trace!("Opening {:?} as gzip for reading", path.as_ref());
        let file = File::open(path)?;
        let bufreader = BufReader::new(file);
        let decoder = MultiGzDecoder::new(bufreader);
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        tracing::trace!("Opening {:?} as plain text for reading", path.as_ref());
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Transparently open a file with gzip encoder; `-` writes to stdout.
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write>, anyhow::Error>
where
    P: AsRef<Path>,
{
    if path.as_ref() == Path::new(STDIO) {
        tracing::trace!("Writing to stdout");
        Ok(Box::new(BufWriter::new(std::io::stdout())))
    } else if is_gz(path.as_ref()) {
        tracing::trace!("Opening {:?} as gzip for writing", path.as_ref());
        let file = File::create(path)?;
        let bufwriter = BufWriter::new(file);
        let encoder = GzEncoder::new(bufwriter, Compression::default());
        Ok(Box::new(encoder))
    } else {
        tracing::trace!("Opening {:?} as plain text for writing", path.as_ref());
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }
}
