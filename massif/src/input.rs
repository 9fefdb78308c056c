//! Opening Massif files that may be compressed.
//!
//! Massif output is plain text, but archived profiles are often stored as
//! `.gz` or `.zst`. The compression is picked from the file extension.

use flate2::read::GzDecoder;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Compression applied to an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    /// Pick the compression from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("zst") | Some("zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Wrap a reader in the matching decoder and a line buffer.
pub fn decode<R: Read + 'static>(
    reader: R,
    compression: Compression,
) -> io::Result<Box<dyn BufRead>> {
    let decoded: Box<dyn BufRead> = match compression {
        Compression::None => Box::new(BufReader::new(reader)),
        Compression::Gzip => Box::new(BufReader::new(GzDecoder::new(reader))),
        Compression::Zstd => Box::new(BufReader::new(zstd::stream::read::Decoder::new(reader)?)),
    };
    Ok(decoded)
}

/// Open a Massif file for line-by-line reading.
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let compression = Compression::from_path(path);
    debug!("opening {} ({:?})", path.display(), compression);

    let file = File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("failed to open input file '{}': {}", path.display(), e),
        )
    })?;
    decode(file, compression)
}
