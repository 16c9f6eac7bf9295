//! Transport-level body codecs.
//!
//! Detection follows the permissive rule the gateway has always used: the
//! `Content-Encoding` value is searched for a marker substring, it is not
//! parsed as a token list. `x-gzip` therefore counts as gzip and anything
//! containing `br` counts as Brotli.

use std::fmt;
use std::io::{self, Cursor, Read, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

const GZIP_MARKER: &str = "gzip";
const BROTLI_MARKER: &str = "br";

/// Maximum Brotli quality.
pub const BROTLI_QUALITY: i32 = 11;
const BROTLI_LGWIN: i32 = 22;
const BROTLI_BUFFER: usize = 4096;

/// Body encoding named by a `Content-Encoding` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentEncoding {
    #[default]
    Identity,
    Gzip,
    Brotli,
}

impl ContentEncoding {
    /// Classify a raw header value. Gzip wins when both markers appear.
    pub fn detect(header: Option<&str>) -> Self {
        match header {
            Some(value) if value.contains(GZIP_MARKER) => ContentEncoding::Gzip,
            Some(value) if value.contains(BROTLI_MARKER) => ContentEncoding::Brotli,
            _ => ContentEncoding::Identity,
        }
    }

    /// Token to emit in an outgoing `Content-Encoding` header, if any.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            ContentEncoding::Identity => None,
            ContentEncoding::Gzip => Some(GZIP_MARKER),
            ContentEncoding::Brotli => Some(BROTLI_MARKER),
        }
    }

    /// Whether a raw header value carries this encoding's marker.
    pub fn is_named_in(self, header: Option<&str>) -> bool {
        match (self.header_value(), header) {
            (Some(marker), Some(value)) => value.contains(marker),
            _ => false,
        }
    }

    pub fn is_compressed(self) -> bool {
        self != ContentEncoding::Identity
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_value().unwrap_or("identity"))
    }
}

/// Why a body could not be decompressed.
#[derive(Debug)]
pub enum DecompressError {
    /// The stream is corrupt or truncated.
    Corrupt(io::Error),
    /// Output passed `limit` bytes before the stream ended.
    LimitExceeded { limit: usize },
}

/// Undo `encoding` on `data`, refusing to produce more than `limit` bytes.
pub fn decompress(
    encoding: ContentEncoding,
    data: &[u8],
    limit: usize,
) -> Result<Vec<u8>, DecompressError> {
    let bound = (limit as u64).saturating_add(1);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).min(limit));
    let read = match encoding {
        ContentEncoding::Identity => {
            if data.len() > limit {
                return Err(DecompressError::LimitExceeded { limit });
            }
            return Ok(data.to_vec());
        }
        ContentEncoding::Gzip => MultiGzDecoder::new(data).take(bound).read_to_end(&mut out),
        ContentEncoding::Brotli => brotli::Decompressor::new(data, BROTLI_BUFFER)
            .take(bound)
            .read_to_end(&mut out),
    };
    read.map_err(DecompressError::Corrupt)?;
    if out.len() > limit {
        return Err(DecompressError::LimitExceeded { limit });
    }
    Ok(out)
}

/// Compression that stopped part-way; `partial` holds what was produced.
#[derive(Debug)]
pub struct CompressError {
    pub partial: Vec<u8>,
    pub source: io::Error,
}

/// Apply `encoding` to `data`. Identity returns the input untouched.
pub fn compress(encoding: ContentEncoding, data: &[u8]) -> Result<Vec<u8>, CompressError> {
    match encoding {
        ContentEncoding::Identity => Ok(data.to_vec()),
        ContentEncoding::Gzip => gzip(data),
        ContentEncoding::Brotli => brotli_max(data),
    }
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, CompressError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    let written = encoder
        .write_all(data)
        .and_then(|()| encoder.try_finish());
    match written {
        Ok(()) => encoder.finish().map_err(|source| CompressError {
            partial: Vec::new(),
            source,
        }),
        Err(source) => Err(CompressError {
            partial: encoder.get_ref().clone(),
            source,
        }),
    }
}

fn brotli_max(data: &[u8]) -> Result<Vec<u8>, CompressError> {
    let params = brotli::enc::BrotliEncoderParams {
        quality: BROTLI_QUALITY,
        lgwin: BROTLI_LGWIN,
        ..Default::default()
    };
    let mut out = Vec::with_capacity(data.len() / 2);
    match brotli::BrotliCompress(&mut Cursor::new(data), &mut out, &params) {
        Ok(_) => Ok(out),
        Err(source) => Err(CompressError {
            partial: out,
            source,
        }),
    }
}
