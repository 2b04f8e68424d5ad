//! The compression façade behind a region file's per-chunk compression
//! byte: GZip, zlib and raw are handled directly; LZ4 and a vendor-defined
//! "custom" scheme are resolved through a small backend registry so that
//! neither pulls in a default dependency unless a caller actually needs
//! one (spec §4.3: six variants behind one interface).

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{Mutex, OnceLock};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::{AnvilError, Result};

/// The scheme named by a chunk's compression byte, independent of whether
/// the payload lives inline or in an external `.mcc` file (that's the high
/// bit, tracked separately — see [`CompressionTag`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionScheme {
    GZip,
    Zlib,
    Uncompressed,
    Lz4,
    Custom,
}

const EXTERNAL_BIT: u8 = 0x80;

impl CompressionScheme {
    fn base_byte(self) -> u8 {
        match self {
            CompressionScheme::GZip => 1,
            CompressionScheme::Zlib => 2,
            CompressionScheme::Uncompressed => 3,
            CompressionScheme::Lz4 => 4,
            CompressionScheme::Custom => 127,
        }
    }

    fn from_base_byte(byte: u8) -> Result<Self> {
        Ok(match byte {
            1 => CompressionScheme::GZip,
            2 => CompressionScheme::Zlib,
            3 => CompressionScheme::Uncompressed,
            4 => CompressionScheme::Lz4,
            127 => CompressionScheme::Custom,
            other => return Err(AnvilError::UnknownCompression(other)),
        })
    }
}

/// A compression byte as it appears on the wire: scheme plus the external
/// (`.mcc`) flag packed into the high bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionTag {
    pub scheme: CompressionScheme,
    pub external: bool,
}

impl CompressionTag {
    pub fn new(scheme: CompressionScheme, external: bool) -> Self {
        Self { scheme, external }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        Ok(Self {
            scheme: CompressionScheme::from_base_byte(byte & !EXTERNAL_BIT)?,
            external: byte & EXTERNAL_BIT != 0,
        })
    }

    pub fn to_byte(self) -> u8 {
        self.scheme.base_byte() | if self.external { EXTERNAL_BIT } else { 0 }
    }
}

/// A pluggable compressor/decompressor for a scheme this crate doesn't
/// implement natively (LZ4, or a vendor's own "custom" format).
pub trait CompressionBackend: Send + Sync {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

type Registry = Mutex<HashMap<CompressionScheme, Box<dyn CompressionBackend>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Registers a backend for [`CompressionScheme::Lz4`] or
/// [`CompressionScheme::Custom`]. Registering for [`CompressionScheme::GZip`],
/// [`CompressionScheme::Zlib`] or [`CompressionScheme::Uncompressed`] has no
/// effect: those are always handled by the built-in implementation.
pub fn register_backend(scheme: CompressionScheme, backend: Box<dyn CompressionBackend>) {
    if matches!(scheme, CompressionScheme::Lz4 | CompressionScheme::Custom) {
        registry().lock().unwrap().insert(scheme, backend);
    }
}

pub fn decompress(tag: CompressionTag, data: &[u8]) -> Result<Vec<u8>> {
    match tag.scheme {
        CompressionScheme::GZip => {
            let mut out = Vec::new();
            GzDecoder::new(data).read_to_end(&mut out)?;
            Ok(out)
        }
        CompressionScheme::Zlib => {
            let mut out = Vec::new();
            ZlibDecoder::new(data).read_to_end(&mut out)?;
            Ok(out)
        }
        CompressionScheme::Uncompressed => Ok(data.to_vec()),
        CompressionScheme::Lz4 | CompressionScheme::Custom => {
            let registry = registry().lock().unwrap();
            let backend = registry.get(&tag.scheme).ok_or_else(|| {
                AnvilError::UnregisteredCompression(format!("{:?}", tag.scheme))
            })?;
            backend.decompress(data)
        }
    }
}

pub fn compress(scheme: CompressionScheme, data: &[u8]) -> Result<Vec<u8>> {
    match scheme {
        CompressionScheme::GZip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        CompressionScheme::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        CompressionScheme::Uncompressed => Ok(data.to_vec()),
        CompressionScheme::Lz4 | CompressionScheme::Custom => {
            let registry = registry().lock().unwrap();
            let backend = registry
                .get(&scheme)
                .ok_or_else(|| AnvilError::UnregisteredCompression(format!("{scheme:?}")))?;
            backend.compress(data)
        }
    }
}
