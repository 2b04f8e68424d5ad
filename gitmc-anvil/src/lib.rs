//! The Anvil region-file codec: sector-aligned chunk container, six-variant
//! compression façade, and chunk/region coordinate arithmetic.

pub mod compression;
pub mod coord;
pub mod error;
pub mod region;

pub use compression::{register_backend, CompressionBackend, CompressionScheme, CompressionTag};
pub use coord::Point2;
pub use error::{AnvilError, Result, ValidationWarning};
pub use region::{mcc_file_name, parse_region_filename, ExternalChunk, RegionReader, RegionWriter, SpillPolicy};
