//! The Anvil region-file container (spec §4.3): a 1024-chunk sector-aligned
//! archive with a location table, a timestamp table, and an optional
//! external-chunk (`.mcc`) side channel for payloads too large to fit the
//! 255-sector-per-chunk budget the location table can address.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use gitmc_nbt::NbtCompound;

use crate::compression::{self, CompressionScheme, CompressionTag};
use crate::coord::Point2;
use crate::error::{AnvilError, Result, ValidationWarning};

pub const SECTOR_SIZE: usize = 4096;
const HEADER_SECTORS: u32 = 2;
const HEADER_SIZE: u64 = SECTOR_SIZE as u64 * HEADER_SECTORS as u64;
const SLOT_COUNT: usize = 1024;
/// A chunk's sector count is a single byte; the largest payload the
/// location table can address inline is 255 sectors (1,044,480 bytes,
/// including the 4-byte length prefix and compression-tag byte).
const MAX_SECTORS_PER_CHUNK: u32 = 255;
const MAX_IN_FILE_PAYLOAD: usize = MAX_SECTORS_PER_CHUNK as usize * SECTOR_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SectorRange {
    offset: u32,
    count: u32,
}

impl SectorRange {
    fn is_present(self) -> bool {
        self.offset != 0 && self.count != 0
    }
}

/// What to do with a chunk whose compressed payload won't fit inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpillPolicy {
    /// Write the payload to an external `.mcc` file and leave a 1-sector
    /// stub (just the compression-tag byte, externally-flagged) in-region.
    AllowExternal,
    /// Reject the chunk with [`AnvilError::OversizedChunk`].
    Forbid,
}

/// The payload for one chunk that a writer spilled to an external file.
/// All of a region's spilled chunks share that region's `.mcc` file (same
/// basename as its `.mca`, per spec) — see [`mcc_file_name`].
pub struct ExternalChunk {
    pub coord: Point2,
    pub bytes: Vec<u8>,
}

/// Parses a `r.<x>.<z>.mca` region file name into its region coordinate.
pub fn parse_region_filename(name: &str) -> Result<Point2> {
    let rest = name
        .strip_prefix("r.")
        .and_then(|s| s.strip_suffix(".mca"))
        .ok_or_else(|| AnvilError::MalformedFilename(name.to_owned()))?;
    let mut parts = rest.split('.');
    let x = parts.next().and_then(|s| s.parse().ok());
    let z = parts.next().and_then(|s| s.parse().ok());
    match (x, z, parts.next()) {
        (Some(x), Some(z), None) => Ok(Point2::new(x, z)),
        _ => Err(AnvilError::MalformedFilename(name.to_owned())),
    }
}

/// The external-chunk side-channel file name for a region: same basename
/// as its `.mca`, `.mcc` extension (spec §4.2/§6).
pub fn mcc_file_name(region: Point2) -> String {
    format!("r.{}.{}.mcc", region.x, region.z)
}

/// Reads chunks out of an existing region file.
pub struct RegionReader<R> {
    inner: R,
    locations: Box<[SectorRange; SLOT_COUNT]>,
    timestamps: Box<[u32; SLOT_COUNT]>,
    file_len: u64,
    /// The region's `.mcc` side-channel, fetched and cached on first need.
    /// Every externally-flagged chunk's payload is a `length: u32 BE;
    /// data: length bytes` frame appended to this one file in the order
    /// the writer added them (spec §4.2/§6); reads must therefore walk
    /// `external_cursor` through it in the same order.
    external_bytes: Option<Vec<u8>>,
    external_cursor: usize,
}

impl<R: Read + Seek> RegionReader<R> {
    /// Parses the location and timestamp tables. Does not read any chunk
    /// payload yet.
    pub fn open(mut inner: R) -> Result<Self> {
        let file_len = inner.seek(SeekFrom::End(0))?;
        if file_len < HEADER_SIZE {
            return Err(AnvilError::TruncatedHeader(file_len));
        }
        if file_len % SECTOR_SIZE as u64 != 0 {
            return Err(AnvilError::Unpadded(file_len));
        }

        inner.seek(SeekFrom::Start(0))?;
        let mut locations = Box::new([SectorRange { offset: 0, count: 0 }; SLOT_COUNT]);
        for slot in locations.iter_mut() {
            let raw = inner.read_u32::<BigEndian>()?;
            *slot = SectorRange {
                offset: raw >> 8,
                count: raw & 0xFF,
            };
        }

        let mut timestamps = Box::new([0u32; SLOT_COUNT]);
        for slot in timestamps.iter_mut() {
            *slot = inner.read_u32::<BigEndian>()?;
        }

        Ok(Self {
            inner,
            locations,
            timestamps,
            file_len,
            external_bytes: None,
            external_cursor: 0,
        })
    }

    /// Every region-local coordinate with a present chunk, in ascending
    /// slot-index order.
    pub fn list_chunks(&self) -> Vec<Point2> {
        (0..SLOT_COUNT)
            .filter(|&i| self.locations[i].is_present())
            .map(Point2::from_region_index)
            .collect()
    }

    pub fn timestamp(&self, local: Point2) -> u32 {
        self.timestamps[local.region_index()]
    }

    /// Reads and decompresses a chunk's NBT payload. `local` is a
    /// region-local coordinate (0..32 per axis — see [`Point2::local_in_region`]).
    /// `external_name` is the region's `.mcc` file name (see
    /// [`mcc_file_name`]); `external` is consulted at most once, the first
    /// time an externally-flagged chunk is read, and should return that
    /// file's complete bytes. Externally-flagged chunks must be read in
    /// ascending `local.region_index()` order — the order their frames
    /// were appended to the `.mcc` file by the writer.
    pub fn get_chunk(
        &mut self,
        local: Point2,
        external_name: &str,
        external: impl FnOnce(&str) -> Result<Vec<u8>>,
    ) -> Result<NbtCompound> {
        let range = self.locations[local.region_index()];
        if !range.is_present() {
            return Err(AnvilError::ChunkNotFound);
        }
        if range.offset < HEADER_SECTORS
            || (range.offset as u64 + range.count as u64) * SECTOR_SIZE as u64 > self.file_len
        {
            return Err(AnvilError::IllegalSectorRange(range.offset));
        }

        self.inner
            .seek(SeekFrom::Start(range.offset as u64 * SECTOR_SIZE as u64))?;
        let declared_len = self.inner.read_u32::<BigEndian>()?;
        if declared_len == 0 || declared_len as u64 + 4 > range.count as u64 * SECTOR_SIZE as u64 {
            return Err(AnvilError::IllegalSectorRange(range.offset));
        }
        let tag = CompressionTag::from_byte(self.inner.read_u8()?)?;
        let payload_len = declared_len as usize - 1;
        let mut payload = vec![0u8; payload_len];
        self.inner.read_exact(&mut payload)?;

        let raw = if tag.external {
            if self.external_bytes.is_none() {
                self.external_bytes = Some(external(external_name)?);
                self.external_cursor = 0;
            }
            let buf = self.external_bytes.as_ref().expect("just populated above");
            let cursor = self.external_cursor;
            let len_bytes = buf
                .get(cursor..cursor + 4)
                .ok_or_else(|| AnvilError::MissingExternalChunk(external_name.to_owned()))?;
            let len = u32::from_be_bytes(len_bytes.try_into().expect("slice is 4 bytes")) as usize;
            let start = cursor + 4;
            let end = start + len;
            let data = buf
                .get(start..end)
                .ok_or_else(|| AnvilError::MissingExternalChunk(external_name.to_owned()))?;
            self.external_cursor = end;
            compression::decompress(tag, data)?
        } else {
            compression::decompress(tag, &payload)?
        };

        let (_, compound) = gitmc_nbt::read_named_compound(&mut std::io::Cursor::new(raw))?;
        Ok(compound)
    }

    /// Scans the header for problems that don't prevent reading the file
    /// but are worth surfacing: overlapping sector claims, zero timestamps.
    /// Returns warnings separately from hard structural errors (those are
    /// raised directly by [`Self::open`]/[`Self::get_chunk`]).
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut claimed: Vec<(u32, u32, Point2)> = Vec::new();
        for i in 0..SLOT_COUNT {
            let range = self.locations[i];
            if !range.is_present() {
                continue;
            }
            let local = Point2::from_region_index(i);
            if self.timestamps[i] == 0 {
                warnings.push(ValidationWarning::TimestampZero { x: local.x, z: local.z });
            }
            for &(start, len, other) in &claimed {
                if range.offset < start + len && start < range.offset + range.count {
                    warnings.push(ValidationWarning::OverlappingSectors {
                        first: (other.x, other.z),
                        second: (local.x, local.z),
                    });
                }
            }
            claimed.push((range.offset, range.count, local));
        }
        warnings
    }
}

/// Builds a brand-new region file in memory, one chunk at a time. Used by
/// the translation engine's rebuild path, which always constructs a fresh
/// region rather than patching an existing one (sector reuse/compaction
/// isn't needed when every rebuild starts from nothing).
pub struct RegionWriter {
    locations: Box<[SectorRange; SLOT_COUNT]>,
    timestamps: Box<[u32; SLOT_COUNT]>,
    body: Vec<u8>,
    next_sector: u32,
}

impl Default for RegionWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionWriter {
    pub fn new() -> Self {
        Self {
            locations: Box::new([SectorRange { offset: 0, count: 0 }; SLOT_COUNT]),
            timestamps: Box::new([0u32; SLOT_COUNT]),
            body: Vec::new(),
            next_sector: HEADER_SECTORS,
        }
    }

    /// Adds a chunk at `local` (region-local 0..32 coordinate). Returns the
    /// external `.mcc` payload when the chunk didn't fit inline and
    /// `spill` is [`SpillPolicy::AllowExternal`].
    pub fn add_chunk(
        &mut self,
        local: Point2,
        compound: &NbtCompound,
        scheme: CompressionScheme,
        timestamp: u32,
        spill: SpillPolicy,
    ) -> Result<Option<ExternalChunk>> {
        let mut raw = Vec::new();
        gitmc_nbt::write_named_compound(&mut raw, "", compound)?;
        let compressed = compression::compress(scheme, &raw)?;

        let inline_total = 4 + 1 + compressed.len();
        let (payload, tag, external_chunk) = if inline_total <= MAX_IN_FILE_PAYLOAD {
            (compressed, CompressionTag::new(scheme, false), None)
        } else {
            match spill {
                SpillPolicy::Forbid => return Err(AnvilError::OversizedChunk(inline_total)),
                SpillPolicy::AllowExternal => {
                    let ext = ExternalChunk {
                        coord: local,
                        bytes: compressed,
                    };
                    (Vec::new(), CompressionTag::new(scheme, true), Some(ext))
                }
            }
        };

        let declared_len = (payload.len() + 1) as u32;
        let total_bytes = 4 + 1 + payload.len();
        let sector_count = ((total_bytes + SECTOR_SIZE - 1) / SECTOR_SIZE) as u32;
        if sector_count > MAX_SECTORS_PER_CHUNK {
            return Err(AnvilError::OversizedChunk(total_bytes));
        }

        let offset = self.next_sector;
        self.next_sector += sector_count;

        self.body.extend_from_slice(&declared_len.to_be_bytes());
        self.body.push(tag.to_byte());
        self.body.extend_from_slice(&payload);
        let padded = sector_count as usize * SECTOR_SIZE;
        self.body.resize(self.body.len() + (padded - (4 + 1 + payload.len())), 0);

        let index = local.region_index();
        self.locations[index] = SectorRange { offset, count: sector_count };
        self.timestamps[index] = timestamp;

        Ok(external_chunk)
    }

    /// Serializes the complete region file: header followed by every
    /// chunk's sector-aligned payload.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE as usize + self.body.len());
        for range in self.locations.iter() {
            let packed = (range.offset << 8) | (range.count & 0xFF);
            out.extend_from_slice(&packed.to_be_bytes());
        }
        for ts in self.timestamps.iter() {
            out.extend_from_slice(&ts.to_be_bytes());
        }
        out.extend_from_slice(&self.body);
        out
    }
}
