//! The translation engine (spec §4.7): mirrors a save's binary NBT into a
//! tree of SNBT under `<save>/GitMC/`, and the inverse.

use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use gitmc_anvil::compression::{compress, decompress};
use gitmc_anvil::{CompressionScheme, CompressionTag, Point2, RegionReader, RegionWriter, SpillPolicy};
use gitmc_nbt::{NbtCompound, NbtTag};

use crate::collaborators::Repository;
use crate::error::{CoreError, Result};
use crate::hash::sha256_base64;
use crate::model::{CommitState, Manifest, Stamp};
use crate::operation::ProgressReporter;

use tracing::{debug, info, warn};

const MIRROR_DIR: &str = "GitMC";
const MANIFEST_NAME: &str = "manifest.json";
const CHUNK_CATEGORIES: [&str; 3] = ["region", "entities", "poi"];

fn is_level_dat(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some("level.dat")
}

fn system_time_unix_seconds(time: SystemTime) -> String {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        .to_string()
}

fn mtime_stamp(path: &Path) -> Result<String> {
    Ok(system_time_unix_seconds(fs::metadata(path)?.modified()?))
}

/// Reads a top-level `.dat` document, undoing the gzip framing `level.dat`
/// alone carries (spec §4.7 step 2 / §6 on-disk layout).
fn read_dat_document(path: &Path, raw: &[u8]) -> Result<NbtCompound> {
    let bytes = if is_level_dat(path) {
        decompress(CompressionTag::new(CompressionScheme::GZip, false), raw)?
    } else {
        raw.to_vec()
    };
    let (_, compound) = gitmc_nbt::read_named_compound(&mut Cursor::new(bytes))?;
    Ok(compound)
}

fn write_dat_document(path: &Path, compound: &NbtCompound) -> Result<()> {
    let mut raw = Vec::new();
    gitmc_nbt::write_named_compound(&mut raw, "", compound)?;
    let bytes = if is_level_dat(path) {
        compress(CompressionScheme::GZip, &raw)?
    } else {
        raw
    };
    crate::atomic::write_atomic(path, &bytes)
}

fn snbt_options() -> gitmc_snbt::SnbtWriteOptions {
    gitmc_snbt::SnbtWriteOptions::default()
}

fn parse_snbt_compound(path: &Path, text: &str) -> Result<NbtCompound> {
    match gitmc_snbt::parse(text)? {
        NbtTag::Compound(c) => Ok(c),
        _ => Err(CoreError::StampCorrupt(
            path.to_owned(),
            "top-level SNBT document is not a compound".to_owned(),
        )),
    }
}

/// Outcome of a single [`extract`] call.
#[derive(Debug, Default, Clone)]
pub struct ExtractReport {
    pub documents_translated: usize,
    pub documents_skipped: usize,
    pub chunks_translated: usize,
    pub chunks_skipped: usize,
    pub artifacts_deleted: usize,
    /// Non-NBT text files (`*.json`, `*.mcfunction`, `*.txt`) discovered
    /// alongside the save. These are already human-editable and are not
    /// mirrored; the caller stages them directly with the repository
    /// collaborator.
    pub passthrough_paths: Vec<String>,
}

struct Artifact {
    relpath: String,
    original_abs_path: PathBuf,
}

fn translate_document(
    mirror_root: &Path,
    manifest: &mut Manifest,
    translator: &str,
    artifact: Artifact,
    report: &mut ExtractReport,
) -> Result<()> {
    let raw = fs::read(&artifact.original_abs_path)?;
    let hash = sha256_base64(&raw);
    let mtime = mtime_stamp(&artifact.original_abs_path)?;

    let stamp_path = mirror_root.join(format!("{}.stamp.json", artifact.relpath));
    if let Ok(existing) = Stamp::load(&stamp_path) {
        if existing.matches(&hash, &mtime) {
            report.documents_skipped += 1;
            return Ok(());
        }
    }

    let compound = read_dat_document(&artifact.original_abs_path, &raw)?;
    let text = gitmc_snbt::to_string(&NbtTag::Compound(compound), &snbt_options());
    let snbt_path = mirror_root.join(&artifact.relpath);
    crate::atomic::write_atomic(&snbt_path, text.as_bytes())?;

    let stamp = Stamp {
        original_path: artifact.original_abs_path.display().to_string(),
        original_hash: hash,
        original_last_write_utc: mtime,
        translator: translator.to_owned(),
        format_version: "1".to_owned(),
        translated_at_utc: system_time_unix_seconds(SystemTime::now()),
        notes: None,
    };
    stamp.save(&stamp_path)?;

    manifest.mark_pending(artifact.relpath);
    report.documents_translated += 1;
    Ok(())
}

/// A region file's contribution to an extract pass, computed independently
/// of any other region file so that several can run across the worker
/// pool at once (spec §5: "the engine may fan out work in parallel across
/// chunks of a region or across regions"). The caller folds these into
/// the shared [`Manifest`]/[`ExtractReport`] sequentially.
#[derive(Default)]
struct RegionFileOutcome {
    pending: Vec<String>,
    deleted: Vec<String>,
    translated: usize,
    skipped: usize,
}

fn translate_region_file(
    mirror_root: &Path,
    category: &str,
    region_path: &Path,
    manifest: &Manifest,
    translator: &str,
    token: &crate::operation::CancellationToken,
) -> Result<RegionFileOutcome> {
    let region_coord = gitmc_anvil::parse_region_filename(
        region_path.file_name().and_then(|n| n.to_str()).unwrap_or_default(),
    )?;
    let region_dir = region_path.parent().unwrap_or_else(|| Path::new("."));
    let file = fs::File::open(region_path)?;
    let mut reader = RegionReader::open(file)?;
    let mut outcome = RegionFileOutcome::default();

    let mut present = std::collections::HashSet::new();
    for local in reader.list_chunks() {
        token.check()?;
        present.insert(local);
        let global = Point2::new(region_coord.x * 32 + local.x, region_coord.z * 32 + local.z);
        let relpath = format!(
            "{category}/r.{}.{}/chunk_{}_{}.snbt",
            region_coord.x, region_coord.z, global.x, global.z
        );
        let timestamp = reader.timestamp(local);

        let mcc_name = gitmc_anvil::mcc_file_name(region_coord);
        let compound = reader.get_chunk(local, &mcc_name, |name| {
            fs::read(region_dir.join(name)).map_err(gitmc_anvil::AnvilError::from)
        })?;
        let mut canonical = Vec::new();
        gitmc_nbt::write_named_compound(&mut canonical, "", &compound)?;
        let hash = sha256_base64(&canonical);
        let mtime = timestamp.to_string();

        let stamp_path = mirror_root.join(format!("{relpath}.stamp.json"));
        if let Ok(existing) = Stamp::load(&stamp_path) {
            if existing.matches(&hash, &mtime) {
                debug!("unchanged chunk, skipping: {relpath}");
                outcome.skipped += 1;
                continue;
            }
        }

        debug!("translating chunk: {relpath}");
        let text = gitmc_snbt::to_string(&NbtTag::Compound(compound), &snbt_options());
        crate::atomic::write_atomic(&mirror_root.join(&relpath), text.as_bytes())?;
        let stamp = Stamp {
            original_path: format!("{}#{},{}", region_path.display(), global.x, global.z),
            original_hash: hash,
            original_last_write_utc: mtime,
            translator: translator.to_owned(),
            format_version: "1".to_owned(),
            translated_at_utc: system_time_unix_seconds(SystemTime::now()),
            notes: None,
        };
        stamp.save(&stamp_path)?;
        outcome.pending.push(relpath);
        outcome.translated += 1;
    }

    // Chunks whose region slot is no longer present are marked deleted,
    // matching any mirrored artifact under this region's prefix.
    let prefix = format!("{category}/r.{}.{}/", region_coord.x, region_coord.z);
    outcome.deleted = manifest
        .iter()
        .filter(|(path, entry)| path.starts_with(&prefix) && !entry.deleted)
        .filter(|(path, _)| {
            parse_chunk_relpath(path)
                .map(|(_, global)| !present.contains(&global.local_in_region()))
                .unwrap_or(false)
        })
        .map(|(path, _)| path.to_owned())
        .collect();
    for path in &outcome.deleted {
        warn!("source chunk removed, marking deleted: {path}");
    }

    Ok(outcome)
}

/// Parses `"<category>/r.<rx>.<rz>/chunk_<cx>_<cz>.snbt"` into the region
/// coordinate and the global chunk coordinate.
fn parse_chunk_relpath(relpath: &str) -> Option<(Point2, Point2)> {
    let mut parts = relpath.splitn(3, '/');
    let _category = parts.next()?;
    let region_part = parts.next()?;
    let chunk_part = parts.next()?;

    let region_nums = region_part.strip_prefix("r.")?;
    let mut r = region_nums.split('.');
    let rx: i32 = r.next()?.parse().ok()?;
    let rz: i32 = r.next()?.parse().ok()?;

    let chunk_nums = chunk_part.strip_prefix("chunk_")?.strip_suffix(".snbt")?;
    let mut c = chunk_nums.split('_');
    let cx: i32 = c.next()?.parse().ok()?;
    let cz: i32 = c.next()?.parse().ok()?;

    Some((Point2::new(rx, rz), Point2::new(cx, cz)))
}

/// Runs the extract protocol over `save_root`, writing the SNBT mirror and
/// manifest under `<save_root>/GitMC/`.
pub fn extract(
    save_root: &Path,
    translator: &str,
    reporter: &ProgressReporter,
) -> Result<ExtractReport> {
    reporter.token().check()?;
    info!("extracting {}...", save_root.display());
    let mirror_root = save_root.join(MIRROR_DIR);
    let manifest_path = mirror_root.join(MANIFEST_NAME);
    let mut manifest = if manifest_path.exists() {
        Manifest::load(&manifest_path)?
    } else {
        Manifest::new()
    };
    let mut report = ExtractReport::default();

    let mut top_level_dats = Vec::new();
    if save_root.join("level.dat").exists() {
        top_level_dats.push(save_root.join("level.dat"));
    }
    if let Ok(entries) = fs::read_dir(save_root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("dat")
                && path.file_name().and_then(|n| n.to_str()) != Some("level.dat")
            {
                top_level_dats.push(path);
            }
        }
    }

    let mut region_files: Vec<(&str, PathBuf)> = Vec::new();
    for category in CHUNK_CATEGORIES {
        let category_dir = save_root.join(category);
        if !category_dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&category_dir)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("mca") {
                region_files.push((category, path));
            }
        }
    }

    let total_steps = top_level_dats.len() as u64 + region_files.len() as u64;
    let step = std::sync::atomic::AtomicU64::new(0);

    for path in top_level_dats {
        reporter.token().check()?;
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let artifact = Artifact {
            relpath: format!("{file_name}.snbt"),
            original_abs_path: path.clone(),
        };
        let n = step.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        reporter.report(n, Some(total_steps), format!("translating {file_name}"));
        translate_document(&mirror_root, &mut manifest, translator, artifact, &mut report)?;
    }

    // Each region file's contribution is computed independently (spec §5
    // fan-out across regions) and folded into the shared manifest/report
    // afterward, in file order, so the result is deterministic regardless
    // of completion order.
    use rayon::prelude::*;
    let outcomes: Vec<Result<RegionFileOutcome>> = region_files
        .par_iter()
        .map(|(category, path)| {
            reporter.token().check()?;
            let outcome =
                translate_region_file(&mirror_root, *category, path, &manifest, translator, reporter.token())?;
            let n = step.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            reporter.report(n, Some(total_steps), format!("translated {}", path.display()));
            Ok(outcome)
        })
        .collect();

    for outcome in outcomes {
        let outcome = outcome?;
        report.chunks_translated += outcome.translated;
        report.chunks_skipped += outcome.skipped;
        report.artifacts_deleted += outcome.deleted.len();
        for relpath in outcome.pending {
            manifest.mark_pending(relpath);
        }
        for relpath in outcome.deleted {
            manifest.mark_deleted(&relpath);
        }
    }

    collect_passthrough_files(save_root, &mut report.passthrough_paths)?;
    manifest.save(&manifest_path)?;
    info!(
        "extracted {}: {} chunks translated, {} skipped, {} deleted",
        save_root.display(),
        report.chunks_translated,
        report.chunks_skipped,
        report.artifacts_deleted
    );
    Ok(report)
}

fn collect_passthrough_files(save_root: &Path, out: &mut Vec<String>) -> Result<()> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if path.file_name().and_then(|n| n.to_str()) == Some(MIRROR_DIR) {
                continue;
            }
            if path.is_dir() {
                walk(root, &path, out)?;
                continue;
            }
            let is_editable = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("json") | Some("mcfunction") | Some("txt")
            );
            if is_editable {
                if let Ok(rel) = path.strip_prefix(root) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        Ok(())
    }
    walk(save_root, save_root, out)
}

/// Outcome of a single [`rebuild`] call.
#[derive(Debug, Default, Clone)]
pub struct RebuildReport {
    pub documents_written: usize,
    pub regions_written: usize,
    pub chunks_written: usize,
}

/// Runs the rebuild protocol: reconstructs binary NBT from the SNBT
/// mirror as it existed at `target_commit`, writing it back to
/// `save_root`.
pub fn rebuild(
    repo: &dyn Repository,
    save_root: &Path,
    target_commit: &str,
    reporter: &ProgressReporter,
) -> Result<RebuildReport> {
    reporter.token().check()?;
    info!("rebuilding {} at commit {target_commit}...", save_root.display());
    let manifest_relpath = format!("{MIRROR_DIR}/{MANIFEST_NAME}");
    let manifest_bytes = repo
        .read_at(target_commit, &manifest_relpath)?
        .ok_or_else(|| CoreError::UnknownCommit(target_commit.to_owned()))?;
    let manifest: Manifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| CoreError::ManifestCorrupt(PathBuf::from(&manifest_relpath), e.to_string()))?;

    let eligible: Vec<String> = manifest
        .paths_at(|commit| match commit {
            CommitState::Init => true,
            CommitState::Pending => false,
            CommitState::Hash(h) => h == target_commit || repo.is_ancestor(h, target_commit).unwrap_or(false),
        })
        .into_iter()
        .map(str::to_owned)
        .collect();

    let mut report = RebuildReport::default();
    let mut regions: BTreeMap<(String, Point2), Vec<String>> = BTreeMap::new();
    let mut documents: Vec<String> = Vec::new();

    for relpath in &eligible {
        if let Some((region, _chunk)) = parse_chunk_relpath(relpath) {
            let category = relpath.split('/').next().unwrap_or_default().to_owned();
            regions.entry((category, region)).or_default().push(relpath.clone());
        } else {
            documents.push(relpath.clone());
        }
    }

    let total_steps = (documents.len() + regions.len()) as u64;
    let mut step = 0u64;

    for relpath in &documents {
        reporter.token().check()?;
        step += 1;
        reporter.report(step, Some(total_steps), format!("rebuilding {relpath}"));
        let bytes = repo
            .read_at(target_commit, &format!("{MIRROR_DIR}/{relpath}"))?
            .ok_or_else(|| CoreError::UnknownCommit(target_commit.to_owned()))?;
        let text = String::from_utf8_lossy(&bytes);
        let compound = parse_snbt_compound(Path::new(relpath), &text)?;
        let file_name = relpath
            .strip_suffix(".snbt")
            .ok_or_else(|| CoreError::MalformedArtifactPath(relpath.clone()))?;
        write_dat_document(&save_root.join(file_name), &compound)?;
        report.documents_written += 1;
    }

    for ((category, region), chunk_paths) in regions {
        reporter.token().check()?;
        step += 1;
        reporter.report(
            step,
            Some(total_steps),
            format!("rebuilding {category} r.{}.{}", region.x, region.z),
        );
        let mut writer = RegionWriter::new();
        // Every chunk this region spills is length-prefixed and appended,
        // in write order, to one shared `.mcc` file (spec §4.2/§6) —
        // readers must later walk it in that same order.
        let mut external_payload = Vec::new();
        for relpath in chunk_paths {
            let (_, global) = parse_chunk_relpath(&relpath)
                .ok_or_else(|| CoreError::MalformedArtifactPath(relpath.clone()))?;
            let local = global.local_in_region();

            let timestamp = repo
                .read_at(target_commit, &format!("{MIRROR_DIR}/{relpath}.stamp.json"))?
                .and_then(|bytes| serde_json::from_slice::<Stamp>(&bytes).ok())
                .and_then(|stamp| stamp.original_last_write_utc.parse::<u32>().ok())
                .unwrap_or(0);

            let bytes = repo
                .read_at(target_commit, &format!("{MIRROR_DIR}/{relpath}"))?
                .ok_or_else(|| CoreError::UnknownCommit(target_commit.to_owned()))?;
            let text = String::from_utf8_lossy(&bytes);
            let compound = parse_snbt_compound(Path::new(&relpath), &text)?;
            if let Some(external) =
                writer.add_chunk(local, &compound, CompressionScheme::Zlib, timestamp, SpillPolicy::AllowExternal)?
            {
                external_payload.extend_from_slice(&(external.bytes.len() as u32).to_be_bytes());
                external_payload.extend_from_slice(&external.bytes);
            }
            report.chunks_written += 1;
        }
        let region_path = save_root.join(&category).join(format!("r.{}.{}.mca", region.x, region.z));
        crate::atomic::write_atomic(&region_path, &writer.finish())?;
        if !external_payload.is_empty() {
            let mcc_path = save_root.join(&category).join(gitmc_anvil::mcc_file_name(region));
            crate::atomic::write_atomic(&mcc_path, &external_payload)?;
            debug!("wrote external chunk file: {}", mcc_path.display());
        }
        debug!("wrote region file: {}", region_path.display());
        report.regions_written += 1;
    }

    info!(
        "rebuilt {}: {} documents, {} regions, {} chunks",
        save_root.display(),
        report.documents_written,
        report.regions_written,
        report.chunks_written
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::Repository;
    use gitmc_nbt::NbtCompound;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[test]
    fn stamp_skip_prevents_rewriting_unchanged_level_dat() {
        let dir = tempfile::tempdir().unwrap();
        let save_root = dir.path();

        let mut root = NbtCompound::new();
        root.insert("Data", NbtCompound::new());
        let mut raw = Vec::new();
        gitmc_nbt::write_named_compound(&mut raw, "", &root).unwrap();
        let gz = compress(CompressionScheme::GZip, &raw).unwrap();
        fs::write(save_root.join("level.dat"), &gz).unwrap();

        let reporter = ProgressReporter::for_test();
        let first = extract(save_root, "test", &reporter).unwrap();
        assert_eq!(first.documents_translated, 1);
        assert_eq!(first.documents_skipped, 0);

        let second = extract(save_root, "test", &reporter).unwrap();
        assert_eq!(second.documents_translated, 0);
        assert_eq!(second.documents_skipped, 1);
    }

    struct FakeRepo {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl Repository for FakeRepo {
        fn stage(&self, _paths: &[String]) -> Result<()> {
            Ok(())
        }
        fn commit(&self, _message: &str) -> Result<String> {
            Ok("deadbeef".to_owned())
        }
        fn head_hash(&self) -> Result<Option<String>> {
            Ok(Some("deadbeef".to_owned()))
        }
        fn read_at(&self, _commit: &str, relpath: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.files.lock().unwrap().get(relpath).cloned())
        }
        fn is_ancestor(&self, _ancestor: &str, _descendant: &str) -> Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn extract_then_rebuild_round_trips_a_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let save_root = dir.path();
        fs::create_dir_all(save_root.join("region")).unwrap();

        let mut compound = NbtCompound::new();
        compound.insert("xPos", NbtTag::Int(32));
        compound.insert("zPos", NbtTag::Int(-1));
        let mut writer = RegionWriter::new();
        writer
            .add_chunk(Point2::new(0, 31), &compound, CompressionScheme::Zlib, 42, SpillPolicy::Forbid)
            .unwrap();
        fs::write(save_root.join("region/r.1.-1.mca"), writer.finish()).unwrap();

        let reporter = ProgressReporter::for_test();
        let report = extract(save_root, "test", &reporter).unwrap();
        assert_eq!(report.chunks_translated, 1);

        let mirror_root = save_root.join(MIRROR_DIR);
        let mut files = HashMap::new();
        for entry in walkdir(&mirror_root) {
            let rel = entry.strip_prefix(save_root).unwrap().to_string_lossy().replace('\\', "/");
            files.insert(rel, fs::read(&entry).unwrap());
        }
        let repo = FakeRepo { files: Mutex::new(files) };

        fs::remove_file(save_root.join("region/r.1.-1.mca")).unwrap();
        let rebuild_report = rebuild(&repo, save_root, "deadbeef", &reporter).unwrap();
        assert_eq!(rebuild_report.chunks_written, 1);
        assert_eq!(rebuild_report.regions_written, 1);

        let mut reader = RegionReader::open(fs::File::open(save_root.join("region/r.1.-1.mca")).unwrap()).unwrap();
        let decoded = reader
            .get_chunk(Point2::new(0, 31), "unused", |_| panic!("no external chunk expected"))
            .unwrap();
        assert_eq!(decoded, compound);
    }

    /// Deterministic high-entropy filler so a zlib-compressed payload stays
    /// above the in-file sector budget and is forced to spill externally.
    fn pseudo_random_bytes(n: usize) -> Vec<i8> {
        let mut state: u32 = 0x2545F491;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xFF) as i8
            })
            .collect()
    }

    #[test]
    fn extract_then_rebuild_round_trips_an_oversized_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let save_root = dir.path();
        fs::create_dir_all(save_root.join("region")).unwrap();

        let mut compound = NbtCompound::new();
        compound.insert("xPos", NbtTag::Int(0));
        compound.insert("zPos", NbtTag::Int(0));
        compound.insert("blob", NbtTag::ByteArray(pseudo_random_bytes(1_100_000)));

        let mut writer = RegionWriter::new();
        let spilled = writer
            .add_chunk(Point2::new(0, 0), &compound, CompressionScheme::Zlib, 7, SpillPolicy::AllowExternal)
            .unwrap();
        let external = spilled.expect("payload should have spilled externally for this test to be meaningful");
        fs::write(save_root.join("region/r.0.0.mca"), writer.finish()).unwrap();
        let mut mcc_bytes = Vec::new();
        mcc_bytes.extend_from_slice(&(external.bytes.len() as u32).to_be_bytes());
        mcc_bytes.extend_from_slice(&external.bytes);
        fs::write(save_root.join("region/r.0.0.mcc"), &mcc_bytes).unwrap();

        let reporter = ProgressReporter::for_test();
        let report = extract(save_root, "test", &reporter).unwrap();
        assert_eq!(report.chunks_translated, 1);

        let mirror_root = save_root.join(MIRROR_DIR);
        let mut files = HashMap::new();
        for entry in walkdir(&mirror_root) {
            let rel = entry.strip_prefix(save_root).unwrap().to_string_lossy().replace('\\', "/");
            files.insert(rel, fs::read(&entry).unwrap());
        }
        let repo = FakeRepo { files: Mutex::new(files) };

        fs::remove_file(save_root.join("region/r.0.0.mca")).unwrap();
        fs::remove_file(save_root.join("region/r.0.0.mcc")).unwrap();
        let rebuild_report = rebuild(&repo, save_root, "deadbeef", &reporter).unwrap();
        assert_eq!(rebuild_report.chunks_written, 1);

        assert!(save_root.join("region/r.0.0.mcc").exists(), "rebuild must write the spilled .mcc payload");
        let mut reader = RegionReader::open(fs::File::open(save_root.join("region/r.0.0.mca")).unwrap()).unwrap();
        let mcc_name = gitmc_anvil::mcc_file_name(Point2::new(0, 0));
        let decoded = reader
            .get_chunk(Point2::new(0, 0), &mcc_name, |name| {
                fs::read(save_root.join("region").join(name)).map_err(gitmc_anvil::AnvilError::from)
            })
            .unwrap();
        assert_eq!(decoded, compound);
    }

    fn walkdir(dir: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    out.extend(walkdir(&path));
                } else {
                    out.push(path);
                }
            }
        }
        out
    }
}
