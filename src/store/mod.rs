//! Manifest store: on-disk generation history for one sealed root.
//!
//! Each sealed root carries a sibling `ascmhl/` directory holding one JSON
//! document per generation, named `NNNN_<rootname>_YYYY-MM-DD_HHMMSS.json`.
//! Appends are atomic (temp file + fsync + rename) so observers enumerating
//! generations never see a torn document.

pub mod generation;

pub use generation::{ChildHistoryRef, DirectoryEntry, FileEntry, Generation, UnsupportedNote};

use crate::error::SealError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Name of the manifest store directory inside a sealed root.
pub const MANIFEST_FOLDER_NAME: &str = "ascmhl";

const MANIFEST_EXTENSION: &str = "json";
const LOCK_FILE_NAME: &str = ".lock";

/// Manifest store for one sealed root.
pub struct ManifestStore {
    root: PathBuf,
    folder: PathBuf,
    root_name: String,
}

impl ManifestStore {
    /// Open the store at a sealed root. The manifest folder itself may not
    /// exist yet; it is created on first append.
    pub fn open(root: &Path) -> Result<Self, SealError> {
        let root_name = root
            .file_name()
            .map(|n| crate::tree::path::normalize_name(n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "root".to_string());
        Ok(Self {
            folder: root.join(MANIFEST_FOLDER_NAME),
            root: root.to_path_buf(),
            root_name,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// A directory is a sealed root iff it directly contains a manifest
    /// folder with at least one generation file.
    pub fn is_sealed_root(path: &Path) -> bool {
        let folder = path.join(MANIFEST_FOLDER_NAME);
        if !folder.is_dir() {
            return false;
        }
        match fs::read_dir(&folder) {
            Ok(entries) => entries.flatten().any(|e| {
                parse_generation_number(&e.file_name().to_string_lossy()).is_some()
            }),
            Err(_) => false,
        }
    }

    /// Find sealed roots strictly beneath `under`, without descending past a
    /// sealed-root boundary. The closed set is computed once before a walk.
    pub fn locate_nested_roots(under: &Path) -> Result<Vec<PathBuf>, SealError> {
        let mut found = Vec::new();
        let mut it = WalkDir::new(under).follow_links(false).into_iter();
        while let Some(entry) = it.next() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| under.to_path_buf());
                SealError::io(path, e.into())
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            if path == under {
                continue;
            }
            if entry.file_name().to_string_lossy() == MANIFEST_FOLDER_NAME {
                it.skip_current_dir();
                continue;
            }
            if Self::is_sealed_root(path) {
                found.push(path.to_path_buf());
                it.skip_current_dir();
            }
        }
        found.sort();
        Ok(found)
    }

    /// Generation numbers present in the store, ascending. Validates the
    /// 1..N contiguity invariant.
    pub fn list_generations(&self) -> Result<Vec<u64>, SealError> {
        Ok(self.manifest_files()?.into_iter().map(|(n, _)| n).collect())
    }

    /// Load one generation document.
    pub fn load(&self, number: u64) -> Result<Generation, SealError> {
        let files = self.manifest_files()?;
        let (_, path) = files
            .iter()
            .find(|(n, _)| *n == number)
            .ok_or_else(|| self.corrupt(format!("generation {} not found", number)))?;
        self.load_document(number, path)
    }

    /// Load the full history 1..N, validating the chain invariants: gap-free
    /// numbering and each generation referencing exactly its predecessor.
    pub fn load_all(&self) -> Result<Vec<Generation>, SealError> {
        let mut generations = Vec::new();
        for (number, path) in self.manifest_files()? {
            let generation = self.load_document(number, &path)?;
            let expected_previous = generations.last().map(|g: &Generation| g.generation);
            if generation.previous != expected_previous {
                return Err(self.corrupt(format!(
                    "generation {} references previous {:?}, expected {:?}",
                    number, generation.previous, expected_previous
                )));
            }
            generations.push(generation);
        }
        Ok(generations)
    }

    /// Append the next generation atomically: write a temp file, fsync,
    /// rename into the sequence. Partially written documents never appear in
    /// `list_generations`. Returns the path of the written manifest.
    pub fn append(&self, generation: &Generation) -> Result<PathBuf, SealError> {
        let latest = self.list_generations()?.last().copied();
        let expected = latest.unwrap_or(0) + 1;
        if generation.generation != expected || generation.previous != latest {
            return Err(self.corrupt(format!(
                "refusing to append generation {} (previous {:?}) after {:?}",
                generation.generation, generation.previous, latest
            )));
        }

        fs::create_dir_all(&self.folder).map_err(|e| SealError::io(&self.folder, e))?;

        let filename = format!(
            "{:04}_{}_{}.{}",
            generation.generation,
            self.root_name,
            generation.created_at.format("%Y-%m-%d_%H%M%S"),
            MANIFEST_EXTENSION
        );
        let final_path = self.folder.join(&filename);
        let temp_path = self.folder.join(format!("{}.tmp", filename));

        let json = serde_json::to_vec_pretty(generation)
            .map_err(|e| self.corrupt(format!("failed to serialize generation: {}", e)))?;

        let mut file = File::create(&temp_path).map_err(|e| SealError::io(&temp_path, e))?;
        file.write_all(&json).map_err(|e| SealError::io(&temp_path, e))?;
        file.sync_all().map_err(|e| SealError::io(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            SealError::io(&final_path, e)
        })?;

        info!(
            root = %self.root.display(),
            generation = generation.generation,
            manifest = %filename,
            "appended generation"
        );
        Ok(final_path)
    }

    /// Take the advisory seal lock for this store. Blocks while another seal
    /// holds it; released on drop. The atomic append guarantees no torn
    /// generation even when callers skip the lock.
    pub fn lock(&self) -> Result<StoreLock, SealError> {
        fs::create_dir_all(&self.folder).map_err(|e| SealError::io(&self.folder, e))?;
        let lock_path = self.folder.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| SealError::io(&lock_path, e))?;
        file.lock_exclusive().map_err(|e| SealError::io(&lock_path, e))?;
        debug!(path = %lock_path.display(), "acquired seal lock");
        Ok(StoreLock { file })
    }

    /// Enumerate manifest files as (generation number, path), ascending, and
    /// validate contiguity.
    fn manifest_files(&self) -> Result<Vec<(u64, PathBuf)>, SealError> {
        if !self.folder.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let entries = fs::read_dir(&self.folder).map_err(|e| SealError::io(&self.folder, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| SealError::io(&self.folder, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(number) = parse_generation_number(&name) {
                files.push((number, entry.path()));
            }
        }
        files.sort_by_key(|(n, _)| *n);

        for (index, (number, path)) in files.iter().enumerate() {
            let expected = index as u64 + 1;
            if *number != expected {
                return Err(self.corrupt(format!(
                    "generation sequence has a gap: expected {:04}, found {:04} ({})",
                    expected,
                    number,
                    path.display()
                )));
            }
        }
        Ok(files)
    }

    fn load_document(&self, number: u64, path: &Path) -> Result<Generation, SealError> {
        let bytes = fs::read(path).map_err(|e| SealError::io(path, e))?;
        let generation: Generation = serde_json::from_slice(&bytes)
            .map_err(|e| self.corrupt(format!("cannot parse {}: {}", path.display(), e)))?;
        if generation.generation != number {
            return Err(self.corrupt(format!(
                "{} claims generation {} but is numbered {:04}",
                path.display(),
                generation.generation,
                number
            )));
        }
        Ok(generation)
    }

    fn corrupt(&self, reason: String) -> SealError {
        SealError::corrupt(&self.folder, reason)
    }
}

/// Advisory lock on a manifest store, held for the duration of a seal.
pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Parse the zero-padded generation number from a manifest filename.
/// Returns `None` for anything that is not a generation file (lock files,
/// temp files, foreign debris).
fn parse_generation_number(filename: &str) -> Option<u64> {
    let rest = filename.strip_suffix(&format!(".{}", MANIFEST_EXTENSION))?;
    let (digits, _) = rest.split_once('_')?;
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
