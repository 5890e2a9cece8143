//! Atomic tile tree publication.
//!
//! Tiles are written to a private staging directory next to the public one
//! and only become visible through a single rename. On Unix the public path
//! `{output_root}/{map_id}` is a symlink to a generation directory; commit
//! creates a fresh link and renames it over the old one, which replaces the
//! whole tree in one step even when the old tree is non-empty.
//!
//! Sibling names inside the output root:
//!
//! ```text
//! {map_id}                 public entry (symlink on Unix)
//! {map_id}__tmp-{run}      staging, being written
//! {map_id}__gen-{run}      committed generation
//! {map_id}__lnk-{run}      link about to be renamed over {map_id}
//! {map_id}__old-{run}      legacy plain directory moved aside
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tileforge_core::config::{StorageConfig, TilingConfig};
use tileforge_core::types::id::{MapId, RESERVED_SEPARATOR};
use tileforge_pyramid::Tile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::PublishError;

const STAGING: &str = "tmp";
const GENERATION: &str = "gen";
const LINK: &str = "lnk";
const MOVED_ASIDE: &str = "old";

fn artifact_name(map_id: &MapId, kind: &str, run: &str) -> String {
    format!("{map_id}{RESERVED_SEPARATOR}{kind}-{run}")
}

/// Split `{map_id}__{kind}-{run}` into its map id and kind.
fn parse_artifact(name: &str) -> Option<(&str, &str)> {
    let (map_id, rest) = name.rsplit_once(RESERVED_SEPARATOR)?;
    let (kind, run) = rest.split_once('-')?;
    if map_id.is_empty() || run.is_empty() {
        return None;
    }
    matches!(kind, STAGING | GENERATION | LINK | MOVED_ASIDE).then_some((map_id, kind))
}

/// Create one directory level. Returns whether it was newly created.
fn ensure_dir(path: &Path) -> Result<bool, PublishError> {
    match fs::DirBuilder::new().create(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
        Err(e) => Err(PublishError::io("create tile directory", path, e)),
    }
}

/// Refresh a directory's mtime so `sweep` does not take it for abandoned.
#[cfg(unix)]
fn mark_in_use(dir: &Path) {
    let touched = fs::File::open(dir).and_then(|f| f.set_modified(SystemTime::now()));
    if let Err(e) = touched {
        debug!(path = %dir.display(), error = %e, "Failed to refresh directory mtime");
    }
}

#[cfg(not(unix))]
fn mark_in_use(_dir: &Path) {}

/// Publishes tile pyramids under one output root.
#[derive(Debug, Clone)]
pub struct AtomicPublisher {
    output_root: PathBuf,
    tile_size: u32,
}

impl AtomicPublisher {
    pub fn new(output_root: impl Into<PathBuf>, tile_size: u32) -> Self {
        Self {
            output_root: output_root.into(),
            tile_size,
        }
    }

    pub fn from_config(storage: &StorageConfig, tiling: &TilingConfig) -> Self {
        Self::new(&storage.output_root, tiling.tile_size)
    }

    /// Public path of a map's pyramid.
    pub fn published_path(&self, map_id: &MapId) -> PathBuf {
        self.output_root.join(map_id.as_str())
    }

    /// Write every tile into a fresh staging directory.
    ///
    /// Nothing public changes. On error the staging directory is removed
    /// before returning.
    pub fn stage<I>(&self, map_id: &MapId, tiles: I) -> Result<StagedPyramid, PublishError>
    where
        I: IntoIterator<Item = Tile>,
    {
        fs::create_dir_all(&self.output_root)
            .map_err(|e| PublishError::io("create output root", &self.output_root, e))?;

        let run = Uuid::new_v4().simple().to_string();
        let dir = self.output_root.join(artifact_name(map_id, STAGING, &run));
        fs::create_dir(&dir).map_err(|e| PublishError::io("create staging directory", &dir, e))?;

        let mut staged = StagedPyramid {
            map_id: map_id.clone(),
            output_root: self.output_root.clone(),
            run,
            dir,
            tile_count: 0,
            committed: false,
        };

        for tile in tiles {
            self.write_tile(&staged.dir, &tile)?;
            staged.tile_count += 1;
        }

        debug!(
            map_id = %map_id,
            tiles = staged.tile_count,
            staging = %staged.dir.display(),
            "Staged tile tree"
        );
        Ok(staged)
    }

    /// Stage and commit in one call.
    pub fn publish<I>(&self, map_id: &MapId, tiles: I) -> Result<PublishedPyramid, PublishError>
    where
        I: IntoIterator<Item = Tile>,
    {
        self.stage(map_id, tiles)?.commit()
    }

    fn write_tile(&self, root: &Path, tile: &Tile) -> Result<(), PublishError> {
        let (width, height) = (tile.raster.width(), tile.raster.height());
        if width != self.tile_size || height != self.tile_size {
            return Err(PublishError::TileSize {
                coord: tile.coord,
                width,
                height,
                expected: self.tile_size,
            });
        }

        let bytes = tile
            .raster
            .encode_png()
            .map_err(|source| PublishError::Encode {
                coord: tile.coord,
                source,
            })?;

        // Never recreate the staging root: if it vanished, staging must fail.
        let zoom_dir = root.join(tile.coord.zoom.to_string());
        let col_dir = zoom_dir.join(tile.coord.col.to_string());
        ensure_dir(&zoom_dir)?;
        if ensure_dir(&col_dir)? {
            mark_in_use(root);
        }

        let path = root.join(tile.coord.relative_path());
        fs::write(&path, bytes).map_err(|e| PublishError::io("write tile", &path, e))
    }

    /// Remove abandoned staging, generation and moved-aside directories.
    ///
    /// Only entries last modified more than `max_age` ago and not referenced
    /// by a published link are touched. Returns the number removed.
    pub fn sweep(&self, max_age: Duration) -> Result<usize, PublishError> {
        let entries = match fs::read_dir(&self.output_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(PublishError::io("list", &self.output_root, e)),
        };
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut live = Vec::new();
        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PublishError::io("list", &self.output_root, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Pending `__lnk-` links count too: their generation is mid-commit.
            if let Ok(target) = fs::read_link(entry.path()) {
                live.push(self.output_root.join(target));
            }
            if parse_artifact(&name).is_some() {
                candidates.push(entry.path());
            }
        }

        let mut removed = 0;
        for path in candidates {
            if live.contains(&path) {
                continue;
            }
            let meta = match fs::symlink_metadata(&path) {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            match meta.modified() {
                Ok(modified) if modified <= cutoff => {}
                _ => continue,
            }
            let result = if meta.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to sweep artifact"),
            }
        }

        if removed > 0 {
            info!(
                output_root = %self.output_root.display(),
                removed,
                "Swept stale publish artifacts"
            );
        }
        Ok(removed)
    }
}

/// A fully written tile tree that is not public yet.
///
/// Dropping it without calling [`commit`](Self::commit) deletes the staged
/// files.
#[derive(Debug)]
pub struct StagedPyramid {
    map_id: MapId,
    output_root: PathBuf,
    run: String,
    dir: PathBuf,
    tile_count: u64,
    committed: bool,
}

impl StagedPyramid {
    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn tile_count(&self) -> u64 {
        self.tile_count
    }

    /// Make the staged tree the published one.
    ///
    /// The previous tree stays servable until the swap and is deleted after
    /// it. Last commit wins when several runs publish the same map.
    #[cfg(unix)]
    pub fn commit(mut self) -> Result<PublishedPyramid, PublishError> {
        let public = self.output_root.join(self.map_id.as_str());
        let generation_name = artifact_name(&self.map_id, GENERATION, &self.run);
        let generation = self.output_root.join(&generation_name);

        fs::rename(&self.dir, &generation)
            .map_err(|e| PublishError::io("rename staging directory", &self.dir, e))?;
        self.dir = generation;
        mark_in_use(&self.dir);

        let link = self.output_root.join(artifact_name(&self.map_id, LINK, &self.run));
        std::os::unix::fs::symlink(&generation_name, &link)
            .map_err(|e| PublishError::io("create link", &link, e))?;

        let previous = match self.detach_previous(&public) {
            Ok(previous) => previous,
            Err(e) => {
                let _ = fs::remove_file(&link);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&link, &public) {
            let _ = fs::remove_file(&link);
            if let Previous::MovedAside(aside) = &previous {
                let _ = fs::rename(aside, &public);
            }
            return Err(PublishError::io("swap link", &public, e));
        }
        self.committed = true;

        match previous {
            Previous::Generation(old) | Previous::MovedAside(old) if old != self.dir => {
                if let Err(e) = fs::remove_dir_all(&old) {
                    warn!(
                        map_id = %self.map_id,
                        path = %old.display(),
                        error = %e,
                        "Failed to remove previous generation"
                    );
                }
            }
            _ => {}
        }

        Ok(self.published(public))
    }

    /// Make the staged tree the published one.
    ///
    /// Without symlinks the old tree is moved aside first, so the public
    /// path is briefly absent during the swap.
    #[cfg(not(unix))]
    pub fn commit(mut self) -> Result<PublishedPyramid, PublishError> {
        let public = self.output_root.join(self.map_id.as_str());
        let previous = self.detach_previous(&public)?;

        if let Err(e) = fs::rename(&self.dir, &public) {
            if let Previous::MovedAside(aside) = &previous {
                let _ = fs::rename(aside, &public);
            }
            return Err(PublishError::io("rename staging directory", &self.dir, e));
        }
        self.committed = true;

        if let Previous::MovedAside(old) = previous {
            if let Err(e) = fs::remove_dir_all(&old) {
                warn!(map_id = %self.map_id, path = %old.display(), error = %e, "Failed to remove previous tree");
            }
        }

        Ok(self.published(public))
    }

    /// Figure out what currently sits at the public path. A plain
    /// directory is moved out of the way; a link is left for the swap.
    fn detach_previous(&self, public: &Path) -> Result<Previous, PublishError> {
        let meta = match fs::symlink_metadata(public) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Previous::None),
            Err(e) => return Err(PublishError::io("inspect", public, e)),
        };

        if meta.file_type().is_symlink() {
            let target =
                fs::read_link(public).map_err(|e| PublishError::io("read link", public, e))?;
            return Ok(Previous::Generation(self.output_root.join(target)));
        }

        let aside = self
            .output_root
            .join(artifact_name(&self.map_id, MOVED_ASIDE, &self.run));
        fs::rename(public, &aside).map_err(|e| PublishError::io("move aside", public, e))?;
        debug!(map_id = %self.map_id, aside = %aside.display(), "Moved previous tree aside");
        Ok(Previous::MovedAside(aside))
    }

    fn published(&self, root: PathBuf) -> PublishedPyramid {
        info!(
            map_id = %self.map_id,
            generation = %self.run,
            tiles = self.tile_count,
            "Published tile tree"
        );
        PublishedPyramid {
            map_id: self.map_id.clone(),
            root,
            tile_count: self.tile_count,
            generation: self.run.clone(),
        }
    }
}

impl Drop for StagedPyramid {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(map_id = %self.map_id, path = %self.dir.display(), "Discarded staged tree"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                map_id = %self.map_id,
                path = %self.dir.display(),
                error = %e,
                "Failed to discard staged tree"
            ),
        }
    }
}

enum Previous {
    None,
    Generation(PathBuf),
    MovedAside(PathBuf),
}

/// A committed, publicly visible pyramid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPyramid {
    pub map_id: MapId,
    /// Public path of the tree, `{output_root}/{map_id}`.
    pub root: PathBuf,
    pub tile_count: u64,
    /// Run suffix of the committed generation.
    pub generation: String,
}
