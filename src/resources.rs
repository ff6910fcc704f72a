//! Cached asset loading
//!
//! Assets are loaded once per path and shared through `Rc`. A failed first load
//! surfaces as [`GameError::FileLoad`] carrying the path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::UVec2;

use crate::error::{GameError, Result};

/// Anything that can be loaded from a file on disk
pub trait Resource: Sized {
    fn load_from_file(path: &Path) -> Result<Self>;
}

/// A texture known by its path and pixel dimensions
///
/// Pixels never leave the file: the canvas backend owns GPU uploads, the
/// simulation only needs sizes to cut sprite sheets into frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub path: PathBuf,
    pub size: UVec2,
}

impl Texture {
    /// Build a texture record without touching the filesystem
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            size: UVec2::new(width, height),
        }
    }

    /// Size of one frame of a sheet laid out as `columns x rows`
    pub fn frame_size(&self, columns: u32, rows: u32) -> UVec2 {
        UVec2::new(self.size.x / columns.max(1), self.size.y / rows.max(1))
    }
}

impl Resource for Texture {
    fn load_from_file(path: &Path) -> Result<Self> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            log::warn!("Texture {} failed to decode: {}", path.display(), e);
            match e {
                image::ImageError::IoError(io) => GameError::file_load_io(path, io),
                _ => GameError::file_load(path),
            }
        })?;
        Ok(Self::new(path, width, height))
    }
}

/// Path-keyed cache for one resource type
#[derive(Debug)]
pub struct ResourceCache<T> {
    root: PathBuf,
    entries: HashMap<PathBuf, Rc<T>>,
}

impl<T: Resource> ResourceCache<T> {
    /// Create a cache resolving relative paths against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Get a resource, loading it on first use
    pub fn get(&mut self, path: impl AsRef<Path>) -> Result<Rc<T>> {
        let full = self.resolve(path.as_ref());
        if let Some(found) = self.entries.get(&full) {
            log::trace!("Resource {} found in cache", full.display());
            return Ok(Rc::clone(found));
        }

        log::debug!("Resource {} not cached, loading", full.display());
        let loaded = Rc::new(T::load_from_file(&full)?);
        self.entries.insert(full, Rc::clone(&loaded));
        Ok(loaded)
    }

    /// Drop a cached entry (live `Rc` handles keep their copy)
    pub fn unload(&mut self, path: impl AsRef<Path>) {
        let full = self.resolve(path.as_ref());
        self.entries.remove(&full);
    }

    /// Force a fresh load of one path
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<Rc<T>> {
        self.unload(path.as_ref());
        self.get(path)
    }

    /// Reload every cached path
    ///
    /// The new entries replace the cache only once all of them loaded; on the
    /// first failure the cache keeps its previous contents.
    pub fn reload_all(&mut self) -> Result<()> {
        let mut paths: Vec<PathBuf> = self.entries.keys().cloned().collect();
        paths.sort();
        let mut fresh = HashMap::with_capacity(paths.len());
        for path in paths {
            let loaded = Rc::new(T::load_from_file(&path)?);
            fresh.insert(path, loaded);
        }
        self.entries = fresh;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
