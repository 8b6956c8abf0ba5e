//! Read-only mapping of the segment file plus its advisory lock.
//!
//! The only unsafe code in the relay lives here.

#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};

use crate::error::{RegionError, RegionResult};

/// Attached segment: open file handle and its read-only mapping.
pub(crate) struct SegmentMapping {
    file: File,
    map: Mmap,
    path: PathBuf,
}

impl SegmentMapping {
    /// Opens and maps the segment at `path`.
    pub(crate) fn open(path: &Path) -> RegionResult<Self> {
        let file = OpenOptions::new().read(true).open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                RegionError::NotFound(path.to_path_buf())
            } else {
                RegionError::Io(e)
            }
        })?;

        // SAFETY: The mapping is read-only and never handed out beyond the
        // lifetime of `self`:
        // - the producer only writes while holding the same advisory lock,
        //   and every read of `map` happens inside `with_locked`
        // - the producer sizes the segment at creation and never shrinks it
        //   while attached; a size change is caught by `is_stale` before the
        //   next read and the segment is remapped
        let map = unsafe { MmapOptions::new().map(&file)? };

        Ok(Self {
            file,
            map,
            path: path.to_path_buf(),
        })
    }

    /// Mapped size in bytes.
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file no longer has the size it had when mapped (the
    /// producer created it, then sized it after we attached).
    pub(crate) fn is_stale(&self) -> bool {
        match self.file.metadata() {
            Ok(meta) => u64::try_from(self.map.len()).map_or(true, |len| len != meta.len()),
            Err(_) => true,
        }
    }

    /// Runs `f` over the mapped bytes while holding the segment lock.
    ///
    /// The lock is released when `f` returns, or if it panics.
    pub(crate) fn with_locked<T>(&self, f: impl FnOnce(&[u8]) -> T) -> RegionResult<T> {
        let _guard = SegmentLock::acquire(&self.file)?;
        Ok(f(&self.map))
    }
}

/// Held exclusive lock on the segment file.
struct SegmentLock<'a> {
    file: &'a File,
}

impl<'a> SegmentLock<'a> {
    fn acquire(file: &'a File) -> io::Result<Self> {
        fs2::FileExt::lock_exclusive(file)?;
        Ok(Self { file })
    }
}

impl Drop for SegmentLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(self.file) {
            tracing::warn!("failed to release segment lock: {e}");
        }
    }
}
