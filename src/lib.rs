//! # Container filesystems for Rust
//! This crate gives local disks, in-memory trees and archive files one filesystem interface, and lets an archive
//! be mounted and browsed as a filesystem of its own, including archives nested inside archives.
//!
//! `container-fs` has the following FileSystems implemented out of the box:
//! - `PhysicalFS`: A read-write physical filesystem mounted at a directory. Path traversal outside the root is permitted.
//! - `SandboxedPhysicalFS`: A read-write physical filesystem that guards against traversal through backtracking and symbolic link
//! traversal.
//! - `MemoryFS`: A read-write in-memory filesystem.
//! - `ZipFS`: A read-only filesystem that mounts a ZIP archive, backed by the `zip` crate.
//! - `TarFS` A read-only filesystem that mounts a Tarball, backed by the `tar` crate.
//! - `ProfiledFS`: A wrapper that times every call on another filesystem, dumpable as a Chrome trace.
//!
//! `Context` resolves plain paths against a default root and URLs against the filesystem for their scheme.
//!
//! Archives store a flat list of member names. `ZipFS` and `TarFS` infer the directory tree from those names, so a
//! directory exists as soon as any member lives below it, and paths are accepted in any spelling that normalizes to
//! the same location (`a//b/../b/`, `/a/b` and `a/b` all name the same member).
//!
//! ```
//! use container_fs::memory_fs::MemoryFS;
//! use container_fs::FileSystem;
//! use std::io::Write;
//!
//! let fs = MemoryFS::default();
//! fs.create_dir_all("data/raw").unwrap();
//! write!(fs.create_file("data/raw/sample").unwrap(), "hello").unwrap();
//!
//! assert!(fs.is_dir("data/").unwrap());
//! assert_eq!(fs.open("data//raw/./sample", "r").unwrap().read_into_string().unwrap(), "hello");
//! ```

use crate::file::{DirEntry, Encoding, File, FileStat, OpenMode, OpenOptions, TextFile};
use crate::zip_fs::{ContainerFS, ZipFS};
use mockall::automock;
use std::io::ErrorKind;

pub use error::*;

/// A file system with a directory tree.
#[automock]
pub trait FileSystem {
    /// Creates a directory at `path`.
    fn create_dir(&self, path: &str) -> Result<()>;
    /// Returns a short human-readable description of the filesystem.
    fn info(&self) -> Result<String>;
    /// Lists the files and folders contained in the directory denoted by `path`. Names are relative to `path`. When
    /// `recursive` is set, every entry at any depth below `path` is listed, with `/`-separated names.
    fn list(
        &self,
        path: &str,
        recursive: bool,
    ) -> Result<Box<dyn Iterator<Item = Result<DirEntry>>>>;
    /// Opens a file at `path` with options `options`.
    fn open_file_options(&self, path: &str, options: &OpenOptions) -> Result<Box<dyn File>>;
    /// Removes the file or directory at `path`. Directories must be empty unless `recursive` is set.
    fn remove(&self, path: &str, recursive: bool) -> Result<()>;
    /// Renames the file or directory at `from` to `to`.
    fn rename(&self, from: &str, to: &str) -> Result<()>;
    /// Returns the name and metadata of the file/folder at `path`.
    fn stat(&self, path: &str) -> Result<FileStat>;

    /// Releases any resources held by the filesystem. Closing twice is not an error.
    fn close(&self) -> Result<()> {
        Ok(())
    }
    /// Creates a directory `path` and all of its parents.
    fn create_dir_all(&self, path: &str) -> Result<()> {
        util::create_dir_all(self, path)
    }
    /// Creates a file at `path` in write mode. The file will be opened in truncate mode, so all contents will be
    /// overwritten. If this is not desirable, use `open_file` directly.
    fn create_file(&self, path: &str) -> Result<Box<dyn File>> {
        self.open_file_options(path, &OpenOptions::default().create(true).truncate(true))
    }
    /// Returns `Ok(true)` or `Ok(false)` if a file or folder at `path` does or does not exist, and `Err(_)` if the
    /// presence cannot be verified. A path below a file does not exist.
    fn exists(&self, path: &str) -> Result<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(err) if is_missing(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }
    /// Returns `Ok(true)` if `path` is an existing directory. Missing paths are not an error.
    fn is_dir(&self, path: &str) -> Result<bool> {
        match self.stat(path) {
            Ok(stat) => Ok(stat.is_dir()),
            Err(err) if is_missing(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }
    /// Opens a file with a mode string such as `"r"`, `"rb"` or `"w"`. Text modes decode UTF-8 as the file is read.
    fn open(&self, path: &str, mode: &str) -> Result<Box<dyn File>> {
        self.open_with_encoding(path, mode, Encoding::default())
    }
    /// Opens a file with a mode string, decoding text modes with `encoding`.
    fn open_with_encoding(&self, path: &str, mode: &str, encoding: Encoding) -> Result<Box<dyn File>> {
        let mode = OpenMode::parse(mode)?;
        let file = self.open_file_options(path, &mode.options)?;

        if mode.text {
            Ok(Box::new(TextFile::new(file, encoding)))
        } else {
            Ok(file)
        }
    }
    /// Opens the ZIP archive at `path` and mounts it as a read-only filesystem. `mode` must be a reading mode such as
    /// `"r"` or `"rb"`; anything that writes is not supported.
    fn open_as_container(&self, path: &str, mode: &str) -> Result<ContainerFS> {
        container_mode(mode)?;
        ZipFS::with_name(self.open_file(path)?, path)
    }
    /// Opens a file at `path` for reading.
    fn open_file(&self, path: &str) -> Result<Box<dyn File>> {
        self.open_file_options(path, &OpenOptions::default())
    }
}

/// Returns true for errors meaning that nothing exists at a path.
fn is_missing(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Checks that `mode` opens a container for reading.
pub(crate) fn container_mode(mode: &str) -> Result<()> {
    let mode = OpenMode::parse(mode)?;
    if mode.options.is_mutating() {
        return Err(util::not_supported());
    }

    Ok(())
}

pub mod archive_fs;
pub mod context;
pub mod error;
pub mod file;
pub mod fork;
pub mod index;
pub mod memory_fs;
pub mod path;
pub mod physical_fs;
pub mod profiler;
pub mod scheme;
pub mod tar_fs;
mod tree;
pub mod util;
pub mod zip_fs;
