mod path_resolver;

use crate::file::{DirEntry, File, FileStat, Metadata, OpenOptions};
use crate::path::CanonicalPath;
use crate::physical_fs::path_resolver::{
    PathResolver, SandboxedPathResolver, UnrestrictedPathResolver,
};
use crate::util::{invalid_path, is_a_directory, not_a_directory};
use crate::FileSystem;
use normalize_path::NormalizePath;
use path_slash::PathExt;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The physical filesystem, backed by a root on the drive.
pub struct PhysicalFSImpl<R: PathResolver> {
    root: PathBuf,
    _marker: PhantomData<R>,
}

/// The physical filesystem, backed by a root on the drive. This filesystem will not protect against
/// directory traversal and very simply appends the target path to the root.
pub type PhysicalFS = PhysicalFSImpl<UnrestrictedPathResolver>;
/// The physical filesystem, backed by a root on the drive. This filesystem will perform basic
/// protections against directory traversal in the form of returning an error if a user tries to
/// escape the current directory.
pub type SandboxedPhysicalFS = PhysicalFSImpl<SandboxedPathResolver>;

impl<R: PathResolver> PhysicalFSImpl<R> {
    /// Creates a new physical file system at the given root.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().normalize(),
            _marker: PhantomData,
        }
    }

    /// Returns the root of the filesystem on the host.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> crate::Result<PathBuf> {
        R::resolve_path(&self.root, path)
    }
}

impl<R: PathResolver> FileSystem for PhysicalFSImpl<R> {
    fn create_dir(&self, path: &str) -> crate::Result<()> {
        fs::create_dir(self.resolve(path)?)
    }

    fn info(&self) -> crate::Result<String> {
        Ok(format!(
            "{} physical filesystem at '{}'",
            R::NAME,
            self.root.display()
        ))
    }

    fn list(
        &self,
        path: &str,
        recursive: bool,
    ) -> crate::Result<Box<dyn Iterator<Item = crate::Result<DirEntry>>>> {
        let directory = self.resolve(path)?;

        if recursive {
            return walk(directory);
        }

        Ok(Box::new(fs::read_dir(directory)?.map(|entry| {
            entry.and_then(|entry| {
                Ok(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    metadata: entry.metadata()?.into(),
                })
            })
        })))
    }

    fn open_file_options(&self, path: &str, options: &OpenOptions) -> crate::Result<Box<dyn File>> {
        let file = fs::OpenOptions::from(options).open(self.resolve(path)?)?;

        // directories can be opened for reading on some platforms
        if file.metadata()?.is_dir() {
            return Err(is_a_directory());
        }

        Ok(Box::new(file))
    }

    fn remove(&self, path: &str, recursive: bool) -> crate::Result<()> {
        if CanonicalPath::normalize(path).is_root() {
            return Err(invalid_path());
        }
        let host_path = self.resolve(path)?;

        let metadata = fs::symlink_metadata(&host_path)?;
        match (metadata.is_dir(), recursive) {
            (true, true) => fs::remove_dir_all(host_path),
            (true, false) => fs::remove_dir(host_path),
            (false, _) => fs::remove_file(host_path),
        }
    }

    fn rename(&self, from: &str, to: &str) -> crate::Result<()> {
        fs::rename(self.resolve(from)?, self.resolve(to)?)
    }

    fn stat(&self, path: &str) -> crate::Result<FileStat> {
        let metadata = fs::metadata(self.resolve(path)?)?;

        Ok(FileStat {
            filename: CanonicalPath::normalize(path).to_string(),
            metadata: metadata.into(),
        })
    }
}

/// Lists every entry below `directory`, depth-first. Names are relative to `directory` and separated by `/`. An
/// unreadable subdirectory yields an error item; the rest of the tree is still listed.
fn walk(directory: PathBuf) -> crate::Result<Box<dyn Iterator<Item = crate::Result<DirEntry>>>> {
    if !fs::metadata(&directory)?.is_dir() {
        return Err(not_a_directory());
    }

    // symbolic links to directories are listed but not followed
    let walker = WalkDir::new(&directory).min_depth(1).follow_links(false);
    Ok(Box::new(walker.into_iter().map(move |entry| -> crate::Result<DirEntry> {
        let entry = entry?;
        let name = entry
            .path()
            .strip_prefix(&directory)
            .map_err(|_| invalid_path())?
            .to_slash_lossy()
            .into_owned();

        Ok(DirEntry {
            name,
            metadata: entry.metadata()?.into(),
        })
    })))
}

impl File for fs::File {
    fn metadata(&self) -> crate::Result<Metadata> {
        self.metadata().map(Metadata::from)
    }
}
