use crate::file::{DirEntry, File, FileStat, OpenOptions};
use crate::physical_fs::PhysicalFS;
use crate::profiler::{default_profile_path, Profiler, ProfilingGuard};
use crate::scheme::{from_scheme, from_url, SharedFileSystem};
use crate::util::{invalid_input, not_a_directory};
use crate::zip_fs::ContainerFS;
use crate::FileSystem;
use std::sync::Arc;

/// A default filesystem that plain paths are resolved against, with a profiler for every call made through it.
///
/// Paths with a scheme (`file:///data/x`) bypass the default filesystem and go to a filesystem created for that
/// scheme. Everything else is relative to the root set with [`Context::set_root`], which starts out as the working
/// directory.
///
/// ```
/// use container_fs::context::Context;
/// use container_fs::memory_fs::MemoryFS;
/// use container_fs::FileSystem;
///
/// let mut context = Context::new();
/// context.set_root_fs(Box::new(MemoryFS::default()));
/// context.create_dir("data").unwrap();
/// assert!(context.is_dir("data").unwrap());
/// assert_eq!(context.root_dir(), "");
/// ```
pub struct Context {
    fs: SharedFileSystem,
    root: String,
    profiler: Arc<Profiler>,
}

impl Context {
    /// Creates a context rooted at the working directory.
    pub fn new() -> Self {
        Self {
            fs: Box::new(PhysicalFS::new("")),
            root: String::new(),
            profiler: Arc::new(Profiler::new()),
        }
    }

    /// Makes the directory at `url` the default root. The URL is interpreted like [`from_url`], so a `.zip` path
    /// mounts the archive. Fails unless the URL names a directory.
    ///
    /// # Arguments
    /// `url`: The new root.
    pub fn set_root(&mut self, url: &str) -> crate::Result<()> {
        let fs = from_url(url)?;
        if !fs.is_dir("")? {
            return Err(not_a_directory());
        }

        tracing::debug!(root = url, "changed default root");
        self.fs = fs;
        self.root = url.to_owned();
        Ok(())
    }

    /// Makes `fs` the default filesystem. The root directory is then the root of `fs`.
    pub fn set_root_fs(&mut self, fs: SharedFileSystem) {
        self.fs = fs;
        self.root.clear();
    }

    /// Returns the URL last passed to [`Context::set_root`], or an empty string for the working directory or a
    /// filesystem set with [`Context::set_root_fs`].
    pub fn root_dir(&self) -> &str {
        &self.root
    }

    pub fn profiler(&self) -> &Arc<Profiler> {
        &self.profiler
    }

    /// Records every call made through this context until the guard is dropped.
    pub fn profiling(&self) -> ProfilingGuard<'_> {
        self.profiler.profiling()
    }

    /// Writes the calls recorded so far to the default profile location.
    pub fn dump_profile(&self) -> crate::Result<()> {
        self.profiler.dump(default_profile_path())
    }

    fn dispatch<R>(
        &self,
        name: &str,
        path: &str,
        f: impl FnOnce(&dyn FileSystem, &str) -> crate::Result<R>,
    ) -> crate::Result<R> {
        let args = vec![self.root.clone(), path.to_owned()];
        self.profiler.record(name, args, || -> crate::Result<R> {
            match path.split_once("://") {
                Some((scheme, path)) => f(from_scheme(scheme, "/")?.as_ref(), path),
                None => f(self.fs.as_ref(), path),
            }
        })
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for Context {
    fn create_dir(&self, path: &str) -> crate::Result<()> {
        self.dispatch("create_dir", path, |fs, path| fs.create_dir(path))
    }

    fn info(&self) -> crate::Result<String> {
        self.dispatch("info", "", |fs, _| fs.info())
    }

    fn list(
        &self,
        path: &str,
        recursive: bool,
    ) -> crate::Result<Box<dyn Iterator<Item = crate::Result<DirEntry>>>> {
        self.dispatch("list", path, |fs, path| fs.list(path, recursive))
    }

    fn open_file_options(&self, path: &str, options: &OpenOptions) -> crate::Result<Box<dyn File>> {
        self.dispatch("open", path, |fs, path| fs.open_file_options(path, options))
    }

    fn remove(&self, path: &str, recursive: bool) -> crate::Result<()> {
        self.dispatch("remove", path, |fs, path| fs.remove(path, recursive))
    }

    fn rename(&self, from: &str, to: &str) -> crate::Result<()> {
        let scheme = |path: &str| path.split_once("://").map(|(scheme, _)| scheme.to_owned());
        if scheme(from) != scheme(to) {
            return Err(invalid_input("cannot rename across filesystems"));
        }
        let to = to.split_once("://").map_or(to, |(_, path)| path);

        self.dispatch("rename", from, |fs, from| fs.rename(from, to))
    }

    fn stat(&self, path: &str) -> crate::Result<FileStat> {
        self.dispatch("stat", path, |fs, path| fs.stat(path))
    }

    fn close(&self) -> crate::Result<()> {
        self.fs.close()
    }

    fn create_dir_all(&self, path: &str) -> crate::Result<()> {
        self.dispatch("create_dir_all", path, |fs, path| fs.create_dir_all(path))
    }

    fn exists(&self, path: &str) -> crate::Result<bool> {
        self.dispatch("exists", path, |fs, path| fs.exists(path))
    }

    fn is_dir(&self, path: &str) -> crate::Result<bool> {
        self.dispatch("is_dir", path, |fs, path| fs.is_dir(path))
    }

    fn open_as_container(&self, path: &str, mode: &str) -> crate::Result<ContainerFS> {
        self.dispatch("open_as_container", path, |fs, path| {
            fs.open_as_container(path, mode)
        })
    }
}
