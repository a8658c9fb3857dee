use crate::path::CanonicalPath;
use crate::util::{not_a_directory, not_found};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// A directory in tree-based filesystem. Children are kept sorted by name.
pub type Directory<T> = BTreeMap<String, Entry<T>>;

/// A node in the file tree.
#[derive(Debug)]
pub enum Entry<T> {
    Directory(Directory<T>),
    UserData(T),
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self::Directory(Directory::default())
    }
}

impl<T> Entry<T> {
    /// Returns the entry at `path` below this one.
    pub fn get(&self, path: &CanonicalPath) -> crate::Result<&Entry<T>> {
        let mut entry = self;
        for segment in path.segments() {
            let Entry::Directory(directory) = entry else {
                return Err(not_a_directory());
            };
            entry = directory.get(segment).ok_or_else(not_found)?;
        }

        Ok(entry)
    }

    /// Returns the entry at `path` below this one, mutably.
    pub fn get_mut(&mut self, path: &CanonicalPath) -> crate::Result<&mut Entry<T>> {
        let mut entry = self;
        for segment in path.segments() {
            let Entry::Directory(directory) = entry else {
                return Err(not_a_directory());
            };
            entry = directory.get_mut(segment).ok_or_else(not_found)?;
        }

        Ok(entry)
    }

    /// Returns the directory at `path` below this one.
    pub fn directory_mut(&mut self, path: &CanonicalPath) -> crate::Result<&mut Directory<T>> {
        match self.get_mut(path)? {
            Entry::Directory(directory) => Ok(directory),
            Entry::UserData(_) => Err(not_a_directory()),
        }
    }

    /// Calls `f` with every entry below this one, depth-first in name order. Names are relative to this entry.
    pub fn walk<F: FnMut(&str, &Entry<T>)>(&self, f: &mut F) {
        self.walk_prefixed("", f)
    }

    fn walk_prefixed<F: FnMut(&str, &Entry<T>)>(&self, prefix: &str, f: &mut F) {
        let Entry::Directory(directory) = self else {
            return;
        };

        for (name, child) in directory {
            let name = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            f(&name, child);
            child.walk_prefixed(&name, f);
        }
    }
}

/// A tree-based filesystem with directories and other data.
pub struct FilesystemTree<T> {
    root: Mutex<Entry<T>>,
}

impl<T> FilesystemTree<T> {
    /// Calls `f` with the root entry while holding the lock on the whole tree.
    ///
    /// # Arguments
    /// `f`: The function.
    pub fn with_root<R, F: FnOnce(&mut Entry<T>) -> R>(&self, f: F) -> R {
        f(&mut self.root.lock())
    }

    /// Calls `f` with the directory at `path`, only if it is located.
    ///
    /// # Arguments
    /// `path`: The directory to fetch the entry for.
    /// `f`: The function.
    pub fn with_directory<R, F: FnOnce(&mut Directory<T>) -> R>(
        &self,
        path: &CanonicalPath,
        f: F,
    ) -> crate::Result<R> {
        self.with_root(|root| root.directory_mut(path).map(f))
    }

    /// Calls `f` with the parent directory of `path` and the final segment of `path`. Fails for the root, which has
    /// no parent.
    ///
    /// # Arguments
    /// `path`: The path of the child.
    /// `f`: The function.
    pub fn with_parent<R, F: FnOnce(&mut Directory<T>, &str) -> crate::Result<R>>(
        &self,
        path: &CanonicalPath,
        f: F,
    ) -> crate::Result<R> {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(not_found());
        };

        self.with_directory(&parent, |directory| f(directory, name))?
    }
}

impl<T> Default for FilesystemTree<T> {
    fn default() -> Self {
        Self {
            root: Mutex::default(),
        }
    }
}
