use crate::file::{FileType, Metadata};
use crate::path::{CanonicalPath, SEPARATOR};
use std::collections::{BTreeSet, HashMap};

/// A member as listed by an archive, before normalization.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawMember {
    /// The name as stored in the archive.
    pub name: String,
    /// The uncompressed size, in bytes.
    pub size: u64,
    /// The modification time, in seconds since the UNIX epoch.
    pub modified: u64,
    /// The unix permission bits stored in the archive, if any.
    pub permissions: Option<u32>,
    /// True if the archive flags the member as a directory.
    pub is_directory: bool,
}

impl RawMember {
    /// Creates a regular file member.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified: 0,
            permissions: None,
            is_directory: false,
        }
    }

    /// Creates a directory member.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified: 0,
            permissions: None,
            is_directory: true,
        }
    }

    /// Sets the modification time.
    pub fn modified(mut self, modified: u64) -> Self {
        self.modified = modified;
        self
    }
}

/// One explicit member of an archive.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MemberEntry {
    pub canonical_path: CanonicalPath,
    /// The name used to look the member up in the archive.
    pub raw_name: String,
    pub size: u64,
    pub modified: u64,
    pub permissions: Option<u32>,
    pub is_directory: bool,
}

impl MemberEntry {
    /// Returns the metadata of the member.
    pub fn metadata(&self) -> Metadata {
        let file_type = if self.is_directory {
            FileType::Directory
        } else {
            FileType::File
        };

        Metadata::new(file_type, self.size, self.modified, self.permissions)
    }
}

/// The directory structure of an archive, inferred from its flat member list.
#[derive(Debug)]
pub struct MemberIndex {
    files: HashMap<CanonicalPath, MemberEntry>,
    /// Directories, with the explicit archive entry when there is one.
    directories: HashMap<CanonicalPath, Option<MemberEntry>>,
    /// Names of the immediate children of each directory.
    children: HashMap<CanonicalPath, BTreeSet<String>>,
}

impl MemberIndex {
    /// Builds the index of an archive's members.
    ///
    /// Every strict ancestor of a file becomes a directory, since most archives don't store
    /// entries for them. When a path is both a file and a directory, the file wins regardless of
    /// listing order, and any member beneath it is kept for direct lookups but is never listed.
    ///
    /// # Arguments
    /// `members`: The archive's member list.
    pub fn build<I: IntoIterator<Item = RawMember>>(members: I) -> Self {
        let mut files = HashMap::new();
        let mut explicit_directories = HashMap::new();

        for member in members {
            let canonical_path = CanonicalPath::normalize(&member.name);
            let is_directory = member.is_directory || member.name.ends_with(SEPARATOR);
            let entry = MemberEntry {
                canonical_path: canonical_path.clone(),
                raw_name: member.name,
                size: if is_directory { 0 } else { member.size },
                modified: member.modified,
                permissions: member.permissions,
                is_directory,
            };

            if is_directory {
                explicit_directories.insert(canonical_path, entry);
            } else if !canonical_path.is_root() {
                files.insert(canonical_path, entry);
            }
        }

        // the root always exists, and every file's ancestors are directories
        let mut directories: HashMap<_, Option<MemberEntry>> =
            HashMap::from_iter([(CanonicalPath::root(), None)]);
        for path in files.keys() {
            for ancestor in path.ancestors() {
                directories.entry(ancestor).or_default();
            }
        }
        for (path, entry) in explicit_directories {
            if path.is_root() {
                continue;
            }
            for ancestor in path.ancestors() {
                directories.entry(ancestor).or_default();
            }
            directories.insert(path, Some(entry));
        }

        // files are authoritative
        directories.retain(|path, _| !files.contains_key(path));

        let mut children: HashMap<CanonicalPath, BTreeSet<String>> = HashMap::new();
        for path in files.keys().chain(directories.keys()) {
            let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
                continue;
            };
            if directories.contains_key(&parent) {
                children.entry(parent).or_default().insert(name.to_owned());
            }
        }

        let index = Self {
            files,
            directories,
            children,
        };
        tracing::debug!(
            files = index.file_count(),
            directories = index.directory_count(),
            "built member index"
        );
        index
    }

    /// Returns the number of files and directories, excluding the root.
    pub fn len(&self) -> usize {
        self.files.len() + self.directories.len() - 1
    }

    /// Returns true if the archive has no members.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns the number of directories, including the root.
    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    /// Returns true if `path` is a file.
    pub fn is_file(&self, path: &CanonicalPath) -> bool {
        self.files.contains_key(path)
    }

    /// Returns true if `path` is a directory.
    pub fn is_directory(&self, path: &CanonicalPath) -> bool {
        self.directories.contains_key(path)
    }

    /// Returns true if `path` is either a file or a directory.
    pub fn contains(&self, path: &CanonicalPath) -> bool {
        self.is_file(path) || self.is_directory(path)
    }

    /// Returns the explicit file entry at `path`.
    pub fn file(&self, path: &CanonicalPath) -> Option<&MemberEntry> {
        self.files.get(path)
    }

    /// Returns the explicit archive entry at `path`. Inferred directories have none.
    pub fn entry(&self, path: &CanonicalPath) -> Option<&MemberEntry> {
        self.files
            .get(path)
            .or_else(|| self.directories.get(path)?.as_ref())
    }

    /// Returns the metadata of the file or directory at `path`. Inferred directories report a
    /// zero size and modification time.
    pub fn metadata(&self, path: &CanonicalPath) -> Option<Metadata> {
        if let Some(entry) = self.entry(path) {
            Some(entry.metadata())
        } else if self.is_directory(path) {
            Some(Metadata::directory())
        } else {
            None
        }
    }

    /// Returns the names of the immediate children of the directory `path`, sorted. Returns an
    /// empty iterator for anything that isn't a directory with children.
    pub fn children(&self, path: &CanonicalPath) -> impl Iterator<Item = &str> + '_ {
        self.children
            .get(path)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }

    /// Returns every file and directory strictly below the directory `path`, at any depth, in
    /// depth-first order.
    pub fn descendants(&self, path: &CanonicalPath) -> Vec<CanonicalPath> {
        let mut descendants = Vec::new();
        let mut stack = vec![path.clone()];

        while let Some(directory) = stack.pop() {
            for name in self.children(&directory).collect::<Vec<_>>().into_iter().rev() {
                let child = directory.child(name);
                descendants.push(child.clone());
                if self.is_directory(&child) {
                    stack.push(child);
                }
            }
        }

        descendants
    }
}
