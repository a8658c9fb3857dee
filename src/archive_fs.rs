use crate::error::ResourceError;
use crate::file::{DirEntry, File, FileStat, Metadata, OpenOptions};
use crate::fork::ForkGuard;
use crate::index::{MemberEntry, MemberIndex, RawMember};
use crate::path::CanonicalPath;
use crate::util::{invalid_input, is_a_directory, not_a_directory, not_found, not_supported};
use crate::zip_fs::{ContainerFS, ZipFS};
use crate::{container_mode, FileSystem};
use itertools::Itertools;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::io;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Weak};

/// Random access to the members of an archive.
pub trait ArchiveSource: Send {
    /// Returns the name of the archive format.
    fn format(&self) -> &'static str;

    /// Returns every member of the archive.
    fn members(&mut self) -> crate::Result<Vec<RawMember>>;

    /// Reads the entire contents of the member stored as `raw_name`.
    ///
    /// # Arguments
    /// `raw_name`: The member name, exactly as stored in the archive.
    fn read_member(&mut self, raw_name: &str) -> crate::Result<Vec<u8>>;
}

type SharedSource<S> = Arc<Mutex<S>>;

/// A read-only filesystem over the members of an archive. The directory tree is inferred from member names when the
/// filesystem is created; afterward, only opening a member touches the archive itself.
///
/// The filesystem is open until `close` is called, after which every operation fails with
/// [`ResourceError::UseAfterClose`].
pub struct ArchiveFS<S: ArchiveSource> {
    source: RwLock<Option<SharedSource<S>>>,
    index: Arc<MemberIndex>,
    cwd: CanonicalPath,
    origin: Option<NestedOrigin>,
    guard: ForkGuard,
    name: String,
    format: &'static str,
}

impl<S: ArchiveSource> ArchiveFS<S> {
    /// Indexes the members of an archive and mounts it.
    ///
    /// # Arguments
    /// `source`: The opened archive.
    /// `name`: A name for the archive, used for diagnostics.
    pub fn from_source(mut source: S, name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        let format = source.format();
        let index = MemberIndex::build(source.members()?);
        tracing::debug!(archive = %name, format, members = index.len(), "mounted archive");

        Ok(Self {
            source: RwLock::new(Some(Arc::new(Mutex::new(source)))),
            index: Arc::new(index),
            cwd: CanonicalPath::root(),
            origin: None,
            guard: ForkGuard::new(),
            name,
            format,
        })
    }

    /// Returns a view of the directory `rel_path`. The view shares the member index and the archive with this
    /// filesystem, but is closed independently; the archive is released once every view is closed or dropped.
    ///
    /// # Arguments
    /// `rel_path`: The directory, relative to this filesystem.
    pub fn subfs(&self, rel_path: &str) -> crate::Result<Self> {
        let source = self.shared_source()?;
        let cwd = self.cwd.resolve(rel_path);
        if self.index.is_file(&cwd) {
            return Err(not_a_directory());
        }
        if !self.index.is_directory(&cwd) {
            return Err(not_found());
        }

        Ok(Self {
            source: RwLock::new(Some(source)),
            index: Arc::clone(&self.index),
            cwd,
            origin: self.origin.clone(),
            guard: self.guard,
            name: self.name.clone(),
            format: self.format,
        })
    }

    /// Returns the member index of the whole archive.
    pub fn index(&self) -> &MemberIndex {
        &self.index
    }

    /// Returns the directory this filesystem is rooted at, relative to the archive root.
    pub fn cwd(&self) -> &CanonicalPath {
        &self.cwd
    }

    /// Returns where the archive came from, if it was opened from within another archive.
    pub fn origin(&self) -> Option<&NestedOrigin> {
        self.origin.as_ref()
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.source.read().is_none()
    }

    #[cfg(test)]
    pub(crate) fn with_guard(mut self, guard: ForkGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Fails if the filesystem may not be used.
    fn ensure_open(&self) -> crate::Result<()> {
        self.shared_source().map(|_| ())
    }

    fn shared_source(&self) -> crate::Result<SharedSource<S>> {
        self.guard.check()?;
        self.source
            .read()
            .clone()
            .ok_or_else(|| ResourceError::UseAfterClose.into())
    }

    /// Resolves a caller-supplied path against the archive root.
    fn resolve(&self, path: &str) -> CanonicalPath {
        self.cwd.resolve(path)
    }

    fn directory(&self, path: &str) -> crate::Result<CanonicalPath> {
        let directory = self.resolve(path);
        if self.index.is_directory(&directory) {
            Ok(directory)
        } else if self.index.is_file(&directory) {
            Err(not_a_directory())
        } else {
            Err(not_found())
        }
    }

    fn file(&self, path: &str) -> crate::Result<&MemberEntry> {
        let path = self.resolve(path);
        match self.index.file(&path) {
            Some(entry) => Ok(entry),
            None if self.index.is_directory(&path) => Err(is_a_directory()),
            None => Err(not_found()),
        }
    }

    fn read_member(&self, entry: &MemberEntry) -> crate::Result<MemberFile> {
        let source = self.shared_source()?;
        tracing::trace!(archive = %self.name, member = %entry.canonical_path, "reading member");
        let contents = source.lock().read_member(&entry.raw_name)?;

        Ok(MemberFile::new(contents, entry.metadata()))
    }

    fn entry_metadata(&self, path: &CanonicalPath) -> Metadata {
        self.index.metadata(path).unwrap_or_else(Metadata::directory)
    }
}

impl<S: ArchiveSource + 'static> FileSystem for ArchiveFS<S> {
    fn create_dir(&self, _path: &str) -> crate::Result<()> {
        self.ensure_open()?;
        Err(not_supported())
    }

    fn info(&self) -> crate::Result<String> {
        self.ensure_open()?;

        let mut info = format!(
            "{} archive '{}' with {} files and {} directories",
            self.format,
            self.name,
            self.index.file_count(),
            self.index.directory_count() - 1
        );
        if !self.cwd.is_root() {
            info.push_str(&format!(", rooted at '{}'", self.cwd));
        }
        if let Some(origin) = &self.origin {
            info.push_str(&format!(", nested in member '{}'", origin.raw_name()));
        }

        Ok(info)
    }

    fn list(
        &self,
        path: &str,
        recursive: bool,
    ) -> crate::Result<Box<dyn Iterator<Item = crate::Result<DirEntry>>>> {
        self.ensure_open()?;
        let directory = self.directory(path)?;

        let entries = if recursive {
            self.index
                .descendants(&directory)
                .into_iter()
                .filter_map(|path| {
                    let name = path.strip_prefix(&directory)?.to_string();
                    Some(DirEntry {
                        name,
                        metadata: self.entry_metadata(&path),
                    })
                })
                .collect_vec()
        } else {
            self.index
                .children(&directory)
                .map(|name| DirEntry {
                    name: name.to_owned(),
                    metadata: self.entry_metadata(&directory.child(name)),
                })
                .collect_vec()
        };

        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn open_file_options(&self, path: &str, options: &OpenOptions) -> crate::Result<Box<dyn File>> {
        self.ensure_open()?;

        // ensure we only want to read
        if options.is_mutating() {
            return Err(not_supported());
        }
        if !options.read {
            return Err(invalid_input("archive members can only be opened for reading"));
        }

        let entry = self.file(path)?;
        Ok(Box::new(self.read_member(entry)?))
    }

    fn remove(&self, _path: &str, _recursive: bool) -> crate::Result<()> {
        self.ensure_open()?;
        Err(not_supported())
    }

    fn rename(&self, _from: &str, _to: &str) -> crate::Result<()> {
        self.ensure_open()?;
        Err(not_supported())
    }

    fn stat(&self, path: &str) -> crate::Result<FileStat> {
        self.ensure_open()?;
        let metadata = self
            .index
            .metadata(&self.resolve(path))
            .ok_or_else(not_found)?;

        Ok(FileStat {
            filename: CanonicalPath::normalize(path).to_string(),
            metadata,
        })
    }

    fn close(&self) -> crate::Result<()> {
        self.guard.check()?;
        if self.source.write().take().is_some() {
            tracing::debug!(archive = %self.name, "closed archive");
        }

        Ok(())
    }

    fn create_dir_all(&self, _path: &str) -> crate::Result<()> {
        self.ensure_open()?;
        Err(not_supported())
    }

    fn exists(&self, path: &str) -> crate::Result<bool> {
        self.ensure_open()?;
        Ok(self.index.contains(&self.resolve(path)))
    }

    fn is_dir(&self, path: &str) -> crate::Result<bool> {
        self.ensure_open()?;
        Ok(self.index.is_directory(&self.resolve(path)))
    }

    fn open_as_container(&self, path: &str, mode: &str) -> crate::Result<ContainerFS> {
        let source = self.shared_source()?;
        container_mode(mode)?;
        let entry = self.file(path)?;
        let member = self.read_member(entry)?;

        let outer = Arc::downgrade(&source);
        let outer: Weak<Mutex<dyn ArchiveSource>> = outer;
        let mut container = ZipFS::with_name(
            Box::new(member) as Box<dyn File>,
            entry.canonical_path.to_string(),
        )?;
        container.origin = Some(NestedOrigin {
            outer,
            raw_name: entry.raw_name.clone(),
        });
        tracing::debug!(archive = %self.name, member = %entry.canonical_path, "mounted nested archive");

        Ok(container)
    }
}

impl<S: ArchiveSource> Debug for ArchiveFS<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveFS")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("cwd", &self.cwd)
            .field("members", &self.index.len())
            .field("closed", &self.is_closed())
            .field("origin", &self.origin)
            .finish()
    }
}

/// The member of an outer archive that a nested archive was read from. The outer archive is not kept alive by
/// this reference.
#[derive(Clone)]
pub struct NestedOrigin {
    outer: Weak<Mutex<dyn ArchiveSource>>,
    raw_name: String,
}

impl NestedOrigin {
    /// Returns the name of the member in the outer archive.
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Returns true if the outer archive is still open.
    pub fn is_alive(&self) -> bool {
        self.outer.strong_count() > 0
    }

    /// Reads the member from the outer archive again and mounts it as a new filesystem. Fails with
    /// [`ResourceError::UseAfterClose`] once the outer archive has been released.
    pub fn reopen(&self) -> crate::Result<ContainerFS> {
        let outer = self.outer.upgrade().ok_or(ResourceError::UseAfterClose)?;
        let contents = outer.lock().read_member(&self.raw_name)?;
        let len = contents.len() as u64;

        let mut container = ZipFS::with_name(
            Box::new(MemberFile::new(contents, Metadata::file(len))) as Box<dyn File>,
            CanonicalPath::normalize(&self.raw_name).to_string(),
        )?;
        container.origin = Some(self.clone());

        Ok(container)
    }
}

impl Debug for NestedOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedOrigin")
            .field("raw_name", &self.raw_name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// The contents of an archive member, read into memory.
pub(crate) struct MemberFile {
    inner: Cursor<Vec<u8>>,
    metadata: Metadata,
}

impl MemberFile {
    pub(crate) fn new(contents: Vec<u8>, metadata: Metadata) -> Self {
        Self {
            inner: Cursor::new(contents),
            metadata,
        }
    }
}

impl Read for MemberFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for MemberFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Write for MemberFile {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(not_supported())
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(not_supported())
    }
}

impl File for MemberFile {
    fn metadata(&self) -> crate::Result<Metadata> {
        Ok(Metadata {
            len: self.inner.get_ref().len() as u64,
            ..self.metadata.clone()
        })
    }
}

#[cfg(test)]
mod test {
    use crate::archive_fs::{ArchiveFS, ArchiveSource};
    use crate::error::{resource_error, ResourceError};
    use crate::file::{Encoding, FileType};
    use crate::fork::ForkGuard;
    use crate::index::RawMember;
    use crate::util::not_found;
    use crate::util::test::list_sorted;
    use crate::FileSystem;
    use std::collections::HashMap;
    use std::io::{ErrorKind, Read, Write};
    use std::process;

    /// An archive that counts how often its members are read.
    #[derive(Default)]
    struct FakeArchive {
        members: Vec<RawMember>,
        contents: HashMap<String, Vec<u8>>,
        reads: usize,
    }

    impl FakeArchive {
        fn file(mut self, name: &str, contents: &str) -> Self {
            self.members
                .push(RawMember::file(name, contents.len() as u64).modified(1_650_000_000));
            self.contents
                .insert(name.to_owned(), contents.as_bytes().to_vec());
            self
        }

        fn directory(mut self, name: &str) -> Self {
            self.members.push(RawMember::directory(name));
            self
        }
    }

    impl ArchiveSource for FakeArchive {
        fn format(&self) -> &'static str {
            "fake"
        }

        fn members(&mut self) -> crate::Result<Vec<RawMember>> {
            Ok(self.members.clone())
        }

        fn read_member(&mut self, raw_name: &str) -> crate::Result<Vec<u8>> {
            self.reads += 1;
            self.contents.get(raw_name).cloned().ok_or_else(not_found)
        }
    }

    fn archive_fs() -> ArchiveFS<FakeArchive> {
        let archive = FakeArchive::default()
            .directory("testdir1/")
            .file("testdir1/nested.zip", "not really a zip")
            .file("testdir2/testfile1", "first")
            .file("testfile2", "second");

        ArchiveFS::from_source(archive, "outside.zip").unwrap()
    }

    fn assert_use_after_close<T: std::fmt::Debug>(result: crate::Result<T>) {
        let err = result.unwrap_err();
        assert_eq!(resource_error(&err), Some(&ResourceError::UseAfterClose));
    }

    #[test]
    fn list_root() {
        let fs = archive_fs();

        for path in ["", "/", ".", "//..//", "testdir1/.."] {
            assert_eq!(
                list_sorted(&fs, path, false).unwrap(),
                vec!["testdir1", "testdir2", "testfile2"],
                "{path}"
            );
        }
    }

    #[test]
    fn list_directory() {
        let fs = archive_fs();

        for path in [
            "testdir2",
            "testdir2/",
            "/testdir2",
            "testdir2//testfile1//../",
        ] {
            assert_eq!(list_sorted(&fs, path, false).unwrap(), vec!["testfile1"]);
        }
    }

    #[test]
    fn list_recursive() {
        let fs = archive_fs();

        assert_eq!(
            list_sorted(&fs, "", true).unwrap(),
            vec![
                "testdir1",
                "testdir1/nested.zip",
                "testdir2",
                "testdir2/testfile1",
                "testfile2"
            ]
        );
        assert_eq!(
            list_sorted(&fs, "testdir1/", true).unwrap(),
            vec!["nested.zip"]
        );
    }

    #[test]
    fn list_metadata() {
        let fs = archive_fs();

        let entries = fs.list("", false).unwrap().collect::<Result<Vec<_>, _>>().unwrap();
        for entry in entries {
            match entry.name.as_str() {
                "testfile2" => {
                    assert_eq!(entry.metadata.file_type, FileType::File);
                    assert_eq!(entry.len(), 6);
                }
                _ => assert!(entry.is_directory()),
            }
        }
    }

    #[test]
    fn list_errors() {
        let fs = archive_fs();

        assert_eq!(
            fs.list("does_not_exist", false).err().unwrap().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            fs.list("testdir2/testfile1", false).err().unwrap().kind(),
            ErrorKind::NotADirectory
        );
    }

    #[test]
    fn open() {
        let fs = archive_fs();

        let mut file = fs.open("testdir2/testfile1", "rb").unwrap();
        assert_eq!(file.read_into_vec().unwrap(), b"first");
        assert_eq!(file.metadata().unwrap().len, 5);
        assert_eq!(file.metadata().unwrap().modified, 1_650_000_000);

        let text = fs
            .open("/x/../testfile2", "r")
            .unwrap()
            .read_into_string()
            .unwrap();
        assert_eq!(text, "second");
    }

    #[test]
    fn open_errors() {
        let fs = archive_fs();

        assert_eq!(
            fs.open("missing", "rb").err().unwrap().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            fs.open("testdir1", "rb").err().unwrap().kind(),
            ErrorKind::IsADirectory
        );
        assert_eq!(fs.open("", "rb").err().unwrap().kind(), ErrorKind::IsADirectory);
        for mode in ["w", "wb", "a", "x", "r+", "rb+"] {
            assert_eq!(
                fs.open("testfile2", mode).err().unwrap().kind(),
                ErrorKind::Unsupported,
                "{mode}"
            );
        }
    }

    #[test]
    fn members_are_read_lazily() {
        let fs = archive_fs();

        fs.list("", true).unwrap().for_each(drop);
        fs.stat("testfile2").unwrap();
        assert_eq!(fs.source.read().as_ref().unwrap().lock().reads, 0);

        fs.open_file("testfile2").unwrap();
        assert_eq!(fs.source.read().as_ref().unwrap().lock().reads, 1);
    }

    #[test]
    fn member_files_are_read_only() {
        let fs = archive_fs();

        let mut file = fs.open_file("testfile2").unwrap();
        assert_eq!(
            file.write(b"nope").unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "second");
    }

    #[test]
    fn stat() {
        let fs = archive_fs();

        for path in ["testdir1", "testdir1/", "/testdir1", "./testdir1/."] {
            let stat = fs.stat(path).unwrap();
            assert_eq!(stat.filename, "testdir1");
            assert!(stat.is_dir());
        }

        let stat = fs.stat("testdir2/testfile1").unwrap();
        assert_eq!(stat.filename, "testdir2/testfile1");
        assert!(!stat.is_dir());
        assert_eq!(stat.size(), 5);
        assert_eq!(stat.last_modified(), 1_650_000_000);

        // inferred directories have no archive entry
        let stat = fs.stat("testdir2").unwrap();
        assert!(stat.is_dir());
        assert_eq!(stat.size(), 0);
        assert_eq!(stat.last_modified(), 0);

        assert_eq!(fs.stat("nothing").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn exists_and_is_dir() {
        let fs = archive_fs();

        for path in ["", "/", "testdir1", "testdir1/", "testdir2", "a/../testdir2"] {
            assert!(fs.exists(path).unwrap(), "{path}");
            assert!(fs.is_dir(path).unwrap(), "{path}");
        }
        for path in ["testfile2", "testdir2/testfile1", "testdir1/nested.zip"] {
            assert!(fs.exists(path).unwrap(), "{path}");
            assert!(!fs.is_dir(path).unwrap(), "{path}");
        }
        assert!(!fs.exists("non_exist_file.txt").unwrap());
        assert!(!fs.is_dir("non_exist_file.txt").unwrap());
    }

    #[test]
    fn mutations_are_unsupported() {
        let fs = archive_fs();
        let before = list_sorted(&fs, "", true).unwrap();

        assert_eq!(fs.create_dir("test").unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(
            fs.create_dir_all("test/test").unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            fs.remove("testfile2", false).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            fs.remove("testdir2", true).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            fs.rename("testfile2", "renamed").unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            fs.create_file("new").err().unwrap().kind(),
            ErrorKind::Unsupported
        );

        assert_eq!(list_sorted(&fs, "", true).unwrap(), before);
    }

    #[test]
    fn info() {
        let fs = archive_fs();

        let info = fs.info().unwrap();
        assert!(info.contains("fake"));
        assert!(info.contains("outside.zip"));
        assert!(info.contains("3 files"));
    }

    #[test]
    fn close_is_idempotent() {
        let fs = archive_fs();

        assert!(!fs.is_closed());
        fs.close().unwrap();
        assert!(fs.is_closed());
        fs.close().unwrap();

        assert_use_after_close(fs.open_file("testfile2").map(|_| ()));
        assert_use_after_close(fs.list("", false).map(|_| ()));
        assert_use_after_close(fs.stat("testfile2"));
        assert_use_after_close(fs.exists("testfile2"));
        assert_use_after_close(fs.is_dir("testdir1"));
        assert_use_after_close(fs.create_dir("x"));
        assert_use_after_close(fs.remove("testfile2", false));
        assert_use_after_close(fs.rename("a", "b"));
        assert_use_after_close(fs.info());
        assert_use_after_close(fs.subfs("testdir2").map(|_| ()));
        assert_use_after_close(fs.create_dir_all("x/y"));
        assert_use_after_close(fs.create_file("x").map(|_| ()));
        assert_use_after_close(fs.open("testfile2", "r").map(|_| ()));
        assert_use_after_close(
            fs.open_with_encoding("testfile2", "r", Encoding::default())
                .map(|_| ()),
        );
        assert_use_after_close(fs.open_as_container("testdir1/nested.zip", "r").map(|_| ()));
    }

    #[test]
    fn forked_handles_are_refused() {
        let fs = archive_fs().with_guard(ForkGuard::with_pid(process::id().wrapping_add(1)));

        for err in [
            fs.stat("testfile2").unwrap_err(),
            fs.list("", false).err().unwrap(),
            fs.open_file("testfile2").err().unwrap(),
            fs.open("testfile2", "r").err().unwrap(),
            fs.open_with_encoding("testfile2", "rb", Encoding::default())
                .err()
                .unwrap(),
            fs.exists("testfile2").unwrap_err(),
            fs.is_dir("testdir1").unwrap_err(),
            fs.info().unwrap_err(),
            fs.subfs("testdir2").unwrap_err(),
            fs.open_as_container("testdir1/nested.zip", "r").unwrap_err(),
            fs.create_dir("x").unwrap_err(),
            fs.create_dir_all("x/y").unwrap_err(),
            fs.remove("testfile2", false).unwrap_err(),
            fs.rename("testfile2", "moved").unwrap_err(),
            fs.close().unwrap_err(),
        ] {
            assert!(matches!(
                resource_error(&err),
                Some(ResourceError::Forked { .. })
            ));
        }
    }

    #[test]
    fn subfs() {
        let fs = archive_fs();
        let sub = fs.subfs("testdir2/").unwrap();

        assert_eq!(sub.cwd().to_string(), "testdir2");
        assert_eq!(list_sorted(&sub, "", false).unwrap(), vec!["testfile1"]);
        assert_eq!(
            sub.open_file("testfile1").unwrap().read_into_string().unwrap(),
            "first"
        );
        // the view cannot climb out of its directory
        assert_eq!(list_sorted(&sub, "..", false).unwrap(), vec!["testfile1"]);
        assert!(!sub.exists("testfile2").unwrap());
        assert_eq!(sub.stat("testfile1").unwrap().filename, "testfile1");
        assert!(sub.info().unwrap().contains("rooted at 'testdir2'"));

        assert_eq!(
            fs.subfs("testfile2").unwrap_err().kind(),
            ErrorKind::NotADirectory
        );
        assert_eq!(fs.subfs("missing").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn subfs_closes_independently() {
        let fs = archive_fs();
        let sub = fs.subfs("testdir2").unwrap();

        fs.close().unwrap();
        assert!(fs.is_closed());
        assert_eq!(
            sub.open_file("testfile1").unwrap().read_into_string().unwrap(),
            "first"
        );

        sub.close().unwrap();
        assert_use_after_close(sub.stat("testfile1"));
    }
}
