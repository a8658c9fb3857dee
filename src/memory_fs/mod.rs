mod entry;
mod file;

use crate::file::{DirEntry, FileStat, Metadata, OpenOptions};
use crate::memory_fs::file::{FileHandle, FileMode};
use crate::path::CanonicalPath;
use crate::tree::{Directory, Entry, FilesystemTree};
use crate::util::{
    already_exists, directory_not_empty, invalid_input, invalid_path, is_a_directory,
    not_a_directory, not_found,
};
use crate::FileSystem;
use itertools::Itertools;
use parking_lot::Mutex;
use std::collections::btree_map;
use std::sync::Arc;

/// A file within the memory filesystem.
type File = Arc<Mutex<Vec<u8>>>;

/// A memory-backed filesystem. All files are stored within.
#[derive(Default)]
pub struct MemoryFS {
    inner: FilesystemTree<File>,
}

impl FileSystem for MemoryFS {
    fn create_dir(&self, path: &str) -> crate::Result<()> {
        let path = CanonicalPath::normalize(path);
        if path.is_root() {
            return Err(already_exists());
        }

        // fetch the parent directory and insert the new directory, if not already existent
        self.inner
            .with_parent(&path, |dir, directory_name| match dir.entry(directory_name.to_owned()) {
                btree_map::Entry::Vacant(vac) => {
                    vac.insert(Entry::Directory(Directory::default()));
                    Ok(())
                }
                btree_map::Entry::Occupied(_) => Err(already_exists()),
            })
    }

    fn info(&self) -> crate::Result<String> {
        let (files, directories) = self.inner.with_root(|root| entry::count(root));

        Ok(format!(
            "memory filesystem with {files} files and {directories} directories"
        ))
    }

    fn list(
        &self,
        path: &str,
        recursive: bool,
    ) -> crate::Result<Box<dyn Iterator<Item = crate::Result<DirEntry>>>> {
        let path = CanonicalPath::normalize(path);

        let entries = self.inner.with_root(|root| {
            let directory = root.get(&path)?;
            if !matches!(directory, Entry::Directory(_)) {
                return Err(not_a_directory());
            }

            let mut entries = Vec::new();
            if recursive {
                directory.walk(&mut |name: &str, entry: &Entry<File>| {
                    entries.push(DirEntry {
                        name: name.to_owned(),
                        metadata: entry.into(),
                    })
                });
            } else if let Entry::Directory(directory) = directory {
                entries = directory
                    .iter()
                    .map(|(name, entry)| DirEntry {
                        name: name.clone(),
                        metadata: entry.into(),
                    })
                    .collect_vec();
            }

            Ok(entries)
        })?;

        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn open_file_options(
        &self,
        path: &str,
        options: &OpenOptions,
    ) -> crate::Result<Box<dyn crate::File>> {
        if !options.read && !options.write {
            return Err(invalid_input("files must be opened for reading or writing"));
        }

        let path = CanonicalPath::normalize(path);
        if path.is_root() {
            return Err(is_a_directory());
        }

        // grab the file
        let mut file = self.inner.with_parent(&path, |dir, file_name| {
            let file = match dir.entry(file_name.to_owned()) {
                btree_map::Entry::Occupied(entry) => match entry.get() {
                    Entry::UserData(_) if options.create_new => return Err(already_exists()),
                    Entry::UserData(file) => file.clone(),
                    Entry::Directory(_) => return Err(is_a_directory()),
                },
                btree_map::Entry::Vacant(vacant) => {
                    if !options.create && !options.create_new {
                        return Err(not_found());
                    }

                    // create a new empty file and return it
                    let file = File::default();
                    vacant.insert(Entry::UserData(file.clone()));
                    file
                }
            };

            Ok(FileHandle::new(file, FileMode::from_options(options)))
        })?;

        // if we want to truncate the file, clear the contents
        if options.truncate {
            file.clear();
        }

        Ok(Box::new(file))
    }

    fn remove(&self, path: &str, recursive: bool) -> crate::Result<()> {
        let path = CanonicalPath::normalize(path);
        if path.is_root() {
            return Err(invalid_path());
        }

        self.inner
            .with_parent(&path, |parent, name| match parent.entry(name.to_owned()) {
                btree_map::Entry::Occupied(occ) => {
                    if let Entry::Directory(directory) = occ.get() {
                        if !recursive && !directory.is_empty() {
                            return Err(directory_not_empty());
                        }
                    }
                    occ.remove();
                    Ok(())
                }
                btree_map::Entry::Vacant(_) => Err(not_found()),
            })
    }

    fn rename(&self, from: &str, to: &str) -> crate::Result<()> {
        let from = CanonicalPath::normalize(from);
        let to = CanonicalPath::normalize(to);
        let (Some(from_parent), Some(from_name), Some(to_parent), Some(to_name)) =
            (from.parent(), from.file_name(), to.parent(), to.file_name())
        else {
            return Err(invalid_path());
        };
        if to != from && to.starts_with(&from) {
            return Err(invalid_input("cannot move a directory into itself"));
        }

        self.inner.with_root(|root| {
            let source_is_directory = matches!(root.get(&from)?, Entry::Directory(_));
            match root.directory_mut(&to_parent)?.get(to_name) {
                _ if to == from => return Ok(()),
                Some(Entry::Directory(_)) => return Err(is_a_directory()),
                Some(Entry::UserData(_)) if source_is_directory => return Err(not_a_directory()),
                _ => (),
            }

            let entry = root
                .directory_mut(&from_parent)?
                .remove(from_name)
                .ok_or_else(not_found)?;
            root.directory_mut(&to_parent)?
                .insert(to_name.to_owned(), entry);

            Ok(())
        })
    }

    fn stat(&self, path: &str) -> crate::Result<FileStat> {
        let path = CanonicalPath::normalize(path);
        let metadata = self
            .inner
            .with_root(|root| root.get(&path).map(Metadata::from))?;

        Ok(FileStat {
            filename: path.to_string(),
            metadata,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::file::{FileType, Metadata};
    use crate::memory_fs::MemoryFS;
    use crate::util::test::list_sorted;
    use crate::FileSystem;
    use std::collections::BTreeMap;
    use std::io::{ErrorKind, Seek, SeekFrom, Write};

    fn memory_fs() -> MemoryFS {
        let fs = MemoryFS::default();

        write!(fs.create_file("file").unwrap(), "something interesting").unwrap();
        fs.create_dir_all("folder/and/it/goes/deeper").unwrap();
        write!(fs.create_file("folder/and/it/goes/desc").unwrap(), "goes").unwrap();

        fs
    }

    fn read_directory(fs: &MemoryFS, dir: &str) -> BTreeMap<String, Metadata> {
        fs.list(dir, false)
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                (entry.name, entry.metadata)
            })
            .collect()
    }

    #[test]
    fn create_file() {
        memory_fs();
    }

    #[test]
    fn create_dir_errors() {
        let fs = memory_fs();

        assert_eq!(
            fs.create_dir("folder").unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(fs.create_dir("/").unwrap_err().kind(), ErrorKind::AlreadyExists);
        assert_eq!(
            fs.create_dir("missing/child").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            fs.create_dir("file/child").unwrap_err().kind(),
            ErrorKind::NotADirectory
        );
    }

    #[test]
    fn stat() {
        let fs = memory_fs();

        // basic file
        for name in ["file", "/file", "./file", "test/../file"] {
            let stat = fs.stat(name).unwrap();
            assert_eq!(stat.filename, "file");
            assert_eq!(stat.metadata.file_type, FileType::File);
            assert_eq!(stat.size(), 21);
        }

        // basic folder
        for name in ["folder", "/folder", "./folder", "test/../folder"] {
            let stat = fs.stat(name).unwrap();
            assert!(stat.is_dir());
            assert_eq!(stat.size(), 0);
        }

        // nested file
        for name in [
            "folder/and/it/goes/desc",
            "/folder/and/it/goes/desc",
            "./folder/and/it/goes/desc",
            "test/../folder/and/it/goes/desc",
        ] {
            let stat = fs.stat(name).unwrap();
            assert_eq!(stat.filename, "folder/and/it/goes/desc");
            assert_eq!(stat.size(), 4);
        }

        assert!(fs.stat("").unwrap().is_dir());
        assert_eq!(fs.stat("nothing").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn list() {
        let fs = memory_fs();

        // simple
        for name in ["", "/", "./", "//"] {
            let files = read_directory(&fs, name);
            itertools::assert_equal(files.keys(), vec!["file", "folder"]);
            itertools::assert_equal(
                files.values(),
                vec![&Metadata::file(21), &Metadata::directory()],
            )
        }

        // nested
        for name in [
            "folder/and/it/goes",
            "/folder/and/it/goes",
            "./folder/and/it/goes/",
            "///folder/and/it/goes///",
        ] {
            let files = read_directory(&fs, name);
            itertools::assert_equal(files.keys(), vec!["deeper", "desc"]);
            itertools::assert_equal(
                files.values(),
                vec![&Metadata::directory(), &Metadata::file(4)],
            )
        }

        // traversal
        for name in [
            "folder/and/../..",
            "./folder/and/../..",
            ".//folder/and//../..",
            "/folder//../folder/and/../..",
        ] {
            let files = read_directory(&fs, name);
            itertools::assert_equal(files.keys(), vec!["file", "folder"]);
        }
    }

    #[test]
    fn list_recursive() {
        let fs = memory_fs();

        itertools::assert_equal(
            list_sorted(&fs, "folder/and", true).unwrap(),
            ["it", "it/goes", "it/goes/deeper", "it/goes/desc"],
        );
        assert_eq!(
            fs.list("file", false).err().unwrap().kind(),
            ErrorKind::NotADirectory
        );
        assert_eq!(
            fs.list("nothing", true).err().unwrap().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn open_modes() {
        let fs = memory_fs();

        assert_eq!(
            fs.open("file", "r").unwrap().read_into_string().unwrap(),
            "something interesting"
        );
        assert_eq!(
            fs.open("folder", "r").err().unwrap().kind(),
            ErrorKind::IsADirectory
        );
        assert_eq!(
            fs.open("missing", "r").err().unwrap().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            fs.open("file", "x").err().unwrap().kind(),
            ErrorKind::AlreadyExists
        );

        write!(fs.open("file", "a").unwrap(), "!").unwrap();
        assert_eq!(
            fs.open("file", "r").unwrap().read_into_string().unwrap(),
            "something interesting!"
        );

        write!(fs.open("file", "w").unwrap(), "new").unwrap();
        assert_eq!(
            fs.open("file", "rb").unwrap().read_into_vec().unwrap(),
            b"new"
        );

        write!(fs.open("created", "x").unwrap(), "fresh").unwrap();
        assert_eq!(fs.stat("created").unwrap().size(), 5);
    }

    #[test]
    fn read_only_handle() {
        let fs = memory_fs();

        let mut file = fs.open("file", "r").unwrap();
        assert_eq!(file.write(b"x").unwrap_err().kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn append_ignores_cursor() {
        let fs = memory_fs();

        let mut file = fs.open("file", "a+").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        write!(file, "?").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(file.read_into_string().unwrap(), "something interesting?");
    }

    #[test]
    fn concurrent_handles() {
        let fs = memory_fs();

        let mut reader = fs.open("file", "rb").unwrap();
        let mut writer = fs.open("file", "r+").unwrap();
        writer.seek(SeekFrom::End(0)).unwrap();
        write!(writer, " indeed").unwrap();

        assert_eq!(
            reader.read_into_string().unwrap(),
            "something interesting indeed"
        );
    }

    #[test]
    fn remove() {
        let fs = memory_fs();

        assert_eq!(
            fs.remove("folder/and/it", false).unwrap_err().kind(),
            ErrorKind::DirectoryNotEmpty
        );
        fs.remove("folder/and/it", true).unwrap();
        assert!(!fs.exists("folder/and/it/goes").unwrap());
        assert!(!fs.exists("/folder/and/it").unwrap());
        assert!(fs.exists("/folder/and").unwrap());

        fs.remove("file", false).unwrap();
        assert!(!fs.exists("file").unwrap());
        fs.remove("folder/and", false).unwrap();

        assert_eq!(
            fs.remove("file", false).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(fs.remove("/", true).is_err());
    }

    #[test]
    fn rename() {
        let fs = memory_fs();

        fs.rename("folder/and/it", "moved").unwrap();
        assert!(!fs.exists("folder/and/it").unwrap());
        assert!(fs.is_dir("moved/goes/deeper").unwrap());
        assert_eq!(
            fs.open("moved/goes/desc", "r").unwrap().read_into_string().unwrap(),
            "goes"
        );

        // files are replaced
        fs.rename("file", "moved/goes/desc").unwrap();
        assert!(!fs.exists("file").unwrap());
        assert_eq!(fs.stat("moved/goes/desc").unwrap().size(), 21);

        assert_eq!(
            fs.rename("moved/goes/desc", "folder").unwrap_err().kind(),
            ErrorKind::IsADirectory
        );
        assert_eq!(
            fs.rename("moved", "moved/goes/desc").unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            fs.rename("nothing", "else").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            fs.rename("moved/goes", "missing/goes").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        fs.rename("moved", "./moved/").unwrap();
    }

    #[test]
    fn exists() {
        let fs = memory_fs();

        for path in ["", "file", "folder/and/", "folder/and/it/goes/desc"] {
            assert!(fs.exists(path).unwrap(), "{path}");
        }
        for path in ["missing", "folder/missing", "file/child", "folder/and/it/goes/desc/x"] {
            assert!(!fs.exists(path).unwrap(), "{path}");
            assert!(!fs.is_dir(path).unwrap(), "{path}");
        }
        assert_eq!(
            fs.stat("file/child").unwrap_err().kind(),
            ErrorKind::NotADirectory
        );
    }

    #[test]
    fn info() {
        let fs = memory_fs();

        assert_eq!(
            fs.info().unwrap(),
            "memory filesystem with 2 files and 5 directories"
        );
    }
}
