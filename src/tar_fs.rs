use crate::archive_fs::{ArchiveFS, ArchiveSource};
use crate::index::RawMember;
use crate::util::not_found;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tar::{Archive, EntryType};

/// A filesystem mounted on a Tarball archive.
///
/// Tarballs can only be read front to back, so every included file is loaded into memory when the filesystem is
/// created. `filtered` variants of constructors should be used to avoid large files that may not need to be accessed.
pub type TarFS = ArchiveFS<TarSource>;

/// Filters over filesystems.
pub trait FileSystemFilter {
    /// Returns true if the path should be included in the filesystem.
    ///
    /// # Arguments
    /// `path`: The path to the file.
    fn should_include(&self, path: &Path) -> bool;
}

impl<F: Fn(&Path) -> bool> FileSystemFilter for F {
    fn should_include(&self, path: &Path) -> bool {
        self(path)
    }
}

/// The members of a Tarball, read into memory.
#[derive(Debug, Default)]
pub struct TarSource {
    members: Vec<RawMember>,
    contents: HashMap<String, Vec<u8>>,
}

impl TarSource {
    /// Reads every regular file and directory out of a Tarball.
    ///
    /// # Arguments
    /// `archive`: The tarball archive itself.
    /// `filter`: A filter that determines which entries are included.
    pub fn read<R: Read, F: FileSystemFilter>(archive: R, filter: F) -> crate::Result<Self> {
        let mut archive = Archive::new(archive);
        let mut source = Self::default();

        for entry in archive.entries()? {
            let mut entry = entry?;

            // links and special files have no contents to offer
            let entry_type = entry.header().entry_type();
            if entry_type != EntryType::Regular && entry_type != EntryType::Directory {
                continue;
            }

            let entry_path = entry.path()?.into_owned();
            if !filter.should_include(&entry_path) {
                continue;
            }

            let name = entry_path.to_string_lossy().into_owned();
            let header = entry.header();
            let modified = header.mtime().unwrap_or(0);
            let permissions = header.mode().ok();

            if entry_type == EntryType::Directory {
                source.members.push(RawMember {
                    permissions,
                    ..RawMember::directory(name).modified(modified)
                });
                continue;
            }

            // read the entire entry to a vec
            let mut file_contents = Vec::with_capacity(header.size()? as usize);
            entry.read_to_end(&mut file_contents)?;

            source.members.push(RawMember {
                permissions,
                ..RawMember::file(name.clone(), file_contents.len() as u64).modified(modified)
            });
            // a later entry with the same name replaces the earlier one, as with `tar -x`
            source.contents.insert(name, file_contents);
        }

        tracing::trace!(members = source.members.len(), "read tarball");
        Ok(source)
    }
}

impl ArchiveSource for TarSource {
    fn format(&self) -> &'static str {
        "tar"
    }

    fn members(&mut self) -> crate::Result<Vec<RawMember>> {
        Ok(self.members.clone())
    }

    fn read_member(&mut self, raw_name: &str) -> crate::Result<Vec<u8>> {
        self.contents.get(raw_name).cloned().ok_or_else(not_found)
    }
}

impl TarFS {
    /// Creates a new tar-backed filesystem.
    ///
    /// # Arguments
    /// `archive`: The tarball archive itself.
    pub fn new<R: Read>(archive: R) -> crate::Result<Self> {
        Self::new_filtered(archive, |_: &_| true)
    }

    /// Creates a new tar-backed filesystem with filtered contents.
    ///
    /// # Arguments
    /// `archive`: The tarball archive itself.
    /// `filter`: A filter that determines which entries are included in the filesystem.
    pub fn new_filtered<R: Read, F: FileSystemFilter>(archive: R, filter: F) -> crate::Result<Self> {
        Self::from_source(TarSource::read(archive, filter)?, "")
    }
}

#[cfg(test)]
mod test {
    use crate::file::{S_IFDIR, S_IFREG};
    use crate::tar_fs::TarFS;
    use crate::util::test::list_sorted;
    use crate::zip_fs::test::{build_zip, NESTED_TEST_STRING};
    use crate::FileSystem;
    use std::io::{Cursor, ErrorKind, Write};
    use std::path::Path;
    use tar::{Builder, EntryType, Header};
    use xz::read::XzDecoder;
    use xz::write::XzEncoder;

    fn append(builder: &mut Builder<Vec<u8>>, name: &str, entry_type: EntryType, contents: &[u8]) {
        let mut header = Header::new_gnu();
        header.set_entry_type(entry_type);
        header.set_size(contents.len() as u64);
        header.set_mode(if entry_type == EntryType::Directory { 0o750 } else { 0o600 });
        header.set_mtime(1_600_000_000);
        builder.append_data(&mut header, name, contents).unwrap();
    }

    /// ```text
    /// file
    /// folder/
    /// | - and/
    /// |   | - it/
    /// |   |   | - desc
    /// |   |   | - goes/
    /// |   |   |   | - deeper/
    /// | - nested.zip
    /// ```
    fn deep_fs_tar() -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        append(&mut builder, "file", EntryType::Regular, b"something interesting\n");
        append(&mut builder, "folder/and/it/goes/deeper/", EntryType::Directory, b"");
        append(&mut builder, "folder/and/it/desc", EntryType::Regular, b"it\n");
        append(&mut builder, "folder/link", EntryType::Symlink, b"");

        let nested = build_zip(
            &["nested_dir/"],
            &[("nested_dir/nested", NESTED_TEST_STRING.as_bytes())],
        );
        append(&mut builder, "folder/nested.zip", EntryType::Regular, &nested);

        builder.into_inner().unwrap()
    }

    fn compress(contents: &[u8]) -> Vec<u8> {
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(contents).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn bad_xz() {
        let not_xz = deep_fs_tar();

        assert!(TarFS::new(XzDecoder::new(not_xz.as_slice())).is_err());
    }

    #[test]
    fn deep_fs_xz() {
        let compressed = compress(&deep_fs_tar());
        let archive = TarFS::new(XzDecoder::new(compressed.as_slice())).unwrap();

        assert_eq!(
            list_sorted(&archive, "folder", false).unwrap(),
            vec!["and", "nested.zip"]
        );
        assert_eq!(
            archive
                .open_file("/folder/and/it/desc")
                .unwrap()
                .read_into_string()
                .unwrap(),
            "it\n"
        );
        assert_eq!(
            archive.open("file", "r").unwrap().read_into_string().unwrap(),
            "something interesting\n"
        );
    }

    #[test]
    fn skips_links() {
        let archive = TarFS::new(Cursor::new(deep_fs_tar())).unwrap();

        assert!(!archive.exists("folder/link").unwrap());
    }

    #[test]
    fn list_recursive() {
        let archive = TarFS::new(Cursor::new(deep_fs_tar())).unwrap();

        assert_eq!(
            list_sorted(&archive, "folder/and/", true).unwrap(),
            vec!["it", "it/desc", "it/goes", "it/goes/deeper"]
        );
    }

    #[test]
    fn stat() {
        let archive = TarFS::new(Cursor::new(deep_fs_tar())).unwrap();

        let stat = archive.stat("folder/and/it/goes/deeper").unwrap();
        assert_eq!(stat.mode(), S_IFDIR | 0o750);
        assert_eq!(stat.last_modified(), 1_600_000_000);

        let stat = archive.stat("folder//and/it/desc").unwrap();
        assert_eq!(stat.filename, "folder/and/it/desc");
        assert_eq!(stat.mode(), S_IFREG | 0o600);
        assert_eq!(stat.size(), 3);

        // inferred from the file below it
        assert!(archive.stat("folder/and").unwrap().is_dir());
    }

    #[test]
    fn filtered() {
        let archive = TarFS::new_filtered(Cursor::new(deep_fs_tar()), |path: &Path| {
            !path.starts_with("folder")
        })
        .unwrap();

        assert_eq!(list_sorted(&archive, "", true).unwrap(), vec!["file"]);
        assert_eq!(
            archive.open_file("folder/and/it/desc").err().unwrap().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn read_only() {
        let archive = TarFS::new(Cursor::new(deep_fs_tar())).unwrap();

        assert_eq!(
            archive.open("file", "w").err().unwrap().kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            archive.remove("file", false).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        assert!(archive.info().unwrap().starts_with("tar archive"));
    }

    #[test]
    fn nested_zip_in_tar() {
        let archive = TarFS::new(Cursor::new(deep_fs_tar())).unwrap();
        let nested = archive.open_as_container("folder/nested.zip", "r").unwrap();

        assert_eq!(
            nested
                .open("nested_dir/nested", "rb")
                .unwrap()
                .read_into_string()
                .unwrap(),
            NESTED_TEST_STRING
        );
        assert_eq!(nested.origin().unwrap().raw_name(), "folder/nested.zip");
    }
}
