use crate::archive_fs::{ArchiveFS, ArchiveSource};
use crate::file::File;
use crate::index::RawMember;
use std::io;
use std::io::{ErrorKind, Read, Seek};
use zip::result::{ZipError, ZipResult};
use zip::{DateTime, ZipArchive};

/// A virtual FileSystem backed by a ZIP file. Only supports read operations.
pub type ZipFS<R> = ArchiveFS<ZipArchive<R>>;

/// A ZIP archive opened through another filesystem, possibly from within another archive.
pub type ContainerFS = ZipFS<Box<dyn File>>;

impl<R: Read + Seek + Send> ZipFS<R> {
    /// Mounts a ZIP file.
    pub fn new(zip_file: R) -> crate::Result<Self> {
        Self::with_name(zip_file, "")
    }

    /// Mounts a ZIP file with a name used for diagnostics.
    pub fn with_name(zip_file: R, name: impl Into<String>) -> crate::Result<Self> {
        let zip_file = convert_error(ZipArchive::new(zip_file))?;
        Self::from_source(zip_file, name)
    }
}

impl<R: Read + Seek + Send> ArchiveSource for ZipArchive<R> {
    fn format(&self) -> &'static str {
        "zip"
    }

    fn members(&mut self) -> crate::Result<Vec<RawMember>> {
        (0..self.len())
            .map(|index| {
                // raw access skips decryption, which listing doesn't need
                let file = convert_error(self.by_index_raw(index))?;
                Ok(RawMember {
                    name: file.name().to_owned(),
                    size: file.size(),
                    modified: dos_to_unix(file.last_modified()),
                    permissions: file.unix_mode(),
                    is_directory: file.is_dir(),
                })
            })
            .collect()
    }

    fn read_member(&mut self, raw_name: &str) -> crate::Result<Vec<u8>> {
        let mut entry = convert_error(self.by_name(raw_name))?;
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        Ok(contents)
    }
}

/// Converts ZIP errors into their `io` equivalents, keeping the original error as the source.
fn convert_error<T>(maybe_error: ZipResult<T>) -> crate::Result<T> {
    maybe_error.map_err(|err| match err {
        ZipError::FileNotFound => io::Error::new(ErrorKind::NotFound, err),
        ZipError::Io(io_error) => io_error,
        ZipError::InvalidArchive(_) => io::Error::new(ErrorKind::InvalidData, err),
        ZipError::UnsupportedArchive(_) => io::Error::new(ErrorKind::Unsupported, err),
    })
}

/// Converts a DOS timestamp to seconds since the UNIX epoch. ZIP stores local time without a zone, so it is read as
/// UTC.
fn dos_to_unix(time: DateTime) -> u64 {
    time.to_time()
        .map_or(0, |time| time.unix_timestamp().max(0) as u64)
}
