use crate::path::CanonicalPath;
use crate::FileSystem;
use std::io;
use std::io::ErrorKind;
use std::iter::once;
use std::path::{Path, PathBuf};

/// Creates all directories by iteratively creating parent directories. Returns an error if the operation fails for
/// any reason other than `AlreadyExists`.
///
/// # Arguments
/// `fs`: The filesystem.
/// `path`: The path of the directory to create.
pub fn create_dir_all<FS: FileSystem + ?Sized>(fs: &FS, path: &str) -> crate::Result<()> {
    let normalized = CanonicalPath::normalize(path);
    if normalized.is_root() {
        return Ok(());
    }

    let mut parents = normalized
        .ancestors()
        .filter(|parent| !parent.is_root())
        .collect::<Vec<_>>();
    parents.reverse();

    for path in parents.into_iter().chain(once(normalized)) {
        if let Err(err) = fs.create_dir(&path.to_string()) {
            if err.kind() != ErrorKind::AlreadyExists {
                return Err(err);
            }
        }
    }

    Ok(())
}

/// Trims the `/` and `\\` roots off of the beginning path, making it relative.
pub(crate) fn make_relative<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref().to_str().unwrap_or("");
    path.trim_start_matches('/').trim_start_matches('\\').into()
}

/// Returns an error indicating that the path already exists.
pub(crate) fn already_exists() -> io::Error {
    io::Error::new(ErrorKind::AlreadyExists, "Already exists")
}

/// Returns an error indicating that a directory still has entries.
pub(crate) fn directory_not_empty() -> io::Error {
    io::Error::new(ErrorKind::DirectoryNotEmpty, "Directory not empty")
}

/// Returns an error indicating that the input was malformed.
pub(crate) fn invalid_input(error: &str) -> io::Error {
    io::Error::new(ErrorKind::InvalidInput, error.to_owned())
}

/// Returns an error indicating that the data read was malformed.
pub(crate) fn invalid_data(error: &str) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, error.to_owned())
}

/// Returns an error indicating that the path is invalid.
pub(crate) fn invalid_path() -> io::Error {
    io::Error::new(ErrorKind::InvalidInput, "Invalid path")
}

/// Returns an error indicating that a file operation targeted a directory.
pub(crate) fn is_a_directory() -> io::Error {
    io::Error::new(ErrorKind::IsADirectory, "Is a directory")
}

/// Returns an error indicating that a directory operation targeted a file.
pub(crate) fn not_a_directory() -> io::Error {
    io::Error::new(ErrorKind::NotADirectory, "Not a directory")
}

/// Returns an error indicating that the file was not found.
pub(crate) fn not_found() -> io::Error {
    io::Error::new(ErrorKind::NotFound, "File not found")
}

/// Returns an error indicating that the operation is not supported.
pub(crate) fn not_supported() -> io::Error {
    io::Error::new(ErrorKind::Unsupported, "Not supported")
}
