use crate::memory_fs::MemoryFS;
use crate::physical_fs::PhysicalFS;
use crate::util::{invalid_input, not_supported};
use crate::FileSystem;

/// A filesystem that can be shared between threads.
pub type SharedFileSystem = Box<dyn FileSystem + Send + Sync>;

/// Creates the filesystem for a scheme.
///
/// | Scheme | Filesystem |
/// |---|---|
/// | `file`, empty | [`PhysicalFS`] rooted at `root` |
/// | `mem`, `memory` | an empty [`MemoryFS`]; `root` is ignored |
/// | `hdfs`, `s3` | not supported by this crate |
///
/// # Arguments
/// `scheme`: The scheme, without `://`.
/// `root`: The directory the filesystem is rooted at.
pub fn from_scheme(scheme: &str, root: &str) -> crate::Result<SharedFileSystem> {
    tracing::debug!(scheme, root, "creating filesystem");

    match scheme {
        "" | "file" => Ok(Box::new(PhysicalFS::new(root))),
        "mem" | "memory" => Ok(Box::new(MemoryFS::default())),
        "hdfs" | "s3" => Err(not_supported()),
        _ => Err(invalid_input(&format!("unknown scheme: '{scheme}'"))),
    }
}

/// Creates a filesystem from a URL such as `file:///data` or `/data/archive.zip`. A URL without a scheme names a
/// local path. When the path ends in `.zip`, the archive is opened from its directory and mounted instead.
///
/// # Arguments
/// `url`: The URL.
pub fn from_url(url: &str) -> crate::Result<SharedFileSystem> {
    let (scheme, path) = url.split_once("://").unwrap_or(("", url));

    if !path.ends_with(".zip") {
        return from_scheme(scheme, path);
    }

    let (directory, file_name) = match path.rsplit_once('/') {
        Some(("", file_name)) => ("/", file_name),
        Some(split) => split,
        None => (".", path),
    };
    let fs = from_scheme(scheme, directory)?;
    let container = fs.open_as_container(file_name, "r")?;

    Ok(Box::new(container))
}
