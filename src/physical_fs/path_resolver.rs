use crate::util::make_relative;
use normalize_path::NormalizePath;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Resolves paths to their respective host paths.
pub trait PathResolver {
    /// A short name for the resolver, used in `info`.
    const NAME: &'static str;

    /// Resolves `path` to a suitable host path rooted at `root`.
    fn resolve_path(root: &Path, path: &str) -> crate::Result<PathBuf>;
}

/// A resolver that ensures that paths have not been traversed, either through backtracking or symbolic links.
pub struct SandboxedPathResolver {}
impl PathResolver for SandboxedPathResolver {
    const NAME: &'static str = "sandboxed";

    fn resolve_path(root: &Path, path: &str) -> crate::Result<PathBuf> {
        // root is already normalized by `PhysicalFSImpl`
        let root = root.canonicalize()?;
        let lexical_path = root.join(make_relative(path)).normalize();
        if !lexical_path.starts_with(&root) {
            return Err(traversal_prevented());
        }

        // the target itself may not exist yet, in which case its parent must
        let host_path = match lexical_path.canonicalize() {
            Ok(host_path) => host_path,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                match (lexical_path.parent(), lexical_path.file_name()) {
                    (Some(parent), Some(file_name)) => parent.canonicalize()?.join(file_name),
                    _ => return Err(err),
                }
            }
            Err(err) => return Err(err),
        };

        if !host_path.starts_with(&root) {
            return Err(traversal_prevented());
        }

        Ok(host_path)
    }
}

/// An unrestricted path resolver that simply appends the desired path to the root without checking for bounds.
pub struct UnrestrictedPathResolver {}
impl PathResolver for UnrestrictedPathResolver {
    const NAME: &'static str = "unrestricted";

    fn resolve_path(root: &Path, path: &str) -> crate::Result<PathBuf> {
        Ok(root.join(make_relative(path)))
    }
}

fn traversal_prevented() -> io::Error {
    io::Error::new(ErrorKind::PermissionDenied, "Traversal prevented")
}
