use std::io;
use std::io::ErrorKind;
use thiserror::Error;

/// The result of a virtual filesystem operation.
pub type Result<T> = io::Result<T>;

/// Failures that concern the lifetime of a filesystem handle rather than a path. These have no
/// `std::io::ErrorKind` of their own, so they travel inside an `io::Error` of kind `Other` and can
/// be recovered with [`resource_error`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ResourceError {
    /// The filesystem was used after `close()`.
    #[error("filesystem used after close")]
    UseAfterClose,
    /// The filesystem was created in another process and inherited across `fork`.
    #[error("filesystem created in process {created} was used from forked process {current}")]
    Forked { created: u32, current: u32 },
}

impl From<ResourceError> for io::Error {
    fn from(value: ResourceError) -> Self {
        io::Error::new(ErrorKind::Other, value)
    }
}

/// Returns the [`ResourceError`] carried by `error`, if any.
///
/// # Example
/// ```
/// use container_fs::error::{resource_error, ResourceError};
///
/// let err = std::io::Error::from(ResourceError::UseAfterClose);
/// assert_eq!(resource_error(&err), Some(&ResourceError::UseAfterClose));
/// ```
pub fn resource_error(error: &io::Error) -> Option<&ResourceError> {
    error.get_ref()?.downcast_ref::<ResourceError>()
}
