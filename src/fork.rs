use crate::error::ResourceError;
use std::process;

/// Remembers the process that created a resource, so that a handle inherited across `fork` is refused instead of
/// being used from the child. Recovering in the child means opening the resource again.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ForkGuard {
    pid: u32,
}

impl ForkGuard {
    /// Creates a guard for the current process.
    pub fn new() -> Self {
        Self { pid: process::id() }
    }

    /// Creates a guard for an arbitrary process id.
    #[cfg(test)]
    pub(crate) fn with_pid(pid: u32) -> Self {
        Self { pid }
    }

    /// Returns the id of the process that created the guard.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns true if the current process is not the one that created the guard.
    pub fn is_forked(&self) -> bool {
        self.pid != process::id()
    }

    /// Returns `Err(ResourceError::Forked)` if the current process is not the one that created the guard.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_forked() {
            return Err(ResourceError::Forked {
                created: self.pid,
                current: process::id(),
            }
            .into());
        }

        Ok(())
    }
}

impl Default for ForkGuard {
    fn default() -> Self {
        Self::new()
    }
}
