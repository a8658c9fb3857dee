use crate::file::{File, Metadata, OpenOptions};
use crate::util::{invalid_input, not_supported};
use enumflags2::{bitflags, BitFlags};
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};

/// The file open mode.
#[bitflags]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum FileMode {
    Read,
    Write,
    Append,
}

impl FileMode {
    /// Collects file modes from the associated open options.
    ///
    /// # Arguments
    /// `open_options`: The open options.
    pub fn from_options(open_options: &OpenOptions) -> BitFlags<Self> {
        let mut mode = BitFlags::empty();
        if open_options.read {
            mode.insert(FileMode::Read);
        }
        if open_options.write {
            mode.insert(FileMode::Write);
        }
        if open_options.append {
            mode.insert(FileMode::Append);
        }

        mode
    }
}

/// An open handle to a file in the memory filesystem. The contents are locked only for the duration of each
/// operation, so several handles to one file can be open at once.
pub struct FileHandle {
    contents: super::File,
    pos: usize,
    mode: BitFlags<FileMode>,
}

impl FileHandle {
    /// Creates a new file handle with the given contents and mode.
    ///
    /// # Arguments
    /// `contents`: The shared file contents.
    /// `mode`: The file open mode.
    pub fn new(contents: super::File, mode: BitFlags<FileMode>) -> Self {
        Self {
            contents,
            pos: 0,
            mode,
        }
    }

    /// Clear the contents of the file.
    pub fn clear(&mut self) {
        self.contents.lock().clear()
    }

    /// Checks to ensure that the required mode is active.
    fn check_mode(mode: bool) -> io::Result<()> {
        if mode {
            Ok(())
        } else {
            Err(not_supported())
        }
    }
}

impl Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Self::check_mode(self.mode.contains(FileMode::Read))?;

        let contents = self.contents.lock();
        let start_pos = self.pos.min(contents.len());
        let n = (&contents[start_pos..]).read(buf)?;
        self.pos = start_pos + n;

        Ok(n)
    }
}

impl Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (base_pos, offset) = match pos {
            SeekFrom::Start(n) => {
                self.pos = n as usize;
                return Ok(n);
            }
            SeekFrom::Current(n) => (self.pos as u64, n),
            SeekFrom::End(n) => (self.contents.lock().len() as u64, n),
        };

        if let Some(n) = base_pos.checked_add_signed(offset) {
            self.pos = n as usize;
            Ok(n)
        } else {
            Err(invalid_input(
                "Invalid seek to a negative or overflowing position",
            ))
        }
    }
}

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Self::check_mode(self.mode.contains(FileMode::Write))?;

        let mut contents = self.contents.lock();
        // appends always land at the end, wherever the cursor was moved
        let pos = if self.mode.contains(FileMode::Append) {
            contents.len()
        } else {
            self.pos.min(contents.len())
        };
        let needed_len = pos.saturating_add(buf.len());

        if needed_len > contents.len() {
            contents.resize(needed_len, 0);
        }

        contents[pos..needed_len].copy_from_slice(buf);
        self.pos = needed_len;

        Ok(needed_len - pos)
    }

    fn flush(&mut self) -> io::Result<()> {
        Self::check_mode(self.mode.contains(FileMode::Write))?;

        // there's nothing to flush
        Ok(())
    }
}

impl File for FileHandle {
    fn metadata(&self) -> crate::Result<Metadata> {
        Ok(Metadata::file(self.contents.lock().len() as u64))
    }
}
