use crate::util::{invalid_data, invalid_input, not_supported};
use std::fmt::{Display, Formatter};
use std::io::{Read, Seek, SeekFrom, Write};
use std::str::FromStr;
use std::time::UNIX_EPOCH;
use std::{fmt, fs, io};

/// Bit mask of the file type in [`Metadata::mode`].
pub const S_IFMT: u32 = 0o170000;
/// Directory type bit.
pub const S_IFDIR: u32 = 0o040000;
/// Regular file type bit.
pub const S_IFREG: u32 = 0o100000;

const DEFAULT_DIRECTORY_PERMISSIONS: u32 = 0o755;
const DEFAULT_FILE_PERMISSIONS: u32 = 0o644;

/// The type of a file.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FileType {
    /// A directory.
    Directory,
    /// A file.
    File,
    /// The file type is unknown or unsupported.
    Unknown,
}

impl From<fs::FileType> for FileType {
    fn from(value: fs::FileType) -> Self {
        if value.is_dir() {
            Self::Directory
        } else if value.is_file() {
            Self::File
        } else {
            Self::Unknown
        }
    }
}

/// A directory entry, as returned by `list`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DirEntry {
    /// The path of the entry relative to the listed directory, separated by `/`.
    pub name: String,
    /// Metadata about the file.
    pub metadata: Metadata,
}

impl DirEntry {
    /// Returns true if the entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.metadata.is_directory()
    }

    /// Returns true if the entry is a file.
    pub fn is_file(&self) -> bool {
        self.metadata.is_file()
    }

    /// Returns the length of the file, in bytes.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.metadata.len()
    }
}

/// Metadata about a file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Metadata {
    /// The type of the entry.
    pub file_type: FileType,
    /// The length of the file. Directories report zero.
    pub len: u64,
    /// The modification time, in seconds since the UNIX epoch. Zero when unknown.
    pub modified: u64,
    /// The file type bits and permission bits, as in `st_mode`.
    pub mode: u32,
}

impl Metadata {
    /// Creates metadata, filling in default permissions when the source has none.
    ///
    /// # Arguments
    /// `file_type`: The type of the entry.
    /// `len`: The length, in bytes.
    /// `modified`: The modification time, in seconds since the UNIX epoch.
    /// `permissions`: The permission bits. Any type bits present are replaced.
    pub fn new(file_type: FileType, len: u64, modified: u64, permissions: Option<u32>) -> Self {
        let (type_bits, default_permissions) = match file_type {
            FileType::Directory => (S_IFDIR, DEFAULT_DIRECTORY_PERMISSIONS),
            FileType::File => (S_IFREG, DEFAULT_FILE_PERMISSIONS),
            FileType::Unknown => (0, 0),
        };
        let permissions = permissions.map_or(default_permissions, |mode| mode & !S_IFMT);

        Self {
            file_type,
            len,
            modified,
            mode: type_bits | permissions,
        }
    }

    /// Returns metadata for a directory
    pub fn directory() -> Self {
        Self::new(FileType::Directory, 0, 0, None)
    }

    /// Returns metadata for a file.
    pub fn file(len: u64) -> Self {
        Self::new(FileType::File, len, 0, None)
    }

    /// Returns true if the entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Returns true if the entry is a file.
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    /// Returns the length of the file, in bytes.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.len
    }
}

impl From<fs::Metadata> for Metadata {
    fn from(value: fs::Metadata) -> Self {
        let file_type = FileType::from(value.file_type());
        let len = if file_type == FileType::Directory {
            0
        } else {
            value.len()
        };
        let modified = value
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |duration| duration.as_secs());

        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            Some(value.permissions().mode())
        };
        #[cfg(not(unix))]
        let permissions = value.permissions().readonly().then_some(0o444);

        Self::new(file_type, len, modified, permissions)
    }
}

/// The result of `stat`: the queried path in canonical form along with its metadata.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FileStat {
    /// The canonical form of the queried path.
    pub filename: String,
    /// Metadata about the file.
    pub metadata: Metadata,
}

impl FileStat {
    /// Returns true if the mode bits denote a directory.
    pub fn is_dir(&self) -> bool {
        self.metadata.mode & S_IFMT == S_IFDIR
    }

    /// Returns the size, in bytes.
    pub fn size(&self) -> u64 {
        self.metadata.len
    }

    /// Returns the modification time, in seconds since the UNIX epoch.
    pub fn last_modified(&self) -> u64 {
        self.metadata.modified
    }

    /// Returns the mode bits.
    pub fn mode(&self) -> u32 {
        self.metadata.mode
    }
}

/// Options for opening a file. The default mode is read-only.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OpenOptions {
    /// True if the file should be able to be appended to.
    pub append: bool,
    /// True if the file should be created if not present.
    pub create: bool,
    /// True if opening should fail when the file already exists.
    pub create_new: bool,
    /// True if the file should be able to be read.
    pub read: bool,
    /// True if the file should be truncated.
    pub truncate: bool,
    /// True if the file should be written to.
    pub write: bool,
}

impl From<&OpenOptions> for fs::OpenOptions {
    fn from(value: &OpenOptions) -> Self {
        Self::new()
            .create(value.create)
            .create_new(value.create_new)
            .append(value.append)
            .truncate(value.truncate)
            .read(value.read)
            .write(value.write)
            .clone()
    }
}

impl OpenOptions {
    /// # Arguments
    /// `append`: If true, the file should be opened with the cursor set to the end of the file,
    /// rather than overwriting the file contents. Note that setting this to true will implicitly
    /// enable writing and disable truncation.
    pub fn append(mut self, append: bool) -> Self {
        if append {
            self.write = true;
            self.truncate = false;
        }
        self.append = append;
        self
    }

    /// # Arguments
    /// `create`: If true, the file should be created if it does not exist. Note that setting this
    /// to true will implicitly enable writing.
    pub fn create(mut self, create: bool) -> Self {
        if create {
            self.write = true;
        }
        self.create = create;
        self
    }

    /// # Arguments
    /// `create_new`: If true, the file must not exist yet and will be created. Note that setting
    /// this to true will implicitly enable writing.
    pub fn create_new(mut self, create_new: bool) -> Self {
        if create_new {
            self.write = true;
        }
        self.create_new = create_new;
        self
    }

    /// # Arguments
    /// `read`: If true, the file should be able to be read in entirety.
    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    /// # Arguments
    /// `truncate`: If true, the file should be opened with the cursor set to the beginning of the
    /// file, overwriting all contents. Note that setting this to true will implicitly enable
    /// writing and disable appending.
    pub fn truncate(mut self, truncate: bool) -> Self {
        if truncate {
            self.write = true;
            self.append = false;
        }
        self.truncate = truncate;
        self
    }

    /// # Arguments
    /// `write`: If true, the file should be able to be written. By default, this will truncate
    /// the contents of the file, unless `append` is set.
    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Returns true if the options would modify the file in any way.
    pub fn is_mutating(&self) -> bool {
        self.write || self.append || self.create || self.create_new || self.truncate
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            append: false,
            create: false,
            create_new: false,
            read: true,
            truncate: false,
            write: false,
        }
    }
}

/// A parsed mode string such as `"rb"`, `"w"` or `"a+"`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct OpenMode {
    /// The open options the mode maps to.
    pub options: OpenOptions,
    /// True unless the mode contains `b`.
    pub text: bool,
}

impl OpenMode {
    /// Parses a mode string. Exactly one of `r`, `w`, `a` and `x` must be present, optionally
    /// followed by at most one of `b` and `t` and an optional `+`.
    ///
    /// # Arguments
    /// `mode`: The mode string.
    ///
    /// # Example
    /// ```
    /// use container_fs::file::OpenMode;
    ///
    /// let mode = OpenMode::parse("rb").unwrap();
    /// assert!(!mode.text);
    /// assert!(!mode.options.is_mutating());
    /// assert!(OpenMode::parse("w+").unwrap().options.read);
    /// assert!(OpenMode::parse("rw").is_err());
    /// ```
    pub fn parse(mode: &str) -> crate::Result<Self> {
        let mut primary = None;
        let mut binary = None;
        let mut update = false;

        for c in mode.chars() {
            match c {
                'r' | 'w' | 'a' | 'x' if primary.is_none() => primary = Some(c),
                'b' | 't' if binary.is_none() => binary = Some(c == 'b'),
                '+' if !update => update = true,
                _ => return Err(invalid_input(&format!("invalid mode: '{mode}'"))),
            }
        }

        let options = OpenOptions::default().read(false);
        let options = match primary {
            Some('r') => options.read(true),
            Some('w') => options.create(true).truncate(true),
            Some('a') => options.create(true).append(true),
            Some('x') => options.create_new(true),
            _ => return Err(invalid_input(&format!("invalid mode: '{mode}'"))),
        };
        let options = if update {
            options.read(true).write(true)
        } else {
            options
        };

        Ok(Self {
            options,
            text: !binary.unwrap_or(false),
        })
    }
}

impl FromStr for OpenMode {
    type Err = io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A text encoding for files opened in text mode.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Encoding {
    /// UTF-8.
    #[default]
    Utf8,
}

impl Encoding {
    /// Looks an encoding up by name.
    ///
    /// # Arguments
    /// `name`: The encoding name, such as `"utf-8"`.
    pub fn parse(name: &str) -> crate::Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "utf_8" => Ok(Self::Utf8),
            _ => Err(not_supported()),
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf-8"),
        }
    }
}

/// A file that can be read. Handles can be moved to other threads.
pub trait File: Read + Write + Seek + Send {
    /// Returns the directory entry for the file.
    fn metadata(&self) -> crate::Result<Metadata>;

    /// Reads a file into a vector.
    fn read_into_vec(&mut self) -> crate::Result<Vec<u8>> {
        let mut vec = Vec::with_capacity(self.metadata()?.len() as usize);
        self.read_to_end(&mut vec)?;
        Ok(vec)
    }

    /// Reads a file into a string.
    fn read_into_string(&mut self) -> crate::Result<String> {
        let mut str = String::with_capacity(self.metadata()?.len() as usize);
        self.read_to_string(&mut str)?;
        Ok(str)
    }
}

impl<F: File + ?Sized> File for Box<F> {
    fn metadata(&self) -> crate::Result<Metadata> {
        (**self).metadata()
    }
}

/// A file opened in text mode. Bytes are decoded as they are read rather than up front, so
/// invalid data surfaces from the `read` call that reaches it.
pub struct TextFile<F: File> {
    inner: F,
    encoding: Encoding,
    /// Bytes read from `inner` but not yet handed out.
    pending: Vec<u8>,
    /// How many leading bytes of `pending` are known to be valid.
    validated: usize,
}

const TEXT_CHUNK: usize = 4096;

impl<F: File> TextFile<F> {
    /// Wraps a file for text-mode access.
    ///
    /// # Arguments
    /// `inner`: The binary file.
    /// `encoding`: The encoding of the contents.
    pub fn new(inner: F, encoding: Encoding) -> Self {
        Self {
            inner,
            encoding,
            pending: Vec::new(),
            validated: 0,
        }
    }

    /// Returns the encoding of the file.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the wrapped file.
    pub fn into_inner(self) -> F {
        self.inner
    }

    fn validate_pending(&mut self) -> io::Result<()> {
        match std::str::from_utf8(&self.pending) {
            Ok(_) => self.validated = self.pending.len(),
            // an incomplete sequence at the end may be completed by the next chunk
            Err(err) if err.error_len().is_none() => self.validated = err.valid_up_to(),
            Err(_) => return Err(invalid_data("stream did not contain valid UTF-8")),
        }

        Ok(())
    }
}

impl<F: File> Read for TextFile<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.validated == 0 && !self.pending.is_empty() {
                self.validate_pending()?;
            }

            if self.validated > 0 {
                let n = self.validated.min(buf.len());
                buf[..n].copy_from_slice(&self.pending[..n]);
                self.pending.drain(..n);
                self.validated -= n;
                return Ok(n);
            }

            let mut chunk = [0; TEXT_CHUNK];
            let read = self.inner.read(&mut chunk)?;
            if read == 0 {
                return if self.pending.is_empty() {
                    Ok(0)
                } else {
                    Err(invalid_data("stream ended inside a UTF-8 sequence"))
                };
            }
            self.pending.extend_from_slice(&chunk[..read]);
        }
    }
}

impl<F: File> Seek for TextFile<F> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        // the inner cursor is ahead of the caller by whatever is still buffered
        let pos = match pos {
            SeekFrom::Current(offset) => SeekFrom::Current(offset - self.pending.len() as i64),
            pos => pos,
        };
        let new_pos = self.inner.seek(pos)?;
        self.pending.clear();
        self.validated = 0;

        Ok(new_pos)
    }
}

impl<F: File> Write for TextFile<F> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        std::str::from_utf8(buf).map_err(|_| invalid_input("text must be valid UTF-8"))?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<F: File> File for TextFile<F> {
    fn metadata(&self) -> crate::Result<Metadata> {
        self.inner.metadata()
    }
}
