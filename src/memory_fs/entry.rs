use crate::file::Metadata;
use crate::memory_fs::File;
use crate::tree::Entry;

impl From<&Entry<File>> for Metadata {
    fn from(value: &Entry<File>) -> Self {
        match value {
            Entry::Directory(_) => Self::directory(),
            Entry::UserData(file) => Self::file(file.lock().len() as u64),
        }
    }
}

/// Counts the files and directories below an entry.
pub(crate) fn count(entry: &Entry<File>) -> (usize, usize) {
    let mut counts = (0, 0);
    entry.walk(&mut |_: &str, entry: &Entry<File>| match entry {
        Entry::Directory(_) => counts.1 += 1,
        Entry::UserData(_) => counts.0 += 1,
    });

    counts
}
