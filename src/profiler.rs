use crate::file::{DirEntry, Encoding, File, FileStat, OpenOptions};
use crate::zip_fs::ContainerFS;
use crate::FileSystem;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// One completed call, in the Chrome trace event format. Times are in microseconds.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub name: String,
    pub args: Vec<String>,
    pub ph: &'static str,
    pub ts: u64,
    pub dur: u64,
    pub pid: u32,
    pub tid: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChromeTrace<'a> {
    trace_events: &'a [TraceEvent],
    display_time_unit: &'static str,
    system_trace_events: &'static str,
    other_data: OtherData,
}

#[derive(Serialize)]
struct OtherData {
    app: &'static str,
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Records how long filesystem calls take. Recording is off until [`Profiler::profiling`] or
/// [`Profiler::set_enabled`] turns it on; while it is off, calls pass straight through.
pub struct Profiler {
    start: Instant,
    enabled: AtomicBool,
    events: Mutex<Vec<TraceEvent>>,
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            enabled: AtomicBool::new(false),
            events: Mutex::default(),
        }
    }

    /// Returns true if calls are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Turns recording on until the returned guard is dropped, after which the previous setting is restored.
    ///
    /// # Example
    /// ```
    /// use container_fs::profiler::Profiler;
    ///
    /// let profiler = Profiler::new();
    /// {
    ///     let _profiling = profiler.profiling();
    ///     profiler.record("list", vec![], || ());
    /// }
    /// profiler.record("list", vec![], || ());
    /// assert_eq!(profiler.events().len(), 1);
    /// ```
    pub fn profiling(&self) -> ProfilingGuard<'_> {
        let previous = self.enabled.swap(true, Ordering::Relaxed);
        ProfilingGuard {
            profiler: self,
            previous,
        }
    }

    /// Runs `f`, recording its duration as an event named `name` if recording is on.
    ///
    /// # Arguments
    /// `name`: The name of the operation.
    /// `args`: The arguments of the operation, for display.
    /// `f`: The operation.
    pub fn record<R, F: FnOnce() -> R>(&self, name: &str, args: Vec<String>, f: F) -> R {
        if !self.is_enabled() {
            return f();
        }

        let span = tracing::trace_span!("fs_call", operation = name, ?args);
        let _entered = span.enter();
        let started = Instant::now();
        let result = f();
        let dur = started.elapsed().as_micros() as u64;

        self.events.lock().push(TraceEvent {
            name: name.to_owned(),
            args,
            ph: "X",
            ts: started.duration_since(self.start).as_micros() as u64,
            dur,
            pid: process::id(),
            tid: THREAD_ID.with(|id| *id),
        });

        result
    }

    /// Returns every event recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Writes the recorded events as a Chrome trace, readable by `chrome://tracing`.
    pub fn write_chrome_trace<W: Write>(&self, writer: W) -> crate::Result<()> {
        let events = self.events.lock();
        let trace = ChromeTrace {
            trace_events: &events,
            display_time_unit: "ms",
            system_trace_events: "ContainerFSEventTrace",
            other_data: OtherData {
                app: "container-fs profile",
            },
        };

        serde_json::to_writer(writer, &trace)?;
        Ok(())
    }

    /// Writes the recorded events as a Chrome trace to `path`, creating its parent directories.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(fs::File::create(path)?);
        self.write_chrome_trace(&mut writer)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), "wrote profile");
        Ok(())
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Where profiles are written by default: `chrome_profile.<pid>.json` below `$HOME/.container-fs/profile`, or
/// below the temporary directory when there is no home directory.
pub fn default_profile_path() -> PathBuf {
    let base = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    base.join(".container-fs")
        .join("profile")
        .join(format!("chrome_profile.{}.json", process::id()))
}

/// Restores the previous recording setting when dropped.
pub struct ProfilingGuard<'a> {
    profiler: &'a Profiler,
    previous: bool,
}

impl Drop for ProfilingGuard<'_> {
    fn drop(&mut self) {
        self.profiler.set_enabled(self.previous);
    }
}

/// A filesystem that records the duration of every call on another one.
pub struct ProfiledFS<F: FileSystem> {
    inner: F,
    label: String,
    profiler: Arc<Profiler>,
}

impl<F: FileSystem> ProfiledFS<F> {
    /// Wraps `inner`. Events carry `label` as their first argument.
    pub fn new(inner: F, label: impl Into<String>, profiler: Arc<Profiler>) -> Self {
        Self {
            inner,
            label: label.into(),
            profiler,
        }
    }

    pub fn profiler(&self) -> &Arc<Profiler> {
        &self.profiler
    }

    pub fn into_inner(self) -> F {
        self.inner
    }

    fn record<R>(&self, name: &str, paths: &[&str], f: impl FnOnce(&F) -> R) -> R {
        let args = std::iter::once(self.label.clone())
            .chain(paths.iter().map(|path| path.to_string()))
            .collect();
        self.profiler.record(name, args, || f(&self.inner))
    }
}

impl<F: FileSystem> FileSystem for ProfiledFS<F> {
    fn create_dir(&self, path: &str) -> crate::Result<()> {
        self.record("create_dir", &[path], |fs| fs.create_dir(path))
    }

    fn info(&self) -> crate::Result<String> {
        self.record("info", &[], |fs| fs.info())
    }

    fn list(
        &self,
        path: &str,
        recursive: bool,
    ) -> crate::Result<Box<dyn Iterator<Item = crate::Result<DirEntry>>>> {
        self.record("list", &[path], |fs| fs.list(path, recursive))
    }

    fn open_file_options(&self, path: &str, options: &OpenOptions) -> crate::Result<Box<dyn File>> {
        self.record("open", &[path], |fs| fs.open_file_options(path, options))
    }

    fn remove(&self, path: &str, recursive: bool) -> crate::Result<()> {
        self.record("remove", &[path], |fs| fs.remove(path, recursive))
    }

    fn rename(&self, from: &str, to: &str) -> crate::Result<()> {
        self.record("rename", &[from, to], |fs| fs.rename(from, to))
    }

    fn stat(&self, path: &str) -> crate::Result<FileStat> {
        self.record("stat", &[path], |fs| fs.stat(path))
    }

    fn close(&self) -> crate::Result<()> {
        self.record("close", &[], |fs| fs.close())
    }

    fn create_dir_all(&self, path: &str) -> crate::Result<()> {
        self.record("create_dir_all", &[path], |fs| fs.create_dir_all(path))
    }

    fn exists(&self, path: &str) -> crate::Result<bool> {
        self.record("exists", &[path], |fs| fs.exists(path))
    }

    fn is_dir(&self, path: &str) -> crate::Result<bool> {
        self.record("is_dir", &[path], |fs| fs.is_dir(path))
    }

    fn open_with_encoding(&self, path: &str, mode: &str, encoding: Encoding) -> crate::Result<Box<dyn File>> {
        self.record("open", &[path, mode], |fs| {
            fs.open_with_encoding(path, mode, encoding)
        })
    }

    fn open_as_container(&self, path: &str, mode: &str) -> crate::Result<ContainerFS> {
        self.record("open_as_container", &[path, mode], |fs| {
            fs.open_as_container(path, mode)
        })
    }
}
