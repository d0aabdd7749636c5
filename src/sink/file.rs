//! File sink: a destination file with a write-coalescing buffer and
//! device+inode rotation detection.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libc::c_int;

use crate::constants::{FILE_SINK_BUFFER_SIZE, LOG_DIR_MODE, LOG_FILE_MODE};
use crate::error::{Error, Result};
use crate::formatter::{Formatter, PatternFormatter};
use crate::internal_log::InternalLog;
use crate::record::{Level, LogRecord};
use crate::sink::Sink;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

fn path_to_cstring(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))
}

fn raw_open(path: &Path) -> io::Result<c_int> {
    let c_path = path_to_cstring(path)?;
    let fd = unsafe {
        libc::open(
            c_path.as_ptr(),
            libc::O_WRONLY | libc::O_APPEND | libc::O_CREAT,
            LOG_FILE_MODE,
        )
    };
    if fd < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(fd)
    }
}

fn stat_identity(path: &Path) -> io::Result<FileIdentity> {
    let c_path = path_to_cstring(path)?;
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::stat(c_path.as_ptr(), &mut st) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(FileIdentity {
        dev: st.st_dev as u64,
        ino: st.st_ino as u64,
    })
}

/// Recursively create `dir` (and any missing parents) at mode 0755,
/// tolerating components that already exist. Equivalent to the original's
/// `_mkdir_recursive`, expressed with `std::fs` rather than hand-rolled
/// path splitting.
fn create_dir_recursive(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(LOG_DIR_MODE)
        .create(dir)
}

/// A destination file with a 4096-byte write-coalescing buffer and
/// rotation detection via device+inode comparison, performed lazily at
/// each `flush`.
pub struct FileSink {
    path: PathBuf,
    fd: c_int,
    identity: Option<FileIdentity>,
    buffer: Vec<u8>,
    format_buf: String,
    formatter: Box<dyn Formatter>,
    internal: Arc<InternalLog>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, pattern: &str, internal: Arc<InternalLog>) -> Self {
        Self::with_formatter(path, Box::new(PatternFormatter::new(pattern)), internal)
    }

    pub fn with_formatter(
        path: impl Into<PathBuf>,
        formatter: Box<dyn Formatter>,
        internal: Arc<InternalLog>,
    ) -> Self {
        Self {
            path: path.into(),
            fd: -1,
            identity: None,
            buffer: Vec::with_capacity(FILE_SINK_BUFFER_SIZE),
            format_buf: String::with_capacity(256),
            formatter,
            internal,
        }
    }

    /// Rotation detection: reopen if the fd is closed, or if the path's
    /// on-disk identity no longer matches what's held open.
    fn reload(&mut self) -> Result<()> {
        if self.fd < 0 {
            self.open_fresh()
        } else {
            match stat_identity(&self.path) {
                Ok(current) if Some(current) == self.identity => Ok(()),
                Ok(_) => {
                    self.internal
                        .log(Level::Info, "log file changed, reopen file");
                    self.close();
                    self.reload()
                }
                Err(e) if e.raw_os_error() == Some(libc::ENOENT) => {
                    self.internal
                        .log(Level::Info, "log file changed, reopen file");
                    self.close();
                    self.reload()
                }
                Err(e) => {
                    self.internal
                        .log(Level::Error, &format!("stat() failed: {e}"));
                    Err(Error::sink_io(format!("stat() failed: {e}")))
                }
            }
        }
    }

    fn open_fresh(&mut self) -> Result<()> {
        let fd = match raw_open(&self.path) {
            Ok(fd) => fd,
            Err(e) if e.raw_os_error() == Some(libc::ENOENT) => {
                self.internal
                    .log(Level::Error, &format!("open log file failed: {e}"));
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    if let Err(mk_err) = create_dir_recursive(parent) {
                        self.internal
                            .log(Level::Fatal, &format!("mkdir failed: {mk_err}"));
                        return Err(Error::sink_io(format!("mkdir failed: {mk_err}")));
                    }
                    self.internal.log(Level::Info, "created log dir");
                }
                match raw_open(&self.path) {
                    Ok(fd) => fd,
                    Err(e2) => {
                        self.internal.log(
                            Level::Fatal,
                            &format!("open log file again failed: {e2}"),
                        );
                        return Err(Error::sink_io(format!("open failed: {e2}")));
                    }
                }
            }
            Err(e) => {
                self.internal
                    .log(Level::Error, &format!("open log file failed: {e}"));
                return Err(Error::sink_io(format!("open failed: {e}")));
            }
        };

        self.fd = fd;
        match stat_identity(&self.path) {
            Ok(identity) => {
                self.identity = Some(identity);
                Ok(())
            }
            Err(e) => {
                self.internal
                    .log(Level::Error, &format!("stat() failed: {e}"));
                Err(Error::sink_io(format!("stat() failed: {e}")))
            }
        }
    }

    /// Drain the coalescing buffer with a single write call. Discards the
    /// buffer on error; there is no replay.
    fn drain_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let result = raw_write(self.fd, &self.buffer);
        self.buffer.clear();
        result
    }
}

fn raw_write(fd: c_int, bytes: &[u8]) -> Result<()> {
    let n = unsafe { libc::write(fd, bytes.as_ptr() as *const libc::c_void, bytes.len()) };
    if n < 0 || n as usize != bytes.len() {
        return Err(Error::sink_io("fwrite() error"));
    }
    Ok(())
}

impl Sink for FileSink {
    fn write(&mut self, record: LogRecord) -> Result<()> {
        if self.fd < 0 {
            if let Err(e) = self.reload() {
                self.internal.log(Level::Fatal, "reload failed");
                drop(record);
                return Err(e);
            }
        }

        self.format_buf.clear();
        self.formatter.format(&record, &mut self.format_buf);
        self.format_buf.push('\n');
        drop(record);

        let needed = self.format_buf.len();
        if self.buffer.len() + needed > FILE_SINK_BUFFER_SIZE {
            self.drain_buffer()?;
        }

        if needed >= FILE_SINK_BUFFER_SIZE {
            raw_write(self.fd, self.format_buf.as_bytes())
        } else {
            self.buffer.extend_from_slice(self.format_buf.as_bytes());
            Ok(())
        }
    }

    fn flush(&mut self) -> Result<()> {
        if self.fd >= 0 {
            self.drain_buffer()?;
        }
        self.reload()
    }

    fn close(&mut self) {
        if self.fd >= 0 {
            unsafe {
                libc::close(self.fd);
            }
            self.fd = -1;
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        self.close();
    }
}
