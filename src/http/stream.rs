//! In-memory byte stream shared by message bodies.
//!
//! Clones share one buffer and one cursor, so a body handle kept by an earlier
//! copy of a message observes bytes written through a later copy.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Access mode fixed when the stream is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Read,
    Write,
    ReadWrite,
}

/// Seekable in-memory stream.
#[derive(Debug, Clone)]
pub struct Stream {
    inner: Arc<Mutex<Option<Cursor<Vec<u8>>>>>,
    mode: StreamMode,
}

impl Default for Stream {
    fn default() -> Self {
        Self::memory()
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Stream {
    /// Empty read-write stream.
    pub fn memory() -> Self {
        Self::with_mode(Vec::new(), StreamMode::ReadWrite)
    }

    /// Read-write stream positioned at the start of `bytes`.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_mode(bytes.into(), StreamMode::ReadWrite)
    }

    pub fn with_mode(bytes: Vec<u8>, mode: StreamMode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Cursor::new(bytes)))),
            mode,
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, Option<Cursor<Vec<u8>>>>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("stream lock poisoned"))
    }

    fn with_cursor<T>(&self, f: impl FnOnce(&mut Cursor<Vec<u8>>) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self.lock()?;
        match guard.as_mut() {
            Some(cursor) => f(cursor),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "stream is closed")),
        }
    }

    /// Release the buffer. Later operations fail.
    pub fn close(&self) {
        if let Ok(mut guard) = self.lock() {
            guard.take();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|guard| guard.is_none()).unwrap_or(true)
    }

    pub fn is_readable(&self) -> bool {
        !self.is_closed() && matches!(self.mode, StreamMode::Read | StreamMode::ReadWrite)
    }

    pub fn is_writable(&self) -> bool {
        !self.is_closed() && matches!(self.mode, StreamMode::Write | StreamMode::ReadWrite)
    }

    pub fn is_seekable(&self) -> bool {
        !self.is_closed()
    }

    pub fn size(&self) -> io::Result<u64> {
        self.with_cursor(|cursor| Ok(cursor.get_ref().len() as u64))
    }

    pub fn tell(&self) -> io::Result<u64> {
        self.with_cursor(|cursor| Ok(cursor.position()))
    }

    pub fn eof(&self) -> io::Result<bool> {
        self.with_cursor(|cursor| Ok(cursor.position() >= cursor.get_ref().len() as u64))
    }

    pub fn seek(&self, pos: SeekFrom) -> io::Result<u64> {
        self.with_cursor(|cursor| cursor.seek(pos))
    }

    pub fn rewind(&self) -> io::Result<()> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Read up to `len` bytes from the current position.
    pub fn read(&self, len: usize) -> io::Result<Vec<u8>> {
        self.ensure(self.is_readable(), "stream is not readable")?;
        self.with_cursor(|cursor| {
            let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
            let mut buf = vec![0; len.min(usize::try_from(remaining).unwrap_or(usize::MAX))];
            let read = cursor.read(&mut buf)?;
            buf.truncate(read);
            Ok(buf)
        })
    }

    /// Write `bytes` at the current position and return how many were written.
    pub fn write(&self, bytes: &[u8]) -> io::Result<usize> {
        self.ensure(self.is_writable(), "stream is not writable")?;
        self.with_cursor(|cursor| {
            cursor.write_all(bytes)?;
            Ok(bytes.len())
        })
    }

    /// Remaining bytes from the current position.
    pub fn contents(&self) -> io::Result<Vec<u8>> {
        self.ensure(self.is_readable(), "stream is not readable")?;
        self.with_cursor(|cursor| {
            let mut rest = Vec::new();
            cursor.read_to_end(&mut rest)?;
            Ok(rest)
        })
    }

    /// The whole buffer regardless of position.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        self.with_cursor(|cursor| Ok(cursor.get_ref().clone()))
    }

    fn ensure(&self, allowed: bool, reason: &'static str) -> io::Result<()> {
        if allowed || self.is_closed() {
            // a closed stream reports its own error from with_cursor
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, reason))
        }
    }
}
