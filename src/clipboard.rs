//! Copying exported text out of the application.
//!
//! The primary clipboard is asynchronous and may fail; a synchronous fallback
//! is tried before giving up and asking the user to copy by hand.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard write failed: {0}")]
    Primary(String),

    #[error("fallback copy failed: {0}")]
    Fallback(String),

    #[error("copy failed, copy the text manually")]
    Unavailable,
}

/// The primary, asynchronous clipboard.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> impl Future<Output = Result<(), ClipboardError>>;
}

/// A synchronous copy path used when the clipboard fails.
pub trait FallbackCopy {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Which path the text ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Clipboard,
    Fallback,
}

/// Copy `text` to `primary`, falling back to `fallback`.
pub async fn copy_text<C, F>(
    primary: &mut C,
    fallback: &mut F,
    text: &str,
) -> Result<CopyPath, ClipboardError>
where
    C: Clipboard,
    F: FallbackCopy,
{
    let primary_err = match primary.write_text(text).await {
        Ok(()) => return Ok(CopyPath::Clipboard),
        Err(e) => e,
    };
    warn!(reason = %primary_err, "clipboard unavailable, using fallback copy");

    match fallback.copy(text) {
        Ok(()) => Ok(CopyPath::Fallback),
        Err(e) => {
            warn!(reason = %e, "fallback copy failed");
            Err(ClipboardError::Unavailable)
        }
    }
}

/// A clipboard backed by a file the user can open.
#[derive(Debug, Clone)]
pub struct FileClipboard {
    path: PathBuf,
}

impl FileClipboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Clipboard for FileClipboard {
    async fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| ClipboardError::Primary(format!("{}: {e}", self.path.display())))
    }
}

/// Fallback that prints the text to a writer for manual copying.
#[derive(Debug)]
pub struct WriterCopy<W> {
    writer: W,
}

impl<W: Write> WriterCopy<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FallbackCopy for WriterCopy<W> {
    fn copy(&mut self, text: &str) -> Result<(), ClipboardError> {
        writeln!(self.writer, "{text}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| ClipboardError::Fallback(e.to_string()))
    }
}
