#![forbid(unsafe_code)]

//! File descriptors and the handle interface the rendering engine sees.

use std::{
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::Stream;
use inline_media_bridge::{BridgeEvent, BridgeReader, BridgeState, StreamBridge, WebReadableStream};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, ReadBuf};

use crate::{AttachError, RetrievalError};

/// Media kind used by the rendering engine to pick a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Pdf,
    Other,
}

impl MediaKind {
    /// Detect the kind from a file name's extension (case-insensitive).
    pub fn from_name(name: &str) -> Self {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return Self::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "svg" | "avif" => Self::Image,
            "mp4" | "webm" | "mkv" | "mov" | "m4v" | "ogv" => Self::Video,
            "mp3" | "wav" | "flac" | "aac" | "m4a" | "ogg" | "oga" | "opus" => Self::Audio,
            "pdf" => Self::Pdf,
            _ => Self::Other,
        }
    }

    /// Detect the kind from a MIME type's top-level type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let (top, sub) = mime.split_once('/')?;
        match (top, sub) {
            ("image", _) => Some(Self::Image),
            ("video", _) => Some(Self::Video),
            ("audio", _) => Some(Self::Audio),
            ("application", "pdf") => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Pdf => "pdf",
            Self::Other => "other",
        })
    }
}

/// Descriptive fields of a retrieved file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    /// Path inside the retrieved bundle.
    pub path: String,
    /// Size in bytes as announced by the transfer.
    pub length: u64,
    pub mime: Option<String>,
}

impl FileMetadata {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            length,
            mime: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// MIME type wins when it names a known kind, otherwise the extension.
    pub fn kind(&self) -> MediaKind {
        self.mime
            .as_deref()
            .and_then(MediaKind::from_mime)
            .unwrap_or_else(|| MediaKind::from_name(&self.name))
    }
}

/// Identity of one file within a retrieval result.
///
/// Names are not guaranteed unique, so the position is part of the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileKey {
    pub index: usize,
    pub name: String,
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.name)
    }
}

/// Capability to open the raw (still encrypted) bytes of a file.
pub trait RawStreamOpener: Send + Sync {
    fn open_raw(&self) -> Result<Box<dyn WebReadableStream>, RetrievalError>;
}

/// What the rendering engine renders.
///
/// Both the raw [`FileDescriptor`] and the [`DecryptedFileHandle`] implement
/// it; the engine dispatches on [`kind`](Self::kind), never on the concrete
/// type.
pub trait MediaHandle: Send + Sync + fmt::Debug {
    fn metadata(&self) -> &FileMetadata;

    fn kind(&self) -> MediaKind {
        self.metadata().kind()
    }

    /// Open a fresh reader over the file bytes.
    ///
    /// May spawn the bridge pump, so it must be called from within a Tokio
    /// runtime.
    fn open_stream(&self) -> Result<MediaStream, AttachError>;
}

/// Shared handle to one bridged stream.
///
/// Clones refer to the same single-pass stream; bytes taken through one
/// clone are gone for the others.
#[derive(Clone, Debug)]
pub struct MediaStream {
    inner: Arc<Mutex<BridgeReader>>,
}

impl MediaStream {
    pub fn new(reader: BridgeReader) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reader)),
        }
    }

    /// True when both handles refer to the same underlying stream.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn state(&self) -> BridgeState {
        self.inner.lock().state()
    }

    pub fn pause(&self) {
        self.inner.lock().pause();
    }

    pub fn resume(&self) {
        self.inner.lock().resume();
    }

    pub fn destroy(&self) {
        self.inner.lock().destroy();
    }
}

impl Stream for MediaStream {
    type Item = BridgeEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.lock().poll_event(cx)
    }
}

impl AsyncRead for MediaStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let mut reader = self.inner.lock();
        Pin::new(&mut *reader).poll_read(cx, buf)
    }
}

/// A retrieved file: metadata plus the raw stream capability.
#[derive(Clone)]
pub struct FileDescriptor {
    metadata: FileMetadata,
    opener: Arc<dyn RawStreamOpener>,
}

impl FileDescriptor {
    pub fn new(metadata: FileMetadata, opener: impl RawStreamOpener + 'static) -> Self {
        Self {
            metadata,
            opener: Arc::new(opener),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Open the encrypted bytes. Each call opens a fresh stream.
    pub fn open_raw(&self) -> Result<Box<dyn WebReadableStream>, RetrievalError> {
        self.opener.open_raw()
    }
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl MediaHandle for FileDescriptor {
    fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    /// Must be called from within a Tokio runtime.
    fn open_stream(&self) -> Result<MediaStream, AttachError> {
        let raw = self
            .open_raw()
            .map_err(|e| AttachError::Stream(e.to_string()))?;
        Ok(MediaStream::new(StreamBridge::default().wrap(raw)))
    }
}

/// A [`FileDescriptor`] whose stream yields plaintext.
///
/// Carries the source's metadata unchanged. `open_stream` always returns the
/// same memoized stream: the decrypted source can be read once only.
#[derive(Debug)]
pub struct DecryptedFileHandle {
    metadata: FileMetadata,
    stream: MediaStream,
}

impl DecryptedFileHandle {
    pub(crate) fn new(source: &FileDescriptor, stream: MediaStream) -> Self {
        Self {
            metadata: source.metadata.clone(),
            stream,
        }
    }
}

impl MediaHandle for DecryptedFileHandle {
    fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    fn open_stream(&self) -> Result<MediaStream, AttachError> {
        Ok(self.stream.clone())
    }
}
