use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wirepeek_codec::data_uri;

use crate::WebError;

const SNIFF_BYTES: u64 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub is_file: bool,
    pub len: u64,
}

/// Filesystem access used by [`ByteSource`].
pub trait FileSource: fmt::Debug + Send + Sync {
    /// Fails with `NotFound` when nothing exists at `path`.
    fn metadata(&self, path: &Path) -> io::Result<FileMetadata>;

    fn sniff_mime_type(&self, path: &Path) -> io::Result<String>;

    /// Reads from `offset` up to `max_len` bytes, or to the end when `max_len` is `None`.
    fn read_range(&self, path: &Path, offset: u64, max_len: Option<u64>) -> io::Result<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFiles;

impl FileSource for LocalFiles {
    fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let metadata = std::fs::metadata(path)?;
        Ok(FileMetadata {
            is_file: metadata.is_file(),
            len: metadata.len(),
        })
    }

    fn sniff_mime_type(&self, path: &Path) -> io::Result<String> {
        let prefix = self.read_range(path, 0, Some(SNIFF_BYTES))?;
        Ok(sniff_mime_type(&prefix).to_string())
    }

    fn read_range(&self, path: &Path, offset: u64, max_len: Option<u64>) -> io::Result<Vec<u8>> {
        let mut file = File::open(path)?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        let mut bytes = Vec::new();
        match max_len {
            Some(limit) => file.take(limit).read_to_end(&mut bytes)?,
            None => file.read_to_end(&mut bytes)?,
        };
        Ok(bytes)
    }
}

/// Guesses a MIME type from the leading bytes of a file's content.
pub fn sniff_mime_type(prefix: &[u8]) -> &'static str {
    if prefix.is_empty() {
        return "application/x-empty";
    }
    if let Some(kind) = infer::get(prefix) {
        return kind.mime_type();
    }
    match std::str::from_utf8(prefix) {
        Ok(_) => "text/plain",
        // A multi-byte character cut off by the sniff window is still text.
        Err(err) if err.error_len().is_none() => "text/plain",
        Err(_) => "application/octet-stream",
    }
}

/// A regular file on disk, usable as a request body or a form field value.
#[derive(Debug, Clone)]
pub struct ByteSource {
    path: PathBuf,
    mime_type: String,
    size: u64,
    file_name: String,
    files: Arc<dyn FileSource>,
}

impl ByteSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WebError> {
        Self::open_with(path, Arc::new(LocalFiles))
    }

    pub fn open_with(path: impl AsRef<Path>, files: Arc<dyn FileSource>) -> Result<Self, WebError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(WebError::InvalidSource("empty path".to_string()));
        }

        let metadata = files
            .metadata(path)
            .map_err(|err| WebError::InvalidSource(format!("{}: {err}", path.display())))?;
        if !metadata.is_file {
            return Err(WebError::InvalidSource(format!(
                "{}: not a regular file",
                path.display()
            )));
        }

        let path = std::path::absolute(path)
            .map_err(|err| WebError::InvalidSource(format!("{}: {err}", path.display())))?;
        let mime_type = files.sniff_mime_type(&path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path,
            mime_type,
            size: metadata.len,
            file_name,
            files,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// `offset` of `None` reads from the start. A `max_len` of `None` or zero
    /// reads to the end of the file.
    pub fn read_range(&self, offset: Option<u64>, max_len: Option<u64>) -> Result<Vec<u8>, WebError> {
        let max_len = max_len.filter(|len| *len > 0);
        Ok(self
            .files
            .read_range(&self.path, offset.unwrap_or(0), max_len)?)
    }

    pub fn read_all(&self) -> Result<Vec<u8>, WebError> {
        self.read_range(None, None)
    }

    pub fn to_data_uri(&self) -> Result<String, WebError> {
        Ok(data_uri(&self.mime_type, &self.read_all()?))
    }
}
