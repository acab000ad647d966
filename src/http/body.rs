use crate::http::error::HttpError;
use bytes::{Bytes, BytesMut};

/// In-memory response body stream.
///
/// Streams installed by the application are always readable and writable;
/// the narrower modes exist for bodies handed over by other layers.
#[derive(Debug, Clone)]
pub struct Body {
    buf: BytesMut,
    readable: bool,
    writable: bool,
}

impl Default for Body {
    fn default() -> Self {
        Body::memory()
    }
}

impl Body {
    pub fn memory() -> Self {
        Body {
            buf: BytesMut::new(),
            readable: true,
            writable: true,
        }
    }

    pub fn from_bytes(content: impl AsRef<[u8]>) -> Self {
        let mut body = Body::memory();
        body.buf.extend_from_slice(content.as_ref());
        body
    }

    pub fn read_only(content: impl AsRef<[u8]>) -> Self {
        Body {
            writable: false,
            ..Body::from_bytes(content)
        }
    }

    pub fn write_only() -> Self {
        Body {
            readable: false,
            ..Body::memory()
        }
    }

    /// A detached stream: neither readable nor writable.
    pub fn detached() -> Self {
        Body {
            buf: BytesMut::new(),
            readable: false,
            writable: false,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn write(&mut self, content: &[u8]) -> Result<usize, HttpError> {
        if !self.writable {
            return Err(HttpError::UnableToWriteBody);
        }
        self.buf.extend_from_slice(content);
        Ok(content.len())
    }

    /// Full contents, or nothing when the stream cannot be read.
    pub fn contents(&self) -> Bytes {
        if self.readable {
            Bytes::copy_from_slice(&self.buf)
        } else {
            Bytes::new()
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
