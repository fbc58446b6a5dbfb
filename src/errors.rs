use thiserror::Error;

use crate::platform::Platform;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Out of bounds read of {count} bytes at 0x{position:x} in a stream of size 0x{size:x}.")]
    OutOfBounds {
        position: usize,
        count: usize,
        size: usize,
    },

    #[error("Seek before the start of the stream.")]
    NegativeSeek,

    #[error("Unable to decode a text field.")]
    BadText,
}

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Malformed envelope header 0x{0:08X}.")]
    Malformed(u32),

    #[error(transparent)]
    Io(#[from] ReadError),
}

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("LZX decompression failed: {0}")]
    LzxFailed(String),

    #[error("Zlib inflate failed: {0}")]
    ZlibFailed(String),

    #[error("Zlib deflate failed: {0}")]
    ZlibCompressFailed(String),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid archive magic 0x{0:08X}.")]
    InvalidHeader(u32),

    #[error("Encrypted archives are not supported for title '{0}'.")]
    EncryptedArchiveUnsupported(String),

    #[error("Extraction sink does not implement {0}.")]
    ImplementationError(String),

    #[error(transparent)]
    Decompression(#[from] CompressionError),

    #[error(transparent)]
    IOError(#[from] ReadError),
}

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Invalid texture magic 0x{0:08X}.")]
    InvalidHeader(u32),

    #[error("No decoder registered for texture version 0x{0:X}.")]
    InvalidVersion(u32),

    #[error("Unknown pixel format 0x{raw:X} in the {context} table.")]
    UnknownPixelFormat { raw: u32, context: &'static str },

    #[error("Cubemaps are not supported by this texture version.")]
    CubemapsUnsupported,

    #[error("{platform} texture version 0x{version:X} is unsupported.")]
    PlatformUnsupported { platform: Platform, version: u32 },

    #[error("Failed to parse an embedded header: {0}")]
    ParserError(String),

    #[error(transparent)]
    IOError(#[from] ReadError),
}

impl From<EnvelopeError> for ArchiveError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Malformed(magic) => ArchiveError::InvalidHeader(magic),
            EnvelopeError::Io(err) => ArchiveError::IOError(err),
        }
    }
}

impl From<EnvelopeError> for TextureError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Malformed(magic) => TextureError::InvalidHeader(magic),
            EnvelopeError::Io(err) => TextureError::IOError(err),
        }
    }
}
