mod bin_reader;
mod crypt;
mod errors;
mod hfs;
mod lzx;
mod platform;
mod tex_formats;
mod tex_headers;
mod tex_loaders;
mod title_registry;
mod zlib;

pub mod arc;
pub mod tex;

#[cfg(test)]
mod utils;

pub use arc::{
    archive_entry_count, extract_archive, ArcEntry, ArcHeader, ExtractContext, ARCC_MAGIC,
    ARC_MAGIC, CRA_MAGIC,
};
pub use bin_reader::{Endian, SpanReader};
pub use crypt::BlowfishStream;
pub use hfs::{strip_envelope, SFH_MAGIC};
pub use platform::Platform;
pub use tex::{Texture, TEXS_MAGIC, TEX_MAGIC, XET_MAGIC};
pub use tex_formats::{PixelFormat, TexelFormat, TexelSwizzle, TileMode};
pub use title_registry::{hash_v1, hash_v2, ArcSupport, TitleRegistry, TitleSupport};
pub use zlib::{compress_zlib, inflate_into};

pub use errors::{
    ArchiveError, CompressionError, EnvelopeError, ReadError, TextureError,
};
