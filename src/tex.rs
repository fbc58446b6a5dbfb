use crate::bin_reader::SpanReader;
use crate::errors::{ReadError, TextureError};
use crate::hfs;
use crate::platform::Platform;
use crate::tex_formats::{PixelFormat, TexelFormat, TileMode};
use crate::tex_loaders;

type Result<T> = std::result::Result<T, TextureError>;

pub const TEX_MAGIC: u32 = 0x0058_4554;
pub const TEXS_MAGIC: u32 = 0x2058_4554;
pub const XET_MAGIC: u32 = 0x5445_5800;

/// Normalized in-memory form of every on-disk texture layout.
///
/// `offsets` are byte offsets into `buffer`, one per face/mip sub-image for
/// layouts that carry an offset table and a single zero for those that do
/// not. Cubemaps store 27 spherical-harmonic coefficients next to their
/// pixels; `face_size` is the per-face stride for layouts that record it.
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub num_mipmaps: u8,
    pub num_faces: u8,
    pub base_format: TexelFormat,
    pub color_correction: [f32; 4],
    pub offsets: Vec<u32>,
    pub buffer: Vec<u8>,
    pub harmonics: Option<[f32; 27]>,
    pub face_size: u32,
}

impl Default for Texture {
    fn default() -> Self {
        Texture {
            width: 0,
            height: 0,
            depth: 1,
            num_mipmaps: 0,
            num_faces: 0,
            base_format: TexelFormat::default(),
            color_correction: [1.0, 1.0, 1.0, 0.0],
            offsets: Vec::new(),
            buffer: Vec::new(),
            harmonics: None,
            face_size: 0,
        }
    }
}

impl Texture {
    /// Decodes a texture stream, peeling an HFS envelope if present and
    /// dispatching on the version slot after the magic.
    pub fn load(data: &[u8], platform: Platform) -> Result<Texture> {
        let stripped = hfs::strip_envelope(data)?;
        let data = stripped.as_deref().unwrap_or(data);
        let mut reader = SpanReader::new(data);

        reader.push();
        let magic = reader.read_u32()?;
        let mut version_raw = [0u8; 4];
        reader.read_exact(&mut version_raw)?;
        reader.pop();

        if magic == XET_MAGIC {
            reader.set_swap_endian(true);
        } else if magic != TEX_MAGIC && magic != TEXS_MAGIC {
            return Err(TextureError::InvalidHeader(magic));
        }

        // The earliest revision stores its version in a single byte and
        // never shipped outside little-endian platforms.
        if version_raw[0] == 0x56 {
            if reader.swapped_endian() {
                return Err(TextureError::PlatformUnsupported {
                    platform: Platform::X360,
                    version: 0x56,
                });
            }
            return tex_loaders::load_x56(&mut reader);
        }

        let platform = if platform == Platform::Auto {
            if reader.swapped_endian() {
                Platform::PS3
            } else {
                Platform::Win32
            }
        } else {
            platform
        };

        let mut version = u16::from_le_bytes([version_raw[0], version_raw[1]]);
        if reader.swapped_endian() {
            version = version.swap_bytes();
        }

        if let Some(texture) = dispatch(version as u32, &mut reader, platform)? {
            return Ok(texture);
        }

        // Later revisions pack the version byte into a 32-bit bit tier, so
        // the u16 view picks up neighboring bits. Retry on the low byte of
        // the full word.
        let mut version32 = u32::from_le_bytes(version_raw);
        if reader.swapped_endian() {
            version32 = version32.swap_bytes();
        }
        match dispatch(version32 & 0xFF, &mut reader, platform)? {
            Some(texture) => Ok(texture),
            None => Err(TextureError::InvalidVersion(version as u32)),
        }
    }
}

fn dispatch(version: u32, reader: &mut SpanReader, platform: Platform) -> Result<Option<Texture>> {
    let texture = match version {
        0x09 => tex_loaders::load_android(reader, platform)?,
        0x66 => tex_loaders::load_x66(reader, platform, false)?,
        0x70 => tex_loaders::load_x66(reader, platform, true)?,
        0x87 => tex_loaders::load_x87(reader, platform)?,
        0x97 | 0x98 | 0x99 | 0x9A | 0x9D => tex_loaders::load_x9d(reader, platform)?,
        0xA0 | 0xA3 => tex_loaders::load_xa0(reader, platform)?,
        0xA4 => tex_loaders::load_3ds(reader, false)?,
        0xA5 | 0xA6 => tex_loaders::load_3ds(reader, true)?,
        _ => return Ok(None),
    };
    Ok(Some(texture))
}

/// Platform-derived tiling for the pixel payload. Runs after format
/// selection on every decode path except the 3DS one, which forces its own
/// tiling.
pub(crate) fn apply_tile_hints(
    format: &mut TexelFormat,
    platform: Platform,
    width: u32,
    height: u32,
) {
    if format.kind == PixelFormat::Rgba8
        && platform == Platform::PS3
        && width.is_power_of_two()
        && height.is_power_of_two()
    {
        format.tile = TileMode::Morton;
    } else if platform == Platform::PS4 {
        format.tile = TileMode::Ps4;
    } else if platform == Platform::NSW {
        format.tile = TileMode::Nx;
    }
}

pub(crate) fn read_harmonics(
    reader: &mut SpanReader,
) -> std::result::Result<[f32; 27], ReadError> {
    let mut harmonics = [0f32; 27];
    for value in harmonics.iter_mut() {
        *value = reader.read_f32()?;
    }
    Ok(harmonics)
}

pub(crate) fn read_offset_table(
    reader: &mut SpanReader,
    count: usize,
) -> std::result::Result<Vec<u32>, ReadError> {
    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(reader.read_u32()?);
    }
    Ok(offsets)
}

/// Rebases absolute file offsets onto the payload, which starts at the
/// current read position once the offset table is consumed.
pub(crate) fn normalize_offsets(offsets: &mut [u32], payload_start: usize) {
    for offset in offsets.iter_mut() {
        *offset = offset.saturating_sub(payload_start as u32);
    }
}

/// Reads the rest of the stream as the pixel payload. Layouts that stored a
/// per-slice size scale by the raw array dimension when it is present.
pub(crate) fn read_payload(
    reader: &mut SpanReader,
    raw_depth: u32,
) -> std::result::Result<Vec<u8>, ReadError> {
    let mut size = reader.remaining();
    if raw_depth > 0 {
        size *= raw_depth as usize;
    }
    reader.read_bytes(size)
}
