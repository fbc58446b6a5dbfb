use crate::errors::TextureError;
use crate::platform::Platform;

type Result<T> = std::result::Result<T, TextureError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
    Bc6,
    Bc7,
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    Rgba4,
    R5g6b5,
    Rgb10a2,
    Rgba16,
    Etc1,
    Etc1A4,
    Pvrtc4,
    R4,
    Rg4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelSwizzle {
    R,
    G,
    B,
    A,
    DeriveZ,
    Zero,
    One,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    Linear,
    Morton,
    Ps4,
    Nx,
    N3ds,
}

/// Normalized pixel-format descriptor shared by every texture version.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexelFormat {
    pub kind: PixelFormat,
    pub snorm: bool,
    pub premult_alpha: bool,
    pub tile: TileMode,
    pub swizzle: [TexelSwizzle; 4],
    pub swap_packed: bool,
}

impl Default for TexelFormat {
    fn default() -> Self {
        TexelFormat {
            kind: PixelFormat::Rgba8,
            snorm: false,
            premult_alpha: false,
            tile: TileMode::Linear,
            swizzle: [
                TexelSwizzle::R,
                TexelSwizzle::G,
                TexelSwizzle::B,
                TexelSwizzle::A,
            ],
            swap_packed: false,
        }
    }
}

impl TexelFormat {
    pub fn with_kind(kind: PixelFormat) -> Self {
        TexelFormat {
            kind,
            ..TexelFormat::default()
        }
    }
}

pub const FOURCC_DXT1: u32 = 0x3154_5844;
pub const FOURCC_DXT2: u32 = 0x3254_5844;
pub const FOURCC_DXT3: u32 = 0x3354_5844;
pub const FOURCC_DXT5: u32 = 0x3554_5844;

/// First-generation format field: a DDS fourcc or a packed-integer code.
pub fn from_fourcc(raw: u32) -> Result<TexelFormat> {
    let format = match raw {
        FOURCC_DXT1 => TexelFormat::with_kind(PixelFormat::Bc1),
        FOURCC_DXT2 => TexelFormat {
            premult_alpha: true,
            ..TexelFormat::with_kind(PixelFormat::Bc2)
        },
        FOURCC_DXT3 => TexelFormat::with_kind(PixelFormat::Bc2),
        FOURCC_DXT5 => TexelFormat::with_kind(PixelFormat::Bc3),
        0x15 => TexelFormat::with_kind(PixelFormat::Rgba8),
        0x3C => TexelFormat {
            snorm: true,
            ..TexelFormat::with_kind(PixelFormat::Rg8)
        },
        _ => {
            return Err(TextureError::UnknownPixelFormat {
                raw,
                context: "fourcc",
            })
        }
    };
    Ok(format)
}

/// Second-generation format codes shared by the x87 and x9D families.
///
/// Two codes are platform-sensitive: the compressed grayscale slot decodes
/// to BC4 on PS4/NSW but BC1 elsewhere, and the derived-normal-map slot to
/// BC5 on PS4/NSW but BC3 elsewhere.
pub fn from_v2(raw: u8, platform: Platform) -> Result<TexelFormat> {
    let modern = matches!(platform, Platform::PS4 | Platform::NSW);
    let format = match raw {
        0x02 => TexelFormat::with_kind(PixelFormat::Rgba16),
        0x07 => TexelFormat::with_kind(PixelFormat::R8),
        0x09 => TexelFormat::with_kind(PixelFormat::Rgba8),
        0x0E => TexelFormat::with_kind(PixelFormat::Rgb10a2),
        0x13 | 0x14 => TexelFormat::with_kind(PixelFormat::Bc1),
        0x15 => TexelFormat::with_kind(PixelFormat::Bc2),
        0x16 => TexelFormat {
            premult_alpha: true,
            ..TexelFormat::with_kind(PixelFormat::Bc2)
        },
        0x17 | 0x20 | 0x23 | 0x25 | 0x2A | 0x2F => TexelFormat::with_kind(PixelFormat::Bc3),
        0x18 | 0x2B => TexelFormat {
            premult_alpha: true,
            ..TexelFormat::with_kind(PixelFormat::Bc3)
        },
        0x19 if modern => TexelFormat::with_kind(PixelFormat::Bc4),
        0x19 => TexelFormat::with_kind(PixelFormat::Bc1),
        0x1E => TexelFormat::with_kind(PixelFormat::Bc1),
        0x1F if modern => {
            let mut format = TexelFormat::with_kind(PixelFormat::Bc5);
            format.snorm = platform == Platform::PS4;
            format.swizzle[1] = TexelSwizzle::DeriveZ;
            format
        }
        0x1F => TexelFormat::with_kind(PixelFormat::Bc3),
        0x27 => TexelFormat::with_kind(PixelFormat::Rgba8),
        0x28 => TexelFormat {
            premult_alpha: true,
            ..TexelFormat::with_kind(PixelFormat::Rgba8)
        },
        0x30 => TexelFormat::with_kind(PixelFormat::Bc7),
        0x37 => TexelFormat {
            premult_alpha: true,
            ..TexelFormat::with_kind(PixelFormat::Bc7)
        },
        _ => {
            return Err(TextureError::UnknownPixelFormat {
                raw: raw as u32,
                context: "v2",
            })
        }
    };
    Ok(format)
}

/// Format table for the 0xA0/0xA3 layout.
pub fn from_a0(raw: u8) -> Result<TexelFormat> {
    let format = match raw {
        0x00 => TexelFormat::with_kind(PixelFormat::R8),
        0x07 => TexelFormat::with_kind(PixelFormat::Rgba8),
        0x0A | 0x17 => TexelFormat::with_kind(PixelFormat::Bc3),
        0x13 | 0x1E => TexelFormat::with_kind(PixelFormat::Bc1),
        0x15 => TexelFormat::with_kind(PixelFormat::Bc2),
        0x19 => TexelFormat::with_kind(PixelFormat::Bc4),
        0x1F => {
            let mut format = TexelFormat::with_kind(PixelFormat::Bc5);
            format.swizzle[1] = TexelSwizzle::DeriveZ;
            format
        }
        _ => {
            return Err(TextureError::UnknownPixelFormat {
                raw: raw as u32,
                context: "a0",
            })
        }
    };
    Ok(format)
}

pub fn from_android(raw: u8) -> Result<TexelFormat> {
    let format = match raw {
        0x01 => TexelFormat::with_kind(PixelFormat::Rgba8),
        0x06 => TexelFormat::with_kind(PixelFormat::R5g6b5),
        0x07 => TexelFormat::with_kind(PixelFormat::Rgba4),
        0x0A => TexelFormat::with_kind(PixelFormat::Etc1),
        0x0C => TexelFormat::with_kind(PixelFormat::Bc3),
        0x0D => TexelFormat::with_kind(PixelFormat::Pvrtc4),
        _ => {
            return Err(TextureError::UnknownPixelFormat {
                raw: raw as u32,
                context: "android",
            })
        }
    };
    Ok(format)
}

/// 3DS format table. The two luminance-alpha slots expand through an RRR,G
/// swizzle; the hint is passthrough only.
pub fn from_3ds(raw: u8) -> Result<TexelFormat> {
    let rrrg = [
        TexelSwizzle::R,
        TexelSwizzle::R,
        TexelSwizzle::R,
        TexelSwizzle::G,
    ];
    let format = match raw {
        0x01 => TexelFormat::with_kind(PixelFormat::Rgba4),
        0x03 => TexelFormat::with_kind(PixelFormat::Rgba8),
        0x04 => TexelFormat::with_kind(PixelFormat::R5g6b5),
        0x05 => TexelFormat::with_kind(PixelFormat::R8),
        0x06 => TexelFormat::with_kind(PixelFormat::Rg4),
        0x07 => TexelFormat {
            swizzle: rrrg,
            ..TexelFormat::with_kind(PixelFormat::Rg8)
        },
        0x0B => TexelFormat::with_kind(PixelFormat::Etc1),
        0x0C => TexelFormat::with_kind(PixelFormat::Etc1A4),
        0x0E => TexelFormat {
            swizzle: [
                TexelSwizzle::Zero,
                TexelSwizzle::Zero,
                TexelSwizzle::Zero,
                TexelSwizzle::R,
            ],
            ..TexelFormat::with_kind(PixelFormat::R4)
        },
        0x0F => TexelFormat {
            swizzle: [
                TexelSwizzle::R,
                TexelSwizzle::R,
                TexelSwizzle::R,
                TexelSwizzle::One,
            ],
            ..TexelFormat::with_kind(PixelFormat::R4)
        },
        0x10 => TexelFormat {
            swizzle: rrrg,
            ..TexelFormat::with_kind(PixelFormat::Rg4)
        },
        0x11 => TexelFormat::with_kind(PixelFormat::Rgb8),
        _ => {
            return Err(TextureError::UnknownPixelFormat {
                raw: raw as u32,
                context: "3ds",
            })
        }
    };
    Ok(format)
}
