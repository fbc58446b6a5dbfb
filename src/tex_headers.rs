use binread::BinRead;

use crate::bin_reader::SpanReader;
use crate::errors::ReadError;

type Result<T> = std::result::Result<T, ReadError>;

// First-generation texture-type field.
pub const TYPE_CUBEMAP: u32 = 3;
pub const TYPE_VOLUME: u32 = 4;

// Second-generation texture-type field.
pub const TYPE_V2_CUBEMAP: u32 = 6;

// x56 layout field.
pub const LAYOUT_CORRECTED: u8 = 4;

#[allow(dead_code)]
pub struct TexHeaderX56 {
    pub id: u32,
    pub version: u8,
    pub texture_type: u8,
    pub layout: u8,
    pub num_mips: u8,
    pub width: u32,
    pub height: u32,
    pub array_size: u32,
    pub fourcc: u32,
}

impl TexHeaderX56 {
    pub fn read(reader: &mut SpanReader) -> Result<Self> {
        Ok(TexHeaderX56 {
            id: reader.read_u32()?,
            version: reader.read_u8()?,
            texture_type: reader.read_u8()?,
            layout: reader.read_u8()?,
            num_mips: reader.read_u8()?,
            width: reader.read_u32()?,
            height: reader.read_u32()?,
            array_size: reader.read_u32()?,
            fourcc: reader.read_u32()?,
        })
    }
}

/// Shared header for versions 0x66 and 0x70. The 0x70 revision widens
/// `array_size` to 32 bits and inserts a padding word after the face count.
#[allow(dead_code)]
pub struct TexHeaderX66 {
    pub id: u32,
    pub version: u16,
    pub type_bits: u16,
    pub num_mips: u8,
    pub num_faces: u8,
    pub width: u16,
    pub height: u16,
    pub array_size: u32,
    pub fourcc: u32,
    pub color_correction: [f32; 4],
}

impl TexHeaderX66 {
    pub fn read(reader: &mut SpanReader, wide: bool) -> Result<Self> {
        let id = reader.read_u32()?;
        let version = reader.read_u16()?;
        let type_bits = reader.read_u16()?;
        let num_mips = reader.read_u8()?;
        let num_faces = reader.read_u8()?;
        if wide {
            let _null = reader.read_u16()?;
        }
        let width = reader.read_u16()?;
        let height = reader.read_u16()?;
        let array_size = if wide {
            reader.read_u32()?
        } else {
            reader.read_u16()? as u32
        };
        let fourcc = reader.read_u32()?;
        let mut color_correction = [0f32; 4];
        for value in color_correction.iter_mut() {
            *value = reader.read_f32()?;
        }
        Ok(TexHeaderX66 {
            id,
            version,
            type_bits,
            num_mips,
            num_faces,
            width,
            height,
            array_size,
            fourcc,
            color_correction,
        })
    }

    pub fn texture_type(&self) -> u32 {
        (self.type_bits & 0xF) as u32
    }
}

#[allow(dead_code)]
pub struct TexHeaderX87 {
    pub id: u32,
    pub version: u16,
    tier0: u32,
    tier1: u32,
    pub format: u8,
}

impl TexHeaderX87 {
    pub fn read(reader: &mut SpanReader) -> Result<Self> {
        let id = reader.read_u32()?;
        let version = reader.read_u16()?;
        let _null = reader.read_u16()?;
        let tier0 = reader.read_u32()?;
        let tier1 = reader.read_u32()?;
        let format = reader.read_u8()?;
        Ok(TexHeaderX87 {
            id,
            version,
            tier0,
            tier1,
            format,
        })
    }

    pub fn texture_type(&self) -> u32 {
        self.tier0 & 0xF
    }

    pub fn num_mips(&self) -> u32 {
        (self.tier0 >> 4) & 0x1F
    }

    pub fn num_faces(&self) -> u32 {
        (self.tier0 >> 9) & 0xFF
    }

    pub fn width(&self) -> u32 {
        (self.tier0 >> 17) & 0x1FFF
    }

    pub fn height(&self) -> u32 {
        self.tier1 & 0x1FFF
    }

    pub fn depth(&self) -> u32 {
        (self.tier1 >> 13) & 0x1FFF
    }
}

/// Bit-packed header shared by the x9D family, the 0xA0/0xA3 layout, and
/// the 3DS revisions.
#[allow(dead_code)]
pub struct TexHeaderX9D {
    pub id: u32,
    tier0: u32,
    tier1: u32,
    tier2: u32,
}

impl TexHeaderX9D {
    pub fn read(reader: &mut SpanReader) -> Result<Self> {
        Ok(TexHeaderX9D {
            id: reader.read_u32()?,
            tier0: reader.read_u32()?,
            tier1: reader.read_u32()?,
            tier2: reader.read_u32()?,
        })
    }

    pub fn version(&self) -> u32 {
        self.tier0 & 0xFF
    }

    pub fn texture_type(&self) -> u32 {
        self.tier0 >> 28
    }

    pub fn num_mips(&self) -> u32 {
        self.tier1 & 0x3F
    }

    pub fn width(&self) -> u32 {
        (self.tier1 >> 6) & 0x1FFF
    }

    pub fn height(&self) -> u32 {
        (self.tier1 >> 19) & 0x1FFF
    }

    pub fn num_faces(&self) -> u32 {
        self.tier2 & 0xFF
    }

    pub fn format(&self) -> u8 {
        ((self.tier2 >> 8) & 0xFF) as u8
    }

    pub fn depth(&self) -> u32 {
        self.tier2 >> 16
    }
}

#[allow(dead_code)]
pub struct TexHeaderX09 {
    pub id: u32,
    pub version: u16,
    pub format: u8,
    pub type_bits: u32,
    dims: u32,
    pub data_offset: u32,
    pub pvr_variant_offset: u32,
    pub unk_variant_offset: u32,
    pub data_size: u32,
    pub pvr_size: u32,
    pub unk_size: u32,
}

impl TexHeaderX09 {
    pub fn read(reader: &mut SpanReader) -> Result<Self> {
        let id = reader.read_u32()?;
        let version = reader.read_u16()?;
        let format = reader.read_u8()?;
        let _unk = reader.read_u8()?;
        let type_bits = reader.read_u32()?;
        let dims = reader.read_u32()?;
        Ok(TexHeaderX09 {
            id,
            version,
            format,
            type_bits,
            dims,
            data_offset: reader.read_u32()?,
            pvr_variant_offset: reader.read_u32()?,
            unk_variant_offset: reader.read_u32()?,
            data_size: reader.read_u32()?,
            pvr_size: reader.read_u32()?,
            unk_size: reader.read_u32()?,
        })
    }

    pub fn width(&self) -> u32 {
        self.dims & 0x1FFF
    }

    pub fn height(&self) -> u32 {
        (self.dims >> 13) & 0x1FFF
    }

    pub fn num_mips(&self) -> u32 {
        (self.dims >> 26) & 0xF
    }
}

/// DDS sub-header embedded by x56 volume textures. Always little-endian.
#[derive(BinRead)]
#[br(little)]
#[allow(dead_code)]
pub struct DdsHeader {
    pub size: u32,
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mip_map_count: u32,
    pub reserved: [u32; 11],
    pub pixel_format: DdsPixelFormat,
    pub caps: [u32; 4],
    pub reserved2: u32,
}

#[derive(BinRead)]
#[br(little)]
#[allow(dead_code)]
pub struct DdsPixelFormat {
    pub size: u32,
    pub flags: u32,
    pub fourcc: u32,
    pub rgb_bit_count: u32,
    pub r_mask: u32,
    pub g_mask: u32,
    pub b_mask: u32,
    pub a_mask: u32,
}
