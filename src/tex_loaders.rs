use std::io::Cursor;

use binread::BinReaderExt;

use crate::bin_reader::SpanReader;
use crate::errors::TextureError;
use crate::platform::Platform;
use crate::tex::{self, Texture};
use crate::tex_formats::{self, PixelFormat, TexelFormat, TileMode};
use crate::tex_headers::{
    DdsHeader, TexHeaderX09, TexHeaderX56, TexHeaderX66, TexHeaderX87, TexHeaderX9D,
    LAYOUT_CORRECTED, TYPE_CUBEMAP, TYPE_V2_CUBEMAP, TYPE_VOLUME,
};

type Result<T> = std::result::Result<T, TextureError>;

pub(crate) fn load_x56(reader: &mut SpanReader) -> Result<Texture> {
    let header = TexHeaderX56::read(reader)?;
    let mut texture = Texture::default();

    if header.layout == LAYOUT_CORRECTED {
        for value in texture.color_correction.iter_mut() {
            *value = reader.read_f32()?;
        }
    }

    match header.texture_type as u32 {
        TYPE_VOLUME => {
            // Volume textures embed a stock DDS header; only DXT5 content
            // was ever produced for them.
            let mut cursor = Cursor::new(reader.remaining_slice());
            let dds: DdsHeader = cursor
                .read_le()
                .map_err(|err| TextureError::ParserError(format!("{:?}", err)))?;
            reader.skip(cursor.position() as i64)?;
            texture.width = dds.width;
            texture.height = dds.height;
            texture.depth = dds.depth.max(1);
            texture.num_mipmaps = dds.mip_map_count as u8;
            if dds.pixel_format.fourcc == tex_formats::FOURCC_DXT5 {
                texture.base_format = TexelFormat::with_kind(PixelFormat::Bc3);
            } else {
                return Err(TextureError::UnknownPixelFormat {
                    raw: dds.pixel_format.fourcc,
                    context: "dds",
                });
            }
        }
        TYPE_CUBEMAP => return Err(TextureError::CubemapsUnsupported),
        _ => {
            texture.width = header.width;
            texture.height = header.height;
            texture.depth = header.array_size.max(1);
            texture.num_mipmaps = header.num_mips;
            texture.base_format = tex_formats::from_fourcc(header.fourcc)?;
        }
    }

    texture.num_faces = 1;
    texture.offsets = vec![0];
    texture.buffer = tex::read_payload(reader, 0)?;
    tex::apply_tile_hints(
        &mut texture.base_format,
        Platform::Win32,
        texture.width,
        texture.height,
    );
    Ok(texture)
}

pub(crate) fn load_x66(reader: &mut SpanReader, platform: Platform, wide: bool) -> Result<Texture> {
    let header = TexHeaderX66::read(reader, wide)?;
    let mut texture = Texture::default();
    texture.width = header.width as u32;
    texture.height = header.height as u32;
    texture.depth = header.array_size.max(1);
    texture.num_mipmaps = header.num_mips;
    texture.num_faces = header.num_faces;
    texture.base_format = tex_formats::from_fourcc(header.fourcc)?;
    texture.color_correction = header.color_correction;

    if header.texture_type() == TYPE_CUBEMAP {
        texture.num_faces = 6;
        texture.harmonics = Some(tex::read_harmonics(reader)?);
    }

    let count = texture.num_faces.max(1) as usize * texture.num_mipmaps as usize;
    let mut offsets = tex::read_offset_table(reader, count)?;
    tex::normalize_offsets(&mut offsets, reader.tell());
    texture.offsets = offsets;
    texture.buffer = tex::read_payload(reader, header.array_size)?;

    if reader.swapped_endian() && texture.base_format.kind == PixelFormat::Rgba8 {
        texture.base_format.swap_packed = true;
    }
    tex::apply_tile_hints(
        &mut texture.base_format,
        platform,
        texture.width,
        texture.height,
    );
    Ok(texture)
}

pub(crate) fn load_x87(reader: &mut SpanReader, platform: Platform) -> Result<Texture> {
    let header = TexHeaderX87::read(reader)?;
    let mut texture = Texture::default();
    texture.width = header.width();
    texture.height = header.height();
    texture.depth = header.depth().max(1);
    texture.num_mipmaps = header.num_mips() as u8;
    texture.num_faces = header.num_faces() as u8;
    texture.base_format = tex_formats::from_v2(header.format, platform)?;

    if header.texture_type() == TYPE_V2_CUBEMAP {
        texture.num_faces = 6;
        texture.harmonics = Some(tex::read_harmonics(reader)?);
    }

    let count = texture.num_faces.max(1) as usize * texture.num_mipmaps as usize;
    let mut offsets = tex::read_offset_table(reader, count)?;
    tex::normalize_offsets(&mut offsets, reader.tell());
    texture.offsets = offsets;
    texture.buffer = tex::read_payload(reader, header.depth())?;

    if reader.swapped_endian() && texture.base_format.kind == PixelFormat::Rgba8 {
        texture.base_format.swap_packed = true;
    }
    tex::apply_tile_hints(
        &mut texture.base_format,
        platform,
        texture.width,
        texture.height,
    );
    Ok(texture)
}

pub(crate) fn load_x9d(reader: &mut SpanReader, platform: Platform) -> Result<Texture> {
    let header = TexHeaderX9D::read(reader)?;
    let mut texture = Texture::default();
    texture.width = header.width();
    texture.height = header.height();
    texture.depth = header.depth().max(1);
    texture.num_mipmaps = header.num_mips() as u8;
    texture.num_faces = header.num_faces() as u8;

    if header.texture_type() == TYPE_V2_CUBEMAP {
        texture.num_faces = 6;
        texture.harmonics = Some(tex::read_harmonics(reader)?);
    }

    let count = texture.num_faces.max(1) as usize * texture.num_mipmaps as usize;
    let mut platform = platform;
    let mut offsets;

    if !reader.swapped_endian() {
        // The PS4 revision widened offsets to 64 bits without bumping the
        // version byte. Predict where a 32-bit table would put the payload;
        // a mismatch on the first entry means the wide layout.
        reader.push();
        let first = reader.read_u32()?;
        reader.pop();
        let predicted = (reader.tell() + count * 4) as u32;
        if first == predicted {
            offsets = tex::read_offset_table(reader, count)?;
        } else {
            offsets = Vec::with_capacity(count);
            for _ in 0..count {
                offsets.push(reader.read_u64()? as u32);
            }
            platform = Platform::PS4;
        }
    } else {
        offsets = tex::read_offset_table(reader, count)?;
    }

    tex::normalize_offsets(&mut offsets, reader.tell());
    texture.offsets = offsets;
    texture.base_format = tex_formats::from_v2(header.format(), platform)?;
    texture.buffer = tex::read_payload(reader, header.depth())?;
    tex::apply_tile_hints(
        &mut texture.base_format,
        platform,
        texture.width,
        texture.height,
    );
    Ok(texture)
}

pub(crate) fn load_xa0(reader: &mut SpanReader, platform: Platform) -> Result<Texture> {
    let header = TexHeaderX9D::read(reader)?;
    let mut texture = Texture::default();
    texture.width = header.width();
    texture.height = header.height();
    texture.depth = header.depth().max(1);
    texture.num_mipmaps = header.num_mips() as u8;
    texture.num_faces = header.num_faces() as u8;

    let cubemap = header.texture_type() == TYPE_V2_CUBEMAP;
    if cubemap {
        texture.num_faces = 6;
        texture.harmonics = Some(tex::read_harmonics(reader)?);
    }

    let buffer_size = reader.read_u32()?;
    // Faces share one set of mip offsets, expanded below once the per-face
    // stride is known.
    let count = texture.num_mipmaps as usize;
    let mut offsets = tex::read_offset_table(reader, count)?;
    texture.base_format = tex_formats::from_a0(header.format())?;

    if cubemap {
        texture.face_size = reader.read_u32()?;
        let mips = offsets.clone();
        for face in 1..6u32 {
            for offset in &mips {
                offsets.push(offset + face * texture.face_size);
            }
        }
    }

    texture.offsets = offsets;
    texture.buffer = reader.read_bytes(buffer_size as usize)?;
    tex::apply_tile_hints(
        &mut texture.base_format,
        platform,
        texture.width,
        texture.height,
    );
    Ok(texture)
}

pub(crate) fn load_android(reader: &mut SpanReader, platform: Platform) -> Result<Texture> {
    let header = TexHeaderX09::read(reader)?;
    let mut texture = Texture::default();
    texture.width = header.width();
    texture.height = header.height();
    texture.num_mipmaps = 1;
    texture.num_faces = 1;
    texture.base_format = tex_formats::from_android(header.format)?;

    let (offset, size) = if texture.base_format.kind == PixelFormat::Pvrtc4 {
        texture.base_format.swizzle.swap(0, 2);
        (header.pvr_variant_offset, header.pvr_size)
    } else {
        (header.data_offset, header.data_size)
    };
    reader.seek(offset as usize);
    texture.buffer = reader.read_bytes(size as usize)?;
    texture.offsets = vec![0];
    tex::apply_tile_hints(
        &mut texture.base_format,
        platform,
        texture.width,
        texture.height,
    );
    Ok(texture)
}

pub(crate) fn load_3ds(reader: &mut SpanReader, allow_cubemaps: bool) -> Result<Texture> {
    let header = TexHeaderX9D::read(reader)?;
    let mut texture = Texture::default();
    texture.width = header.width();
    texture.height = header.height();
    texture.depth = header.depth().max(1);
    texture.num_mipmaps = header.num_mips() as u8;
    texture.num_faces = header.num_faces() as u8;
    texture.base_format = tex_formats::from_3ds(header.format())?;

    if header.texture_type() == TYPE_V2_CUBEMAP {
        if !allow_cubemaps {
            return Err(TextureError::CubemapsUnsupported);
        }
        texture.num_faces = 6;
        texture.harmonics = Some(tex::read_harmonics(reader)?);
    }

    let count = texture.num_faces.max(1) as usize * texture.num_mipmaps as usize;
    let mut offsets = tex::read_offset_table(reader, count)?;
    tex::normalize_offsets(&mut offsets, reader.tell());
    texture.offsets = offsets;
    texture.buffer = tex::read_payload(reader, header.depth())?;
    texture.base_format.tile = TileMode::N3ds;
    Ok(texture)
}
