use lzxd::{Lzxd, WindowSize};

use crate::errors::CompressionError;

type Result<T> = std::result::Result<T, CompressionError>;

const DEFAULT_BLOCK_SIZE: usize = 0x8000;

fn window_size(window_bits: u32) -> Result<WindowSize> {
    match window_bits {
        15 => Ok(WindowSize::KB32),
        16 => Ok(WindowSize::KB64),
        17 => Ok(WindowSize::KB128),
        18 => Ok(WindowSize::KB256),
        _ => Err(CompressionError::LzxFailed(format!(
            "unsupported window bits {}",
            window_bits
        ))),
    }
}

/// Decompresses an LZX block stream into a caller-sized output buffer.
///
/// Each block starts with a one-byte discriminator: `0xFF` announces an
/// explicit `{uncompressed, compressed}` big-endian u16 pair, anything else
/// is the high byte of a bare big-endian compressed size with an implied
/// 32 KiB uncompressed span. Block sizes are clamped to the remaining input.
pub fn decompress_lzx(input: &[u8], output: &mut [u8], window_bits: u32) -> Result<()> {
    let mut decoder = Lzxd::new(window_size(window_bits)?);
    let mut position = 0;
    let mut written = 0;

    while written < output.len() {
        if position >= input.len() {
            return Err(CompressionError::LzxFailed(
                "ran out of input blocks".to_string(),
            ));
        }

        let (uncompressed_size, compressed_size) = if input[position] == 0xFF {
            if position + 5 > input.len() {
                return Err(CompressionError::LzxFailed(
                    "truncated block header".to_string(),
                ));
            }
            let uncompressed =
                u16::from_be_bytes([input[position + 1], input[position + 2]]) as usize;
            let compressed =
                u16::from_be_bytes([input[position + 3], input[position + 4]]) as usize;
            position += 5;
            (uncompressed, compressed)
        } else {
            if position + 2 > input.len() {
                return Err(CompressionError::LzxFailed(
                    "truncated block header".to_string(),
                ));
            }
            let compressed = u16::from_be_bytes([input[position], input[position + 1]]) as usize;
            position += 2;
            (DEFAULT_BLOCK_SIZE, compressed)
        };

        let compressed_size = compressed_size.min(input.len() - position);
        let chunk = &input[position..position + compressed_size];
        position += compressed_size;

        let uncompressed_size = uncompressed_size.min(output.len() - written);
        let decoded = decoder
            .decompress_next(chunk, uncompressed_size)
            .map_err(|err| CompressionError::LzxFailed(format!("{:?}", err)))?;
        output[written..written + decoded.len()].copy_from_slice(decoded);
        written += decoded.len();
    }

    Ok(())
}
