use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::errors::CompressionError;

type Result<T> = std::result::Result<T, CompressionError>;

/// Inflates a zlib stream into a caller-sized output buffer.
///
/// The output length comes from the header-declared uncompressed size, so
/// the stream must terminate within the buffer.
pub fn inflate_into(input: &[u8], output: &mut [u8]) -> Result<()> {
    let mut stream = Decompress::new(true);
    let status = stream
        .decompress(input, output, FlushDecompress::Finish)
        .map_err(|err| CompressionError::ZlibFailed(err.to_string()))?;
    if status != Status::StreamEnd {
        return Err(CompressionError::ZlibFailed(
            "stream did not terminate".to_string(),
        ));
    }
    Ok(())
}

pub fn compress_zlib(input: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut stream = Compress::new(Compression::new(level), true);
    let mut output = Vec::with_capacity(input.len() / 2 + 64);
    loop {
        let consumed = stream.total_in() as usize;
        let status = stream
            .compress_vec(&input[consumed..], &mut output, FlushCompress::Finish)
            .map_err(|err| CompressionError::ZlibCompressFailed(err.to_string()))?;
        match status {
            Status::StreamEnd => break,
            _ => output.reserve(0x1000),
        }
    }
    Ok(output)
}
