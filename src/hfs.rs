use crate::bin_reader::SpanReader;
use crate::errors::EnvelopeError;

type Result<T> = std::result::Result<T, EnvelopeError>;

pub const SFH_MAGIC: u32 = 0x0048_4653;

/// Unwraps an HFS envelope when one is present.
///
/// Returns the concatenated inner stream, or `None` when the input does not
/// start with the envelope magic. The envelope is a 12-byte header followed
/// by length-prefixed chunks that reassemble into `file_size` inner bytes.
pub fn strip_envelope(data: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut reader = SpanReader::new(data);

    reader.push();
    let magic = match reader.read_u32() {
        Ok(magic) => magic,
        Err(_) => return Ok(None),
    };
    reader.pop();

    if magic != SFH_MAGIC {
        return Ok(None);
    }

    reader.skip(4)?;
    let _version = reader.read_u16()?;
    let _content_type = reader.read_u16()?;
    let file_size = reader.read_u32()? as usize;

    let mut inner = Vec::with_capacity(file_size);
    while inner.len() < file_size {
        let chunk_size = reader.read_u32()? as usize;
        if chunk_size == 0 || inner.len() + chunk_size > file_size {
            return Err(EnvelopeError::Malformed(magic));
        }
        inner.extend_from_slice(&reader.read_bytes(chunk_size)?);
    }

    Ok(Some(inner))
}
