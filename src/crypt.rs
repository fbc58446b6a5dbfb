use blowfish::cipher::generic_array::GenericArray;
use blowfish::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use blowfish::BlowfishLE;

/// Blowfish stream coder over little-endian words, matching the archive
/// encryption. Operates in place on full 8-byte blocks; a trailing partial
/// block is left untouched.
pub struct BlowfishStream {
    cipher: BlowfishLE,
}

impl BlowfishStream {
    /// Builds a coder from a raw key. Returns `None` for keys outside the
    /// 4..=56 byte range Blowfish accepts.
    pub fn new(key: &[u8]) -> Option<Self> {
        BlowfishLE::new_from_slice(key)
            .ok()
            .map(|cipher| BlowfishStream { cipher })
    }

    pub fn decode(&self, buffer: &mut [u8]) {
        for block in buffer.chunks_exact_mut(8) {
            self.cipher
                .decrypt_block(GenericArray::from_mut_slice(block));
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        for block in buffer.chunks_exact_mut(8) {
            self.cipher
                .encrypt_block(GenericArray::from_mut_slice(block));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::pseudo_random_bytes;

    #[test]
    fn encrypt_then_decrypt_roundtrips() {
        let coder = BlowfishStream::new(b"QZHaM;-5:)dV#").unwrap();
        for size in [8usize, 64, 0x800] {
            let original = pseudo_random_bytes(size, size as u64);
            let mut buffer = original.clone();
            coder.encode(&mut buffer);
            assert_ne!(original, buffer);
            coder.decode(&mut buffer);
            assert_eq!(original, buffer);
        }
    }

    #[test]
    fn trailing_partial_block_untouched() {
        let coder = BlowfishStream::new(b"key-material").unwrap();
        let mut buffer = vec![7u8; 13];
        coder.encode(&mut buffer);
        assert_eq!(vec![7u8; 5], buffer[8..].to_vec());
    }

    #[test]
    fn invalid_key_lengths_rejected() {
        assert!(BlowfishStream::new(b"abc").is_none());
        assert!(BlowfishStream::new(&[0u8; 57]).is_none());
    }
}
