// RSA Decryption Implementation
// Fixed-width block decryption with Chinese Remainder Theorem (CRT) exponentiation

use std::io::{Read, Write};
use std::path::Path;

use tracing::info;

use super::encrypt::{drive_blocks, run_file_pass, RsaCipher, StreamStats};
use super::framing::{unframe_block, FramedBlock};
use super::keygen::RsaPrivateKey;
use crate::bignum::BigNum;
use crate::error::{Error, Result};
use crate::util::file_ops;

impl<'a> RsaCipher<'a> {
    fn private_key(&self) -> Result<&'a RsaPrivateKey> {
        self.key()
            .private_key()
            .ok_or_else(|| Error::InvalidKey("decryption requires a private key".to_string()))
    }

    /// Decrypt one `block_size()`-byte ciphertext block back to its payload
    pub fn decrypt_block(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let key = self.private_key()?;

        // Validate ciphertext size
        if ciphertext.len() != self.block_size() {
            return Err(Error::MalformedBlock(format!(
                "expected {} ciphertext bytes, got {}",
                self.block_size(),
                ciphertext.len()
            )));
        }

        let c = BigNum::from_bytes_le(ciphertext);
        let m = key.decrypt_integer(&c)?;

        // m < n fits the block, so only the framing can be wrong from here
        let framed = FramedBlock {
            data: m.to_bytes_le_padded(self.block_size())?,
            expected_size: self.block_size(),
        };
        unframe_block(framed)
    }

    /// Decrypt a stream of whole ciphertext blocks
    pub fn decrypt_stream<R, W>(&self, input: &mut R, output: &mut W) -> Result<StreamStats>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.private_key()?;
        drive_blocks(input, output, self.block_size(), true, None, |block| {
            self.decrypt_block(block)
        })
    }

    /// Decrypt the file at `input` into `output`.
    ///
    /// A failed pass removes the partially written output.
    pub fn decrypt_file(&self, input: &Path, output: &Path) -> Result<StreamStats> {
        self.private_key()?;
        let total = file_ops::file_size(input)?;
        let stats = run_file_pass(input, output, |reader, writer| {
            drive_blocks(reader, writer, self.block_size(), true, Some(total), |block| {
                self.decrypt_block(block)
            })
        })?;
        info!(
            input = %input.display(),
            output = %output.display(),
            blocks = stats.blocks,
            size = %file_ops::format_file_size(stats.bytes_out),
            "decrypted file"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::keygen::{generate_key, RsaKey};
    use crate::bignum::TimeSeededRng;
    use crate::config::RsaConfig;
    use std::io::Cursor;

    fn test_key(seed: u64) -> RsaKey {
        let mut rng = TimeSeededRng::seed(seed);
        RsaKey::Private(generate_key(128, &RsaConfig::default(), &mut rng).unwrap())
    }

    #[test]
    fn test_block_roundtrip() {
        let key = test_key(100);
        let cipher = RsaCipher::new(&key).unwrap();
        assert_eq!(cipher.block_size(), 16);
        assert_eq!(cipher.max_payload(), 14);

        let payloads: [&[u8]; 5] = [b"", b"A", b"Hello, RSA!", &[0u8; 14], &[0xFF; 14]];
        for payload in payloads {
            let block = cipher.encrypt_block(payload).unwrap();
            assert_eq!(block.len(), 16);
            assert_eq!(cipher.decrypt_block(&block).unwrap(), payload);
        }
    }

    #[test]
    fn test_public_key_cannot_decrypt() {
        let key = test_key(101);
        let public = key.clone().demote();
        let cipher = RsaCipher::new(&public).unwrap();
        let block = cipher.encrypt_block(b"secret").unwrap();
        assert!(matches!(cipher.decrypt_block(&block), Err(Error::InvalidKey(_))));

        let private = RsaCipher::new(&key).unwrap();
        assert_eq!(private.decrypt_block(&block).unwrap(), b"secret");
    }

    #[test]
    fn test_wrong_block_length() {
        let key = test_key(102);
        let cipher = RsaCipher::new(&key).unwrap();
        assert!(matches!(
            cipher.decrypt_block(&[0u8; 15]),
            Err(Error::MalformedBlock(_))
        ));
    }

    #[test]
    fn test_stream_roundtrip() {
        let key = test_key(103);
        let cipher = RsaCipher::new(&key).unwrap();
        let plaintext: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let mut encrypted: Vec<u8> = Vec::new();
        let stats = cipher
            .encrypt_stream(&mut Cursor::new(&plaintext), &mut encrypted)
            .unwrap();
        assert_eq!(stats.blocks, 1000u64.div_ceil(14));
        assert_eq!(encrypted.len() as u64, stats.blocks * 16);

        let mut decrypted: Vec<u8> = Vec::new();
        cipher
            .decrypt_stream(&mut Cursor::new(&encrypted), &mut decrypted)
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_truncated_stream() {
        let key = test_key(104);
        let cipher = RsaCipher::new(&key).unwrap();
        let mut encrypted: Vec<u8> = Vec::new();
        cipher
            .encrypt_stream(&mut Cursor::new(b"some plaintext bytes".to_vec()), &mut encrypted)
            .unwrap();
        encrypted.pop();

        let result = cipher.decrypt_stream(&mut Cursor::new(&encrypted), &mut Vec::<u8>::new());
        assert!(matches!(result, Err(Error::MalformedBlock(_))));
    }
}
