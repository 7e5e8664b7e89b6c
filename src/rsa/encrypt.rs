// RSA Encryption Implementation
// Block cipher context, length-framed block encryption and the stream/file driver

use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info};

use super::framing::{frame_block, max_payload};
use super::keygen::RsaKey;
use crate::bignum::BigNum;
use crate::config::RsaConfig;
use crate::error::{Error, Result};
use crate::util::file_ops::{self, Progress};

/// Smallest key whose blocks still carry a byte of payload
const MIN_KEY_BYTES: usize = 3;

/// Byte counts of one encrypt or decrypt pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub blocks: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Block cipher bound to one key.
///
/// Ciphertext blocks are always `bits / 8` bytes; plaintext blocks carry at
/// most `bits / 8 - 2` bytes after the one-byte length prefix.
#[derive(Debug, Clone, Copy)]
pub struct RsaCipher<'a> {
    key: &'a RsaKey,
    key_bytes: usize,
}

impl<'a> RsaCipher<'a> {
    pub fn new(key: &'a RsaKey) -> Result<Self> {
        let bits = key.bits();
        if bits % 8 != 0 {
            return Err(Error::InvalidKey(format!(
                "key size must be a multiple of 8 bits, got {}",
                bits
            )));
        }
        let key_bytes = bits / 8;
        if key_bytes < MIN_KEY_BYTES {
            return Err(Error::InvalidKey(format!("key size {} bits is too small", bits)));
        }

        let max_bits = RsaConfig::default().max_key_bits;
        if bits > max_bits {
            return Err(Error::InvalidKey(format!(
                "key size {} bits exceeds the {}-bit limit",
                bits, max_bits
            )));
        }

        let n = key.modulus();
        if n.is_zero() || n.is_negative() || n.bit_len() > bits || n.bit_len() + 8 <= bits {
            return Err(Error::InvalidKey(format!(
                "modulus does not fit the declared {}-bit key size",
                bits
            )));
        }

        Ok(Self { key, key_bytes })
    }

    pub fn key(&self) -> &'a RsaKey {
        self.key
    }

    /// Ciphertext block size in bytes
    pub fn block_size(&self) -> usize {
        self.key_bytes
    }

    /// Plaintext bytes per block
    pub fn max_payload(&self) -> usize {
        max_payload(self.key_bytes)
    }

    /// Encrypt up to `max_payload()` bytes into one ciphertext block
    pub fn encrypt_block(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let framed = frame_block(plaintext, self.key_bytes)?;
        let m = BigNum::from_bytes_le(&framed.data);

        let n = self.key.modulus();
        if m >= *n {
            return Err(Error::MessageTooLarge {
                len: plaintext.len(),
                max: self.max_payload(),
            });
        }

        // c = m^e mod n
        let c = m.mod_pow(self.key.exponent(), n)?;
        c.to_bytes_le_padded(framed.expected_size)
    }

    /// Encrypt everything `input` yields, one block per `max_payload()` bytes
    pub fn encrypt_stream<R, W>(&self, input: &mut R, output: &mut W) -> Result<StreamStats>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        drive_blocks(input, output, self.max_payload(), false, None, |block| {
            self.encrypt_block(block)
        })
    }

    /// Encrypt the file at `input` into `output`.
    ///
    /// A failed pass removes the partially written output.
    pub fn encrypt_file(&self, input: &Path, output: &Path) -> Result<StreamStats> {
        let total = file_ops::file_size(input)?;
        let stats = run_file_pass(input, output, |reader, writer| {
            drive_blocks(reader, writer, self.max_payload(), false, Some(total), |block| {
                self.encrypt_block(block)
            })
        })?;
        info!(
            input = %input.display(),
            output = %output.display(),
            blocks = stats.blocks,
            size = %file_ops::format_file_size(stats.bytes_out),
            "encrypted file"
        );
        Ok(stats)
    }
}

/// Open both files, run `pass`, flush, and clean up the output on failure
pub(super) fn run_file_pass<F>(input: &Path, output: &Path, pass: F) -> Result<StreamStats>
where
    F: FnOnce(&mut dyn Read, &mut dyn Write) -> Result<StreamStats>,
{
    let mut reader = file_ops::open_input(input)?;
    let mut writer = file_ops::create_output(output)?;

    let result = pass(&mut reader, &mut writer).and_then(|stats| {
        writer
            .flush()
            .map_err(|e| Error::file_access(output, e))?;
        Ok(stats)
    });

    if result.is_err() {
        drop(writer);
        file_ops::remove_partial(output);
    }
    result
}

/// Read `chunk`-sized blocks from `input`, transform each and write the
/// result to `output`.
///
/// With `exact` set, a short final block is an error instead of the last
/// block of the stream.
pub(super) fn drive_blocks<R, W, F>(
    input: &mut R,
    output: &mut W,
    chunk: usize,
    exact: bool,
    total: Option<u64>,
    mut transform: F,
) -> Result<StreamStats>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
    F: FnMut(&[u8]) -> Result<Vec<u8>>,
{
    let mut stats = StreamStats::default();
    let mut buf = vec![0u8; chunk];

    loop {
        let read = file_ops::read_chunk(input, &mut buf)?;
        if read == 0 {
            break;
        }
        if exact && read != chunk {
            return Err(Error::MalformedBlock(format!(
                "truncated block: expected {} bytes, got {}",
                chunk, read
            )));
        }

        let out = transform(&buf[..read])?;
        output.write_all(&out)?;

        stats.blocks += 1;
        stats.bytes_in += read as u64;
        stats.bytes_out += out.len() as u64;

        if let Some(total) = total {
            let progress = Progress::new(stats.bytes_in, total);
            debug!(
                block = stats.blocks,
                current = progress.current,
                total = progress.total,
                percent = progress.percent,
                "block processed"
            );
        }

        if read < chunk {
            break;
        }
    }

    Ok(stats)
}
