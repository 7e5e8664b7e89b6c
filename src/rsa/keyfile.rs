// RSA Key Files
// Marker line followed by a Base64 record of newline-separated hex fields

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::info;

use super::keygen::{KeyKind, RsaKey, RsaPrivateKey, RsaPublicKey};
use crate::bignum::BigNum;
use crate::config::RsaConfig;
use crate::error::{Error, Result};
use crate::util::file_ops;

pub const PUBLIC_KEY_MARKER: &str = "-- PMZ_RSA PUBLIC KEY --";
pub const PRIVATE_KEY_MARKER: &str = "-- PMZ_RSA PRIVATE KEY --";

/// Base64 characters per line in a key file
pub const LINE_WIDTH: usize = 48;

const PUBLIC_FIELDS: [&str; 3] = ["bits", "n", "e"];
const PRIVATE_FIELDS: [&str; 9] = ["bits", "p", "q", "dp", "dq", "qinv", "n", "e", "d"];

fn marker(kind: KeyKind) -> &'static str {
    match kind {
        KeyKind::Private => PRIVATE_KEY_MARKER,
        KeyKind::Public => PUBLIC_KEY_MARKER,
    }
}

/// Render a key in key file form
pub fn to_key_file_string(key: &RsaKey) -> String {
    let fields: Vec<String> = match key {
        RsaKey::Public(k) => vec![format!("{:x}", k.bits), k.n.to_hex_string(), k.e.to_hex_string()],
        RsaKey::Private(k) => vec![
            format!("{:x}", k.bits),
            k.p.to_hex_string(),
            k.q.to_hex_string(),
            k.dp.to_hex_string(),
            k.dq.to_hex_string(),
            k.qinv.to_hex_string(),
            k.n.to_hex_string(),
            k.e.to_hex_string(),
            k.d.to_hex_string(),
        ],
    };

    let mut record = String::new();
    for field in &fields {
        record.push_str(field);
        record.push('\n');
    }
    let encoded = BASE64.encode(record.as_bytes());

    let mut out = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 32);
    out.push_str(marker(key.kind()));
    out.push('\n');
    // Base64 output is ASCII, so byte chunks are valid strings
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out
}

/// Parse the text of a key file
pub fn parse_key_file(text: &str) -> Result<RsaKey> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or_default().trim_end();

    let kind = if header.starts_with(PRIVATE_KEY_MARKER) {
        KeyKind::Private
    } else if header.starts_with(PUBLIC_KEY_MARKER) {
        KeyKind::Public
    } else {
        return Err(Error::InvalidKey("missing key file marker".to_string()));
    };

    let encoded: String = lines
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect();
    let decoded = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| Error::InvalidKey(format!("bad base64 payload: {}", e)))?;
    let record = String::from_utf8(decoded)
        .map_err(|_| Error::InvalidKey("key record is not text".to_string()))?;

    let names: &[&str] = match kind {
        KeyKind::Private => &PRIVATE_FIELDS,
        KeyKind::Public => &PUBLIC_FIELDS,
    };
    let values: Vec<&str> = record.lines().map(str::trim).collect();
    if values.len() < names.len() {
        return Err(Error::InvalidKey(format!(
            "{} key record has {} fields, expected {}",
            kind,
            values.len(),
            names.len()
        )));
    }

    let bits = usize::from_str_radix(values[0], 16)
        .map_err(|_| Error::InvalidKey(format!("bad bits field {:?}", values[0])))?;
    let number = |i: usize| -> Result<BigNum> {
        BigNum::from_hex(values[i])
            .map_err(|_| Error::InvalidKey(format!("bad {} field", names[i])))
    };

    let key = match kind {
        KeyKind::Public => RsaKey::Public(RsaPublicKey::new(bits, number(1)?, number(2)?)),
        KeyKind::Private => RsaKey::Private(RsaPrivateKey {
            bits,
            p: number(1)?,
            q: number(2)?,
            dp: number(3)?,
            dq: number(4)?,
            qinv: number(5)?,
            n: number(6)?,
            e: number(7)?,
            d: number(8)?,
        }),
    };
    check_declared_bits(bits, key.modulus())?;
    Ok(key)
}

/// The declared size must be a usable key size that the modulus fills to
/// within its last byte.
fn check_declared_bits(bits: usize, n: &BigNum) -> Result<()> {
    RsaConfig::default().check_key_bits(bits)?;
    let actual = n.bit_len();
    if actual > bits || actual + 8 <= bits {
        return Err(Error::InvalidKey(format!(
            "declared key size {} bits does not match a {}-bit modulus",
            bits, actual
        )));
    }
    Ok(())
}

/// Write a key file
pub fn save_key(key: &RsaKey, path: &Path) -> Result<()> {
    file_ops::write_text_file(path, &to_key_file_string(key))?;
    info!(path = %path.display(), kind = %key.kind(), bits = key.bits(), "saved key");
    Ok(())
}

/// Read a key file
pub fn load_key(path: &Path) -> Result<RsaKey> {
    let text = file_ops::read_text_file(path)?;
    let key = parse_key_file(&text)?;
    info!(path = %path.display(), kind = %key.kind(), bits = key.bits(), "loaded key");
    Ok(key)
}
