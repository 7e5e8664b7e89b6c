// Big Integer Conversions
// Hexadecimal/decimal text and little-endian byte strings

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use super::bigint::{BigNum, Sign};
use super::buffer::{DigitStore, Limb, LIMB_BYTES};
use crate::error::{Error, Result};

const NIBBLES_PER_LIMB: usize = 8;

fn hex_digit(c: u8) -> Option<Limb> {
    match c {
        b'0'..=b'9' => Some(Limb::from(c - b'0')),
        b'a'..=b'f' => Some(Limb::from(c - b'a' + 10)),
        b'A'..=b'F' => Some(Limb::from(c - b'A' + 10)),
        _ => None,
    }
}

fn hex_char(nibble: u8) -> char {
    char::from(b"0123456789abcdef"[usize::from(nibble & 0xF)])
}

impl BigNum {
    /// Parse an optionally `-`-prefixed hexadecimal string.
    ///
    /// Every character after the sign must be a hex digit; the digits are
    /// placed least significant nibble first.
    pub fn from_hex(s: &str) -> Result<BigNum> {
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (Sign::Negative, rest),
            None => (Sign::Positive, s),
        };
        if digits.is_empty() {
            return Err(Error::InvalidHex(s.to_string()));
        }

        let mut store = DigitStore::new();
        store.allocate(digits.len().div_ceil(NIBBLES_PER_LIMB))?;
        for (i, c) in digits.bytes().rev().enumerate() {
            let nibble = hex_digit(c).ok_or_else(|| Error::InvalidHex(s.to_string()))?;
            let index = i / NIBBLES_PER_LIMB;
            let shift = 4 * (i % NIBBLES_PER_LIMB);
            store.set(index, store.get(index) | (nibble << shift));
        }

        Ok(BigNum::from_store(sign, store))
    }

    /// Assign from a hexadecimal string.
    ///
    /// Returns false and leaves `self` unchanged if the string is malformed.
    pub fn set_hex(&mut self, s: &str) -> bool {
        match BigNum::from_hex(s) {
            Ok(value) => {
                *self = value;
                true
            }
            Err(err) => {
                warn!(%err, "rejected hexadecimal value");
                false
            }
        }
    }

    /// Lowercase hexadecimal without leading zeros, `-` prefixed when negative
    pub fn to_hex_string(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }

        let mut out = String::with_capacity(self.active_bytes() * 2 + 1);
        if self.is_negative() {
            out.push('-');
        }
        let mut leading = true;
        for i in (0..self.active_bytes()).rev() {
            let byte = self.byte(i);
            for nibble in [byte >> 4, byte & 0xF] {
                if leading && nibble == 0 {
                    continue;
                }
                leading = false;
                out.push(hex_char(nibble));
            }
        }
        out
    }

    /// Two hex digits per byte, most significant first, separated by `:`
    pub fn to_hex_bytes(&self) -> String {
        let bytes = self.active_bytes().max(1);
        let mut out = String::with_capacity(bytes * 3 + 1);
        if self.is_negative() && !self.is_zero() {
            out.push('-');
        }
        for i in (0..bytes).rev() {
            let byte = self.byte(i);
            out.push(hex_char(byte >> 4));
            out.push(hex_char(byte));
            if i != 0 {
                out.push(':');
            }
        }
        out
    }

    /// Decimal representation built by repeated division by ten
    pub fn to_dec_string(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }

        let mut digits = Vec::new();
        let mut n = self.abs();
        while !n.is_zero() {
            let Ok((q, r)) = n.div_rem_small(10) else {
                break;
            };
            digits.push(b'0' + r as u8);
            n = q;
        }
        if self.is_negative() {
            digits.push(b'-');
        }
        digits.iter().rev().map(|&d| char::from(d)).collect()
    }

    /// Build a value from bytes where byte index 0 is the least significant
    pub fn from_bytes_le(bytes: &[u8]) -> BigNum {
        let mut n = BigNum::from_store(
            Sign::Positive,
            DigitStore::zeroed(bytes.len().div_ceil(LIMB_BYTES)),
        );
        for (i, &b) in bytes.iter().enumerate() {
            n.set_byte(i, b);
        }
        n
    }

    /// Active bytes of the magnitude, least significant first
    pub fn to_bytes_le(&self) -> Vec<u8> {
        (0..self.active_bytes()).map(|i| self.byte(i)).collect()
    }

    /// Magnitude as exactly `len` little-endian bytes, zero padded.
    ///
    /// Fails if the value needs more than `len` bytes.
    pub fn to_bytes_le_padded(&self, len: usize) -> Result<Vec<u8>> {
        let active = self.active_bytes();
        if active > len {
            return Err(Error::MessageTooLarge { len: active, max: len });
        }
        Ok((0..len).map(|i| self.byte(i)).collect())
    }
}

impl FromStr for BigNum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BigNum::from_hex(s)
    }
}

impl fmt::Display for BigNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.abs().to_dec_string();
        f.pad_integral(!self.is_negative() || self.is_zero(), "", &text)
    }
}

impl fmt::LowerHex for BigNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.abs().to_hex_string();
        f.pad_integral(!self.is_negative() || self.is_zero(), "0x", &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        let n = BigNum::from_hex("1234567890abcdefABCDEF").unwrap();
        assert_eq!(n.to_hex_string(), "1234567890abcdefabcdef");
        assert_eq!(n.capacity(), 3);
        assert_eq!(BigNum::from_hex(&"f".repeat(17)).unwrap().capacity(), 3);
        assert_eq!(BigNum::from_hex("-ff").unwrap(), BigNum::from(-255i32));
    }

    #[test]
    fn test_parse_strips_leading_zeros() {
        assert_eq!(BigNum::from_hex("000000000001").unwrap().to_hex_string(), "1");
        assert_eq!(BigNum::from_hex("-0").unwrap().to_hex_string(), "0");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(BigNum::from_hex("12g4").is_err());
        assert!(BigNum::from_hex("").is_err());
        assert!(BigNum::from_hex("-").is_err());
        assert!(BigNum::from_hex("0x10").is_err());
    }

    #[test]
    fn test_set_hex_leaves_value_on_failure() {
        let mut n = BigNum::from(42u32);
        assert!(!n.set_hex("xyz"));
        assert_eq!(n, BigNum::from(42u32));
        assert!(n.set_hex("-abc"));
        assert_eq!(n, BigNum::from(-0xabci32));
    }

    #[test]
    fn test_u32_hex_roundtrip() {
        for i in [0u32, 1, 9, 0x10, 0xabcdef, 0x8000_0000, u32::MAX] {
            let n = BigNum::from(i);
            assert_eq!(n.to_u32(), i);
            assert_eq!(n.to_hex_string(), format!("{:x}", i));
        }
    }

    #[test]
    fn test_to_hex_bytes() {
        assert_eq!(BigNum::from(0x1abu32).to_hex_bytes(), "01:ab");
        assert_eq!(BigNum::zero().to_hex_bytes(), "00");
        assert_eq!(BigNum::from(-0x10203i32).to_hex_bytes(), "-01:02:03");
    }

    #[test]
    fn test_decimal() {
        assert_eq!(BigNum::zero().to_dec_string(), "0");
        assert_eq!(BigNum::from(-1234567i32).to_dec_string(), "-1234567");
        let big = BigNum::from_hex("1000000000000000000000000").unwrap();
        assert_eq!(big.to_dec_string(), "79228162514264337593543950336");
        assert_eq!(format!("{}", BigNum::from(-5i32)), "-5");
        assert_eq!(format!("{:#x}", BigNum::from(255u32)), "0xff");
    }

    #[test]
    fn test_bytes_le() {
        let n = BigNum::from_bytes_le(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        assert_eq!(n.to_hex_string(), "504030201");
        assert_eq!(n.to_bytes_le(), vec![1, 2, 3, 4, 5]);
        assert_eq!(n.to_bytes_le_padded(8).unwrap(), vec![1, 2, 3, 4, 5, 0, 0, 0]);
        assert!(n.to_bytes_le_padded(4).is_err());
    }

    #[test]
    fn test_bytes_with_trailing_zeros_keep_width() {
        let n = BigNum::from_bytes_le(&[7, 0, 0]);
        assert_eq!(n.to_bytes_le(), vec![7]);
        assert_eq!(n.to_bytes_le_padded(3).unwrap(), vec![7, 0, 0]);
    }
}
