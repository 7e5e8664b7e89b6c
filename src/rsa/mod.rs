// RSA Module - Main module file
// Exports all RSA-related functionality

pub mod decrypt;
pub mod encrypt;
pub mod framing;
pub mod keyfile;
pub mod keygen;

pub use encrypt::{RsaCipher, StreamStats};
pub use framing::{frame_block, max_payload, unframe_block, FramedBlock};
pub use keyfile::{load_key, parse_key_file, save_key, to_key_file_string};
pub use keygen::{generate_key, KeyKind, RsaKey, RsaPrivateKey, RsaPublicKey};
