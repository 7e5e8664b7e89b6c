// RSA end-to-end
// Key generation, key files and file encryption through the public API

use std::fs;

use pmz_rsa::rsa::{generate_key, load_key, save_key, KeyKind, RsaCipher, RsaKey};
use pmz_rsa::{BigNum, Error, RsaConfig, TimeSeededRng};
use tempfile::tempdir;

fn generated_key(seed: u64) -> RsaKey {
    let mut rng = TimeSeededRng::seed(seed);
    RsaKey::Private(generate_key(128, &RsaConfig::default(), &mut rng).unwrap())
}

fn sample_plaintext(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

#[test]
fn generated_128_bit_key_is_valid() {
    let key = generated_key(2024);
    assert_eq!(key.kind(), KeyKind::Private);
    assert_eq!(key.bits(), 128);
    assert_eq!(key.exponent(), &BigNum::from(0x10001u32));
    assert!(key.is_valid(30));
}

#[test]
fn file_roundtrip_over_many_blocks() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("plain.bin");
    let sealed = dir.path().join("sealed.bin");
    let opened = dir.path().join("opened.bin");

    let original = sample_plaintext(14 * 20 + 5);
    fs::write(&plain, &original).unwrap();

    let key = generated_key(7);
    let cipher = RsaCipher::new(&key).unwrap();

    let stats = cipher.encrypt_file(&plain, &sealed).unwrap();
    assert_eq!(stats.blocks, 21);
    assert_eq!(fs::metadata(&sealed).unwrap().len(), 21 * 16);

    let stats = cipher.decrypt_file(&sealed, &opened).unwrap();
    assert_eq!(stats.blocks, 21);
    assert_eq!(fs::read(&opened).unwrap(), original);
}

#[test]
fn public_key_encrypts_private_key_decrypts() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("plain.txt");
    let sealed = dir.path().join("sealed.bin");
    let opened = dir.path().join("opened.txt");
    fs::write(&plain, b"attack at dawn, bring snacks").unwrap();

    let private = generated_key(8);
    let public = private.clone().demote();

    RsaCipher::new(&public)
        .unwrap()
        .encrypt_file(&plain, &sealed)
        .unwrap();

    let err = RsaCipher::new(&public)
        .unwrap()
        .decrypt_file(&sealed, &opened)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidKey(_)));
    assert!(!opened.exists());

    RsaCipher::new(&private)
        .unwrap()
        .decrypt_file(&sealed, &opened)
        .unwrap();
    assert_eq!(fs::read(&opened).unwrap(), b"attack at dawn, bring snacks");
}

#[test]
fn corrupted_ciphertext_does_not_decrypt_silently() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("plain.bin");
    let sealed = dir.path().join("sealed.bin");
    let opened = dir.path().join("opened.bin");

    let original = sample_plaintext(100);
    fs::write(&plain, &original).unwrap();

    let key = generated_key(9);
    let cipher = RsaCipher::new(&key).unwrap();
    cipher.encrypt_file(&plain, &sealed).unwrap();

    let mut ciphertext = fs::read(&sealed).unwrap();
    ciphertext[20] ^= 0x01;
    fs::write(&sealed, &ciphertext).unwrap();

    match cipher.decrypt_file(&sealed, &opened) {
        Ok(_) => assert_ne!(fs::read(&opened).unwrap(), original),
        Err(_) => assert!(!opened.exists()),
    }
}

#[test]
fn truncated_ciphertext_file_is_rejected() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("plain.bin");
    let sealed = dir.path().join("sealed.bin");
    let opened = dir.path().join("opened.bin");
    fs::write(&plain, sample_plaintext(40)).unwrap();

    let key = generated_key(10);
    let cipher = RsaCipher::new(&key).unwrap();
    cipher.encrypt_file(&plain, &sealed).unwrap();

    let mut ciphertext = fs::read(&sealed).unwrap();
    ciphertext.truncate(ciphertext.len() - 3);
    fs::write(&sealed, &ciphertext).unwrap();

    let err = cipher.decrypt_file(&sealed, &opened).unwrap_err();
    assert!(matches!(err, Error::MalformedBlock(_)));
    assert!(!opened.exists());
}

#[test]
fn empty_file_roundtrip() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("empty");
    let sealed = dir.path().join("empty.sealed");
    let opened = dir.path().join("empty.opened");
    fs::write(&plain, b"").unwrap();

    let key = generated_key(11);
    let cipher = RsaCipher::new(&key).unwrap();
    assert_eq!(cipher.encrypt_file(&plain, &sealed).unwrap().blocks, 0);
    assert_eq!(cipher.decrypt_file(&sealed, &opened).unwrap().blocks, 0);
    assert!(fs::read(&opened).unwrap().is_empty());
}

#[test]
fn missing_input_reports_file_name() {
    let dir = tempdir().unwrap();
    let key = generated_key(12);
    let cipher = RsaCipher::new(&key).unwrap();

    let missing = dir.path().join("nope.bin");
    let err = cipher
        .encrypt_file(&missing, &dir.path().join("out.bin"))
        .unwrap_err();
    match err {
        Error::FileAccess { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn key_file_roundtrip() {
    let dir = tempdir().unwrap();
    let private_path = dir.path().join("key.priv");
    let public_path = dir.path().join("key.pub");

    let key = generated_key(13);
    save_key(&key, &private_path).unwrap();
    let loaded = load_key(&private_path).unwrap();
    assert_eq!(loaded, key);

    let (original, restored) = match (&key, &loaded) {
        (RsaKey::Private(a), RsaKey::Private(b)) => (a, b),
        _ => panic!("expected private keys"),
    };
    assert_eq!(restored.n, original.n);
    assert_eq!(restored.e, original.e);
    assert_eq!(restored.d, original.d);
    assert_eq!(restored.p, original.p);
    assert_eq!(restored.q, original.q);

    let public = loaded.demote();
    save_key(&public, &public_path).unwrap();
    let loaded_public = load_key(&public_path).unwrap();
    assert_eq!(loaded_public.kind(), KeyKind::Public);
    assert_eq!(loaded_public.modulus(), key.modulus());
    assert_eq!(loaded_public.exponent(), key.exponent());
    assert!(loaded_public.private_key().is_none());

    let text = fs::read_to_string(&public_path).unwrap();
    assert!(text.starts_with("-- PMZ_RSA PUBLIC KEY --\n"));
}

#[test]
fn loaded_key_decrypts_what_generated_key_encrypted() {
    let dir = tempdir().unwrap();
    let key_path = dir.path().join("key.priv");
    let key = generated_key(14);
    save_key(&key, &key_path).unwrap();

    let block = RsaCipher::new(&key).unwrap().encrypt_block(b"hi").unwrap();
    let loaded = load_key(&key_path).unwrap();
    assert_eq!(RsaCipher::new(&loaded).unwrap().decrypt_block(&block).unwrap(), b"hi");
}
