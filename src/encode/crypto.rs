//! Hashing, symmetric encryption and random string helpers.
//!
//! Every function here is stateless. Digests are returned as lowercase hex.

use crate::utils::error::{Result, UtilsError};
use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::Md5;
use rand::RngCore;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const IV_LEN: usize = 16;

/// MD5 of the UTF-8 bytes of `text`.
pub fn calculate_md5(text: &str) -> String {
    calculate_buffer_md5(text.as_bytes())
}

pub fn calculate_buffer_md5(buffer: &[u8]) -> String {
    hex::encode(Md5::digest(buffer))
}

pub fn calculate_sha256(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// MD5 of the canonical JSON form of `obj`.
///
/// Object keys are sorted at every depth and no whitespace is emitted, so two
/// values that differ only in key order hash the same.
pub fn calculate_object_md5<T: Serialize + ?Sized>(obj: &T) -> Result<String> {
    let normalized = canonical_json(obj)?;
    Ok(calculate_md5(&normalized))
}

/// Compact JSON with recursively sorted object keys.
pub fn canonical_json<T: Serialize + ?Sized>(obj: &T) -> Result<String> {
    let value = sort_keys(serde_json::to_value(obj)?);
    Ok(serde_json::to_string(&value)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sort_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Random lowercase hex string of exactly `length` characters.
pub fn generate_random_string(length: usize) -> Result<String> {
    if length == 0 {
        return Err(UtilsError::validation("length must be positive"));
    }

    let mut bytes = vec![0u8; length.div_ceil(2)];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let mut encoded = hex::encode(bytes);
    encoded.truncate(length);
    Ok(encoded)
}

fn derive_key(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

/// AES-256-CBC encryption with a SHA-256 derived key and a random IV.
///
/// Output format: `base64(iv):base64(ciphertext)`.
pub fn encrypt_aes(text: &str, key: &str) -> String {
    let key_bytes = derive_key(key);
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(&key_bytes.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(text.as_bytes());

    format!("{}:{}", STANDARD.encode(iv), STANDARD.encode(ciphertext))
}

/// Reverses [`encrypt_aes`]. A wrong key almost always surfaces as a padding error.
pub fn decrypt_aes(encrypted: &str, key: &str) -> Result<String> {
    let (iv_b64, ciphertext_b64) = encrypted
        .split_once(':')
        .ok_or(UtilsError::InvalidPayload)?;

    let iv = STANDARD
        .decode(iv_b64)
        .map_err(|e| UtilsError::crypto(format!("invalid IV encoding: {}", e)))?;
    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|e| UtilsError::crypto(format!("invalid ciphertext encoding: {}", e)))?;

    let key_bytes = derive_key(key);
    let decryptor = Aes256CbcDec::new_from_slices(&key_bytes, &iv)
        .map_err(|_| UtilsError::crypto(format!("IV must be {} bytes, got {}", IV_LEN, iv.len())))?;

    let plaintext = decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| UtilsError::crypto("decryption failed: bad key or corrupted data"))?;

    String::from_utf8(plaintext)
        .map_err(|_| UtilsError::crypto("decrypted data is not valid UTF-8"))
}
