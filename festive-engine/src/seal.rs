//! Sealing for stored mail credentials: AES-256-GCM with a key derived from
//! the deployment secret. The wire form is `hex(nonce):hex(ciphertext)`.

use std::num::NonZeroU32;

use anyhow::{Context, Result, anyhow, bail};
use ring::aead::{Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

const PBKDF2_ROUNDS: u32 = 100_000;
const KEY_SALT: &[u8] = b"festive-mail-credentials";

fn derive_key(secret: &str) -> Result<LessSafeKey> {
    let rounds = NonZeroU32::new(PBKDF2_ROUNDS).ok_or_else(|| anyhow!("zero pbkdf2 rounds"))?;
    let mut key_bytes = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        rounds,
        KEY_SALT,
        secret.as_bytes(),
        &mut key_bytes,
    );
    let key = UnboundKey::new(&ring::aead::AES_256_GCM, &key_bytes)
        .map_err(|_| anyhow!("build sealing key"))?;
    Ok(LessSafeKey::new(key))
}

/// Seal a credential for storage.
pub fn seal(secret: &str, plaintext: &str) -> Result<String> {
    let key = derive_key(secret)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| anyhow!("draw nonce"))?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);

    let mut buf = plaintext.as_bytes().to_vec();
    key.seal_in_place_append_tag(nonce, Aad::empty(), &mut buf)
        .map_err(|_| anyhow!("seal credential"))?;

    Ok(format!("{}:{}", hex::encode(nonce_bytes), hex::encode(buf)))
}

/// Open a sealed credential. Fails on any tampering or a wrong secret.
pub fn open(secret: &str, sealed: &str) -> Result<String> {
    let (nonce_hex, ct_hex) = sealed
        .split_once(':')
        .ok_or_else(|| anyhow!("sealed credential missing nonce separator"))?;

    let nonce_bytes = hex::decode(nonce_hex).context("decode nonce")?;
    if nonce_bytes.len() != NONCE_LEN {
        bail!("sealed credential has a malformed nonce");
    }
    let mut nonce_arr = [0u8; NONCE_LEN];
    nonce_arr.copy_from_slice(&nonce_bytes);
    let nonce = Nonce::assume_unique_for_key(nonce_arr);

    let mut buf = hex::decode(ct_hex).context("decode ciphertext")?;
    let key = derive_key(secret)?;
    let opened = key
        .open_in_place(nonce, Aad::empty(), &mut buf)
        .map_err(|_| anyhow!("open sealed credential"))?;

    String::from_utf8(opened.to_vec()).context("sealed credential is not utf-8")
}
