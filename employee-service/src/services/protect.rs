//! Reversible id protection for route identifiers.
//!
//! Internal employee ids are sequential integers and must never appear raw
//! in a URL. `IdProtector` maps an id to an opaque, authenticated token and
//! back. The mapping is deterministic for the lifetime of the process key
//! material and scoped by a purpose label, so a token minted for one entity
//! class cannot be replayed against another.
//!
//! Construction: the 8-byte big-endian id block goes through a 4-round
//! Feistel permutation whose round function is HMAC-SHA256 under a
//! per-purpose subkey, then a truncated HMAC tag authenticates the
//! permuted block. Token = base64url(block || tag).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const FEISTEL_ROUNDS: u8 = 4;
const BLOCK_LEN: usize = 8;
const TAG_LEN: usize = 16;

/// Purpose label for employee ids exposed in routes.
pub const EMPLOYEE_ID_PURPOSE: &str = "employee-id-route";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtectError {
    #[error("invalid token")]
    InvalidToken,
    #[error("protection key must be 32 bytes of hex")]
    InvalidKey,
}

/// Purpose-scoped protector for integer route identifiers.
///
/// Key material is read-only after construction; sharing one instance
/// across request handlers is safe.
#[derive(Clone)]
pub struct IdProtector {
    subkey: [u8; 32],
}

impl IdProtector {
    /// Derive a purpose-scoped protector from the 32-byte master key.
    ///
    /// Distinct purposes yield unrelated subkeys, so tokens never validate
    /// across purposes.
    pub fn new(master_key: &[u8; 32], purpose: &str) -> Self {
        let mut mac = HmacSha256::new_from_slice(master_key)
            .expect("HMAC accepts any key length");
        mac.update(b"id-protector/");
        mac.update(purpose.as_bytes());
        let derived = mac.finalize().into_bytes();

        let mut subkey = [0u8; 32];
        subkey.copy_from_slice(&derived);
        Self { subkey }
    }

    /// Parse a 64-character hex master key from configuration.
    pub fn parse_master_key(hex_key: &str) -> Result<[u8; 32], ProtectError> {
        let bytes = hex::decode(hex_key).map_err(|_| ProtectError::InvalidKey)?;
        bytes.try_into().map_err(|_| ProtectError::InvalidKey)
    }

    /// Map an internal id to its opaque route token.
    pub fn protect(&self, id: i64) -> String {
        let mut block = id.to_be_bytes();
        for round in 0..FEISTEL_ROUNDS {
            self.feistel_round(&mut block, round);
        }

        let tag = self.tag(&block);

        let mut token = [0u8; BLOCK_LEN + TAG_LEN];
        token[..BLOCK_LEN].copy_from_slice(&block);
        token[BLOCK_LEN..].copy_from_slice(&tag);
        URL_SAFE_NO_PAD.encode(token)
    }

    /// Recover the internal id from a route token.
    ///
    /// Fails with `InvalidToken` for anything not minted by `protect` under
    /// the live key and purpose: wrong length, bad encoding, tampered block
    /// or tag. Callers treat the failure as "not found".
    pub fn unprotect(&self, token: &str) -> Result<i64, ProtectError> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| ProtectError::InvalidToken)?;
        if raw.len() != BLOCK_LEN + TAG_LEN {
            return Err(ProtectError::InvalidToken);
        }

        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&raw[..BLOCK_LEN]);

        let expected = self.tag(&block);
        let tag_ok: bool = expected.ct_eq(&raw[BLOCK_LEN..]).into();
        if !tag_ok {
            return Err(ProtectError::InvalidToken);
        }

        for round in (0..FEISTEL_ROUNDS).rev() {
            self.feistel_round_inverse(&mut block, round);
        }
        Ok(i64::from_be_bytes(block))
    }

    fn round_output(&self, round: u8, right: &[u8; 4]) -> [u8; 4] {
        let mut mac = HmacSha256::new_from_slice(&self.subkey)
            .expect("HMAC accepts any key length");
        mac.update(&[round]);
        mac.update(right);
        let digest = mac.finalize().into_bytes();

        let mut out = [0u8; 4];
        out.copy_from_slice(&digest[..4]);
        out
    }

    fn feistel_round(&self, block: &mut [u8; BLOCK_LEN], round: u8) {
        let (left, right) = split(block);
        let f = self.round_output(round, &right);
        let new_right = xor(&left, &f);
        join(block, &right, &new_right);
    }

    fn feistel_round_inverse(&self, block: &mut [u8; BLOCK_LEN], round: u8) {
        let (new_left, new_right) = split(block);
        let f = self.round_output(round, &new_left);
        let left = xor(&new_right, &f);
        join(block, &left, &new_left);
    }

    fn tag(&self, block: &[u8; BLOCK_LEN]) -> [u8; TAG_LEN] {
        let mut mac = HmacSha256::new_from_slice(&self.subkey)
            .expect("HMAC accepts any key length");
        mac.update(b"tag");
        mac.update(block);
        let digest = mac.finalize().into_bytes();

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&digest[..TAG_LEN]);
        tag
    }
}

fn split(block: &[u8; BLOCK_LEN]) -> ([u8; 4], [u8; 4]) {
    let mut left = [0u8; 4];
    let mut right = [0u8; 4];
    left.copy_from_slice(&block[..4]);
    right.copy_from_slice(&block[4..]);
    (left, right)
}

fn join(block: &mut [u8; BLOCK_LEN], left: &[u8; 4], right: &[u8; 4]) {
    block[..4].copy_from_slice(left);
    block[4..].copy_from_slice(right);
}

fn xor(a: &[u8; 4], b: &[u8; 4]) -> [u8; 4] {
    [a[0] ^ b[0], a[1] ^ b[1], a[2] ^ b[2], a[3] ^ b[3]]
}
