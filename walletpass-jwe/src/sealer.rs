// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Symmetric part of the token: AES-GCM encryption of the payload followed
//! by hex encoding and gzip compression of the sealed blob.

use std::io::{Read as _, Write as _};

use bherror::{
    traits::{ErrorContext as _, ForeignError as _},
    Error,
};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use openssl::symm::{self, Cipher};

use crate::{JweError, Result};

/// Length in bytes of the AES-GCM nonce.
pub const IV_LEN: usize = 12;

/// Length in bytes of the AES-GCM authentication tag appended to the
/// ciphertext.
pub const TAG_LEN: usize = 16;

fn aes_gcm_cipher(key: &[u8]) -> Result<Cipher> {
    match key.len() {
        16 => Ok(Cipher::aes_128_gcm()),
        24 => Ok(Cipher::aes_192_gcm()),
        32 => Ok(Cipher::aes_256_gcm()),
        len => Err(Error::root(JweError::Crypto(format!(
            "invalid AES key length {len}"
        )))),
    }
}

fn check_iv(iv: &[u8]) -> Result<()> {
    if iv.len() != IV_LEN {
        return Err(Error::root(JweError::Crypto(format!(
            "AES-GCM nonce must be {IV_LEN} bytes, got {}",
            iv.len()
        ))));
    }
    Ok(())
}

/// Encrypts `payload` with AES-GCM and returns the gzip stream of the
/// lowercase hex encoding of `ciphertext || tag`.
///
/// The AES variant follows the key length. The token minter passes the
/// 32 ASCII characters of the hex session key, so AES-256-GCM is used
/// there. No additional authenticated data is bound.
///
/// The output is a deterministic function of the inputs, apart from the
/// gzip header which carries no modification time.
///
/// # Errors
///
/// [`JweError::Crypto`] is returned if the key is not 16, 24 or 32 bytes
/// long, the nonce is not 12 bytes long, or the backend fails.
pub fn seal(key: &[u8], iv: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let cipher = aes_gcm_cipher(key)?;
    check_iv(iv)?;

    let mut tag = [0u8; TAG_LEN];
    let mut sealed = symm::encrypt_aead(cipher, key, Some(iv), &[], payload, &mut tag)
        .foreign_err(|| JweError::Crypto("AES-GCM encryption failed".to_owned()))?;
    sealed.extend_from_slice(&tag);

    gzip(hex::encode(sealed).as_bytes())
}

/// Reverses [`seal`]: gunzips, decodes the hex text, splits off the tag and
/// decrypts.
///
/// # Errors
///
/// Every failure, including an authentication failure, is reported as
/// [`JweError::Crypto`].
pub fn unseal(key: &[u8], iv: &[u8], compressed: &[u8]) -> Result<Vec<u8>> {
    let cipher = aes_gcm_cipher(key)?;
    check_iv(iv)?;

    let hex_text = gunzip(compressed)?;
    let sealed = hex::decode(hex_text)
        .foreign_err(|| JweError::Crypto("sealed payload is not hex encoded".to_owned()))?;

    if sealed.len() < TAG_LEN {
        return Err(Error::root(JweError::Crypto(format!(
            "sealed payload of {} bytes is shorter than the tag",
            sealed.len()
        ))));
    }
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    symm::decrypt_aead(cipher, key, Some(iv), &[], ciphertext, tag)
        .foreign_err(|| JweError::Crypto("AES-GCM decryption failed".to_owned()))
        .ctx(|| "authentication tag mismatch or corrupted ciphertext")
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .foreign_err(|| JweError::Crypto("gzip compression failed".to_owned()))?;
    encoder
        .finish()
        .foreign_err(|| JweError::Crypto("gzip compression failed".to_owned()))
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .foreign_err(|| JweError::Crypto("gzip decompression failed".to_owned()))?;
    Ok(decompressed)
}
