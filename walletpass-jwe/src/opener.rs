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

//! The receiving side of the token format.
//!
//! The wallet service is the only real consumer of tokens. [`open`] performs
//! the same steps it does, which makes it possible to check minted tokens
//! end to end when the service private key is known, e.g. with a test key
//! pair passed to
//! [`JweMinter::with_service_public_key`](crate::JweMinter::with_service_public_key).

use bherror::{
    traits::{ErrorContext as _, ForeignError as _},
    Error,
};
use zeroize::Zeroizing;

use crate::{
    jwe::encoded_header,
    rsa::{RsaPrivateKey, RsaPublicKey},
    sealer::{unseal, IV_LEN},
    utils::{base64_decode, base64_url_decode},
    JweError, Result,
};

/// A token split into its five encoded parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    header: &'a str,
    encrypted_key: &'a str,
    iv: &'a str,
    cipher_text: &'a str,
    signature: &'a str,
}

impl<'a> Token<'a> {
    /// Splits `token` on `.` into exactly five non-empty parts.
    ///
    /// # Errors
    ///
    /// [`JweError::Format`] is returned for any other shape.
    pub fn parse(token: &'a str) -> Result<Self> {
        let parts: Vec<&str> = token.split('.').collect();

        let [header, encrypted_key, iv, cipher_text, signature] = parts[..] else {
            return Err(Error::root(JweError::Format(format!(
                "expected 5 parts, found {}",
                parts.len()
            ))));
        };

        if let Some(idx) = parts.iter().position(|part| part.is_empty()) {
            return Err(Error::root(JweError::Format(format!(
                "part {} is empty",
                idx + 1
            ))));
        }

        Ok(Self {
            header,
            encrypted_key,
            iv,
            cipher_text,
            signature,
        })
    }

    /// The encoded header.
    pub fn header(&self) -> &'a str {
        self.header
    }

    /// The doubly encoded, RSA-wrapped session key.
    pub fn encrypted_key(&self) -> &'a str {
        self.encrypted_key
    }

    /// The encoded hex IV.
    pub fn iv(&self) -> &'a str {
        self.iv
    }

    /// The encoded, compressed cipher text.
    pub fn cipher_text(&self) -> &'a str {
        self.cipher_text
    }

    /// The standard `base64` signature.
    pub fn signature(&self) -> &'a str {
        self.signature
    }
}

/// Contents of a successfully opened and verified token.
#[derive(Debug)]
pub struct OpenedToken {
    payload: String,
    session_key_hex: Zeroizing<String>,
    iv_hex: String,
}

impl OpenedToken {
    /// The decrypted payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The session key as the 32 lowercase hex characters used as AES key.
    pub fn session_key_hex(&self) -> &str {
        &self.session_key_hex
    }

    /// The IV as 24 lowercase hex characters.
    pub fn iv_hex(&self) -> &str {
        &self.iv_hex
    }

    /// Consumes the token and returns the payload.
    pub fn into_payload(self) -> String {
        self.payload
    }
}

fn is_lower_hex(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f'))
}

/// Unwraps, decrypts and verifies `token`.
///
/// `service_private_key_pem` is the PKCS#8 key matching the public key the
/// token was minted for, and `issuer_public_key_pem` the PKIX key matching
/// the issuer's signing key.
///
/// # Errors
///
/// * [`JweError::Format`] if the token does not have the expected shape.
/// * [`JweError::Encoding`] if a part is not encoded as expected.
/// * [`JweError::Crypto`] if unwrapping or decryption fails, or the signature
///   does not verify.
/// * [`JweError::Config`] or [`JweError::KeyParse`] for unusable keys.
pub fn open(
    service_private_key_pem: &[u8],
    issuer_public_key_pem: &[u8],
    token: &str,
) -> Result<OpenedToken> {
    let service_key =
        RsaPrivateKey::from_pem(service_private_key_pem).ctx(|| "service private key")?;
    let issuer_key = RsaPublicKey::from_pem(issuer_public_key_pem).ctx(|| "issuer public key")?;

    let token = Token::parse(token)?;

    if token.header() != encoded_header() {
        return Err(Error::root(JweError::Format(
            "unexpected token header".to_owned(),
        )));
    }

    let wrapped_key = base64_url_decode(token.encrypted_key())
        .foreign_err(|| JweError::Encoding("encrypted key"))
        .and_then(|inner| {
            base64_decode(inner).foreign_err(|| JweError::Encoding("encrypted key"))
        })?;
    let session_key_hex = Zeroizing::new(
        String::from_utf8(service_key.decrypt_oaep(&wrapped_key)?)
            .foreign_err(|| JweError::Encoding("session key"))?,
    );
    if !is_lower_hex(&session_key_hex, 32) {
        return Err(Error::root(JweError::Format(
            "session key is not 32 hex characters".to_owned(),
        )));
    }

    let iv_hex = base64_url_decode(token.iv())
        .foreign_err(|| JweError::Encoding("IV"))
        .and_then(|bytes| String::from_utf8(bytes).foreign_err(|| JweError::Encoding("IV")))?;
    if !is_lower_hex(&iv_hex, 2 * IV_LEN) {
        return Err(Error::root(JweError::Format(format!(
            "IV is not {} hex characters",
            2 * IV_LEN
        ))));
    }
    let iv = hex::decode(&iv_hex).foreign_err(|| JweError::Encoding("IV"))?;

    let compressed =
        base64_url_decode(token.cipher_text()).foreign_err(|| JweError::Encoding("cipher text"))?;
    let payload = String::from_utf8(unseal(session_key_hex.as_bytes(), &iv, &compressed)?)
        .foreign_err(|| JweError::Encoding("payload"))?;

    let signature =
        base64_decode(token.signature()).foreign_err(|| JweError::Encoding("signature"))?;
    let signing_input = Zeroizing::new(format!(
        "{}.{}.{}.{payload}",
        token.header(),
        session_key_hex.as_str(),
        token.iv()
    ));
    if !issuer_key.verify_pss(signing_input.as_bytes(), &signature)? {
        return Err(Error::root(JweError::Crypto(
            "token signature does not verify".to_owned(),
        )));
    }

    Ok(OpenedToken {
        payload,
        session_key_hex,
        iv_hex,
    })
}
