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

//! RSA primitives used by the token format.
//!
//! * RSAES-OAEP with SHA-256 as both the hash and the MGF1 hash, empty label.
//! * RSASSA-PSS with SHA-256 as both the hash and the MGF1 hash, salt length
//!   equal to the digest length.
//!
//! These parameters are fixed by the remote verifier; any other choice is
//! silently rejected there. Keys are accepted in PEM armor only, private keys
//! as PKCS#8 and public keys as PKIX `SubjectPublicKeyInfo`, and they must be
//! RSA keys.

use bherror::{
    traits::{ErrorContext as _, ForeignError as _},
    Error,
};
use openssl::{
    encrypt::{Decrypter, Encrypter},
    hash::MessageDigest,
    pkey::{Id, PKey, Private, Public},
    rsa::Padding,
    sign::{RsaPssSaltlen, Signer, Verifier},
};
use pem::Pem;

use crate::{JweError, Result};

/// An RSA public key parsed from a PKIX PEM block.
#[derive(Clone)]
pub struct RsaPublicKey(PKey<Public>);

/// An RSA private key parsed from a PKCS#8 PEM block.
#[derive(Clone)]
pub struct RsaPrivateKey(PKey<Private>);

impl std::fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("bits", &self.0.bits())
            .finish()
    }
}

// Never print private key material.
impl std::fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPrivateKey").finish_non_exhaustive()
    }
}

fn ensure_rsa<T>(key: &PKey<T>, label: &str) -> Result<()> {
    if key.id() == Id::RSA {
        return Ok(());
    }

    Err(Error::root(JweError::KeyParse(format!(
        "`{label}` block does not hold an RSA key (key type {})",
        key.id().as_raw()
    ))))
}

// Armor failures are configuration errors; the DER inside is checked by the callers.
fn decode_pem(key_pem: &[u8]) -> Result<Pem> {
    pem::parse(key_pem)
        .foreign_err(|| JweError::Config("key is not a decodable PEM block".to_owned()))
}

fn crypto(operation: &str) -> impl FnOnce() -> JweError + '_ {
    move || JweError::Crypto(format!("{operation} failed"))
}

impl RsaPublicKey {
    /// Parses a PEM-armored PKIX `SubjectPublicKeyInfo` holding an RSA key.
    ///
    /// # Errors
    ///
    /// * [`JweError::Config`] if the PEM armor cannot be decoded.
    /// * [`JweError::KeyParse`] if the block is not a PKIX structure or the key
    ///   is not an RSA key.
    pub fn from_pem(public_key_pem: &[u8]) -> Result<Self> {
        let block = decode_pem(public_key_pem)?;
        let key = PKey::public_key_from_der(block.contents()).foreign_err(|| {
            JweError::KeyParse(format!(
                "`{}` block is not a PKIX SubjectPublicKeyInfo",
                block.tag()
            ))
        })?;
        ensure_rsa(&key, block.tag())?;

        Ok(Self(key))
    }

    /// Encrypts `plaintext` with RSAES-OAEP (SHA-256, MGF1-SHA-256, empty
    /// label).
    ///
    /// # Errors
    ///
    /// [`JweError::Crypto`] is returned if the plaintext is too long for the
    /// modulus or the backend fails.
    pub fn encrypt_oaep(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut encrypter = Encrypter::new(&self.0).foreign_err(crypto("RSA-OAEP setup"))?;
        encrypter
            .set_rsa_padding(Padding::PKCS1_OAEP)
            .foreign_err(crypto("RSA-OAEP setup"))?;
        encrypter
            .set_rsa_oaep_md(MessageDigest::sha256())
            .foreign_err(crypto("RSA-OAEP setup"))?;
        encrypter
            .set_rsa_mgf1_md(MessageDigest::sha256())
            .foreign_err(crypto("RSA-OAEP setup"))?;

        let len = encrypter
            .encrypt_len(plaintext)
            .foreign_err(crypto("RSA-OAEP encryption"))?;
        let mut ciphertext = vec![0u8; len];
        let written = encrypter
            .encrypt(plaintext, &mut ciphertext)
            .foreign_err(crypto("RSA-OAEP encryption"))
            .ctx(|| format!("plaintext length is {} bytes", plaintext.len()))?;
        ciphertext.truncate(written);

        Ok(ciphertext)
    }

    /// Verifies an RSASSA-PSS (SHA-256, MGF1-SHA-256) `signature` over
    /// `message`.
    ///
    /// The salt length is detected from the signature, so signatures with
    /// any salt length are accepted. A signature that does not match, or that
    /// is not even well formed, yields `Ok(false)`.
    pub fn verify_pss(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        let mut verifier = Verifier::new(MessageDigest::sha256(), &self.0)
            .foreign_err(crypto("RSA-PSS verifier setup"))?;
        verifier
            .set_rsa_padding(Padding::PKCS1_PSS)
            .foreign_err(crypto("RSA-PSS verifier setup"))?;
        // -2 means "auto-detect" when verifying.
        verifier
            .set_rsa_pss_saltlen(RsaPssSaltlen::MAXIMUM_LENGTH)
            .foreign_err(crypto("RSA-PSS verifier setup"))?;
        verifier
            .set_rsa_mgf1_md(MessageDigest::sha256())
            .foreign_err(crypto("RSA-PSS verifier setup"))?;
        verifier
            .update(message)
            .foreign_err(crypto("RSA-PSS verification"))?;

        match verifier.verify(signature) {
            Ok(valid) => Ok(valid),
            Err(error) => {
                tracing::debug!(%error, "RSA-PSS signature rejected by the backend");
                Ok(false)
            }
        }
    }
}

impl RsaPrivateKey {
    /// Parses a PEM-armored PKCS#8 structure holding an RSA private key.
    ///
    /// # Errors
    ///
    /// * [`JweError::Config`] if the PEM armor cannot be decoded.
    /// * [`JweError::KeyParse`] if the block is not PKCS#8 or the key is not an
    ///   RSA key.
    pub fn from_pem(private_key_pem: &[u8]) -> Result<Self> {
        let block = decode_pem(private_key_pem)?;
        let key = PKey::private_key_from_pkcs8(block.contents()).foreign_err(|| {
            JweError::KeyParse(format!("`{}` block is not a PKCS#8 private key", block.tag()))
        })?;
        ensure_rsa(&key, block.tag())?;

        Ok(Self(key))
    }

    /// Signs `message` with RSASSA-PSS (SHA-256, MGF1-SHA-256, salt length of
    /// 32 bytes).
    ///
    /// # Errors
    ///
    /// [`JweError::Crypto`] is returned if the backend fails.
    pub fn sign_pss(&self, message: &[u8]) -> Result<Vec<u8>> {
        let mut signer = Signer::new(MessageDigest::sha256(), &self.0)
            .foreign_err(crypto("RSA-PSS signer setup"))?;
        signer
            .set_rsa_padding(Padding::PKCS1_PSS)
            .foreign_err(crypto("RSA-PSS signer setup"))?;
        signer
            .set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)
            .foreign_err(crypto("RSA-PSS signer setup"))?;
        signer
            .set_rsa_mgf1_md(MessageDigest::sha256())
            .foreign_err(crypto("RSA-PSS signer setup"))?;
        signer
            .update(message)
            .foreign_err(crypto("RSA-PSS signing"))?;

        signer.sign_to_vec().foreign_err(crypto("RSA-PSS signing"))
    }

    /// Decrypts an RSAES-OAEP (SHA-256, MGF1-SHA-256, empty label)
    /// `ciphertext`.
    ///
    /// This is the operation the wallet service performs on the wrapped
    /// session key.
    ///
    /// # Errors
    ///
    /// [`JweError::Crypto`] is returned if the ciphertext was not produced
    /// for this key or the backend fails.
    pub fn decrypt_oaep(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut decrypter = Decrypter::new(&self.0).foreign_err(crypto("RSA-OAEP setup"))?;
        decrypter
            .set_rsa_padding(Padding::PKCS1_OAEP)
            .foreign_err(crypto("RSA-OAEP setup"))?;
        decrypter
            .set_rsa_oaep_md(MessageDigest::sha256())
            .foreign_err(crypto("RSA-OAEP setup"))?;
        decrypter
            .set_rsa_mgf1_md(MessageDigest::sha256())
            .foreign_err(crypto("RSA-OAEP setup"))?;

        let len = decrypter
            .decrypt_len(ciphertext)
            .foreign_err(crypto("RSA-OAEP decryption"))?;
        let mut plaintext = vec![0u8; len];
        let written = decrypter
            .decrypt(ciphertext, &mut plaintext)
            .foreign_err(crypto("RSA-OAEP decryption"))?;
        plaintext.truncate(written);

        Ok(plaintext)
    }
}

/// Encrypts `plaintext` under the PEM-armored PKIX RSA public key with
/// RSAES-OAEP.
///
/// See [`RsaPublicKey::encrypt_oaep`].
pub fn encrypt_oaep(public_key_pem: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    RsaPublicKey::from_pem(public_key_pem)?.encrypt_oaep(plaintext)
}

/// Decrypts `ciphertext` with the PEM-armored PKCS#8 RSA private key.
///
/// See [`RsaPrivateKey::decrypt_oaep`].
pub fn decrypt_oaep(private_key_pem: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    RsaPrivateKey::from_pem(private_key_pem)?.decrypt_oaep(ciphertext)
}

/// Signs `message` with the PEM-armored PKCS#8 RSA private key using
/// RSASSA-PSS.
///
/// See [`RsaPrivateKey::sign_pss`].
pub fn sign_pss(private_key_pem: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    RsaPrivateKey::from_pem(private_key_pem)?.sign_pss(message)
}

/// Verifies an RSASSA-PSS `signature` over `message` with the PEM-armored
/// PKIX RSA public key.
///
/// See [`RsaPublicKey::verify_pss`].
pub fn verify_pss(public_key_pem: &[u8], message: &[u8], signature: &[u8]) -> Result<bool> {
    RsaPublicKey::from_pem(public_key_pem)?.verify_pss(message, signature)
}
