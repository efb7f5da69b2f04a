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

//! Assembly of the five-part token redeemed by the wallet service.
//!
//! ```text
//! token     := headerEnc "." encKeyEnc "." ivEnc "." cipherEnc "." sigEnc
//! headerEnc := base64url(JWE_HEADER)
//! encKeyEnc := base64url(base64(RSA-OAEP(service key, hex(session key))))
//! ivEnc     := base64url(hex(iv))
//! cipherEnc := base64url(gzip(hex(AES-GCM(hex(session key), iv, payload))))
//! sigEnc    := base64(RSA-PSS(issuer key,
//!                  headerEnc "." hex(session key) "." ivEnc "." payload))
//! ```
//!
//! Every `base64url` part keeps its `=` padding, while the signature uses the
//! standard alphabet. Both quirks are required by the service's parser.

use bherror::{traits::ErrorContext as _, Error};
use zeroize::Zeroizing;

use crate::{
    rand::{OsRandom, RandomFactorSource},
    rsa::{RsaPrivateKey, RsaPublicKey},
    sealer::{seal, IV_LEN},
    utils::{base64_encode, base64_url_encode},
    JweError, Result,
};

/// The header of every token, before encoding.
///
/// Despite `enc=A128GCM`, the payload is encrypted with AES-256-GCM because the
/// 32 hex characters of the session key are used as the AES key.
pub const JWE_HEADER: &str = "alg=RSA-OAEP, enc=A128GCM, kid=1, zip=gzip";

/// RSA-3072 public key of the wallet service, used to wrap the session key.
pub const SERVICE_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MIIBojANBgkqhkiG9w0BAQEFAAOCAY8AMIIBigKCAYEAgBJB4usbO33Xg5vhJqfH
JsMZj44f7rxpjRuPhGy37bUBjSLXN+dS6HpxnZwSVJCtmiydjl3Inq3Mzu4SCGxf
b9RIjqRRfHA7ab5p3JnJVQfTEHMHy8XcABl6EPYIJMh26kztPOKU2Mkn6yhRaCur
hVUD3n9bD8omiNrR4rg442AJlNamA7vgKs65AoqBuU4NBkGHg0VWWpEHCUx/xyX6
hIwqc1aD7P2f62ZHsKpNZBOek/riWhaVx3dTAa9ZS+Av3IGLOZiplhYIow9f8dlW
yqs8nff9FZoJO03QhXLvOORT+lPAkW6gFzaoeMaGb40HakkZn3uvlAEKrKrtR0rZ
Eok+N1hnboaAu8oaKK0rF1W6iNrXcFrO0rcrCsFTVF8qCa/1dFmIXwUd2M6cUzT9
W0YkNyb6ZBbwEhjwBL4DNW4JfeF2Dzj0eZYlSuYV7e7e1e+XEO8lwPLAiy4bEFAW
CaeuDVIhbIoBaU6xHNVQoyzct98gaOYxE4mVDqAUVmhfAgMBAAE=
-----END PUBLIC KEY-----
";

/// Length in bytes of the random session key, before hex encoding.
pub const SESSION_KEY_LEN: usize = 16;

/// Returns the `base64url` encoding of [`JWE_HEADER`], i.e. the first part of
/// every token.
pub fn encoded_header() -> String {
    base64_url_encode(JWE_HEADER)
}

/// Mints tokens for the wallet service.
///
/// A minter holds the parsed service public key and a [`RandomFactorSource`].
/// It is immutable after construction and may be shared between threads.
#[derive(Debug, Clone)]
pub struct JweMinter<R = OsRandom> {
    service_public_key: RsaPublicKey,
    random: R,
}

impl JweMinter<OsRandom> {
    /// Creates a minter which wraps session keys for the wallet service, i.e.
    /// with [`SERVICE_PUBLIC_KEY_PEM`].
    pub fn new() -> Result<Self> {
        Self::with_service_public_key(SERVICE_PUBLIC_KEY_PEM.as_bytes())
            .ctx(|| "compiled-in service public key")
    }

    /// Creates a minter which wraps session keys with the given PEM-armored
    /// PKIX RSA public key.
    pub fn with_service_public_key(service_public_key_pem: &[u8]) -> Result<Self> {
        Ok(Self {
            service_public_key: RsaPublicKey::from_pem(service_public_key_pem)?,
            random: OsRandom,
        })
    }
}

impl<R: RandomFactorSource> JweMinter<R> {
    /// Replaces the source of session keys and IVs.
    pub fn with_random_source<S: RandomFactorSource>(self, random: S) -> JweMinter<S> {
        JweMinter {
            service_public_key: self.service_public_key,
            random,
        }
    }

    /// Mints a token carrying `payload`, signed with the PEM-armored PKCS#8
    /// RSA private key of the issuer.
    ///
    /// # Errors
    ///
    /// Any failure of key parsing, random generation, encryption or signing
    /// is returned unchanged; see [`JweError`].
    pub fn mint(&self, issuer_private_key_pem: &[u8], payload: &str) -> Result<String> {
        let issuer_key = RsaPrivateKey::from_pem(issuer_private_key_pem)
            .ctx(|| "issuer private key")?;
        self.mint_with_key(&issuer_key, payload)
    }

    /// Same as [`JweMinter::mint`], but with an already parsed issuer key.
    pub fn mint_with_key(&self, issuer_key: &RsaPrivateKey, payload: &str) -> Result<String> {
        let header = encoded_header();

        let session_key = self.draw(SESSION_KEY_LEN)?;
        let session_key_hex = Zeroizing::new(hex::encode(session_key.as_slice()));
        let wrapped_key = self
            .service_public_key
            .encrypt_oaep(session_key_hex.as_bytes())
            .ctx(|| "wrapping the session key")?;
        let encrypted_key = base64_url_encode(base64_encode(wrapped_key));

        let iv = self.draw(IV_LEN)?;
        let encoded_iv = base64_url_encode(hex::encode(iv.as_slice()));

        let cipher_text = base64_url_encode(
            seal(session_key_hex.as_bytes(), &iv, payload.as_bytes())
                .ctx(|| "sealing the payload")?,
        );

        let signing_input = Zeroizing::new(format!(
            "{header}.{}.{encoded_iv}.{payload}",
            session_key_hex.as_str()
        ));
        let signature = base64_encode(
            issuer_key
                .sign_pss(signing_input.as_bytes())
                .ctx(|| "signing the token")?,
        );

        tracing::debug!(payload_len = payload.len(), "minted wallet pass token");

        Ok([header, encrypted_key, encoded_iv, cipher_text, signature].join("."))
    }

    fn draw(&self, len: usize) -> Result<Zeroizing<Vec<u8>>> {
        let bytes = Zeroizing::new(self.random.random_bytes(len)?);
        if bytes.len() != len {
            return Err(Error::root(JweError::Rng(len)).ctx(format!(
                "random source returned {} bytes",
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}

/// Mints a token with a default [`JweMinter`].
///
/// See [`JweMinter::mint`].
pub fn mint(issuer_private_key_pem: &[u8], payload: &str) -> Result<String> {
    JweMinter::new()?.mint(issuer_private_key_pem, payload)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{
        test_utils::{
            ec_private_key_pem, issuer_key_pair, service_key_pair, FailingRandom, ShortRandom,
        },
        utils::{base64_decode, base64_url_decode},
    };

    const PAYLOAD: &str = r#"{"iss":"app1","instanceIds":["EventTicketPass10001"]}"#;

    fn parts(token: &str) -> Vec<&str> {
        token.split('.').collect()
    }

    #[test]
    fn test_encoded_header() {
        assert_eq!(
            encoded_header(),
            "YWxnPVJTQS1PQUVQLCBlbmM9QTEyOEdDTSwga2lkPTEsIHppcD1nemlw"
        );
    }

    #[test]
    fn test_service_public_key_parses() {
        let minter = JweMinter::new().unwrap();
        assert!(format!("{minter:?}").contains("bits: 3072"));
    }

    #[test]
    fn test_mint_shape() {
        let token = mint(&issuer_key_pair().private_pem, PAYLOAD).unwrap();

        let parts = parts(&token);
        assert_eq!(parts.len(), 5);
        assert!(parts.iter().all(|part| !part.is_empty()));
        assert_eq!(parts[0], encoded_header());
    }

    #[test]
    fn test_mint_wrapped_key_encoding() {
        let token = mint(&issuer_key_pair().private_pem, PAYLOAD).unwrap();

        let inner = base64_url_decode(parts(&token)[1]).unwrap();
        let wrapped = base64_decode(inner).unwrap();
        // RSA-3072 modulus
        assert_eq!(wrapped.len(), 384);
    }

    #[test]
    fn test_mint_iv_is_hex24() {
        let token = mint(&issuer_key_pair().private_pem, PAYLOAD).unwrap();

        let iv_hex = base64_url_decode(parts(&token)[2]).unwrap();
        assert_eq!(iv_hex.len(), 24);
        assert!(iv_hex
            .iter()
            .all(|c| c.is_ascii_digit() || (b'a'..=b'f').contains(c)));
    }

    #[test]
    fn test_mint_signature_is_standard_base64() {
        let token = mint(&issuer_key_pair().private_pem, PAYLOAD).unwrap();

        let signature = base64_decode(parts(&token)[4]).unwrap();
        assert_eq!(signature.len(), 256);
    }

    #[test]
    fn test_mint_is_fresh() {
        let minter = JweMinter::new().unwrap();
        let issuer_pem = &issuer_key_pair().private_pem;

        let first = minter.mint(issuer_pem, PAYLOAD).unwrap();
        let second = minter.mint(issuer_pem, PAYLOAD).unwrap();

        let (first, second) = (parts(&first), parts(&second));
        assert_eq!(first[0], second[0]);
        for idx in 1..5 {
            assert_ne!(first[idx], second[idx], "part {idx} repeated");
        }
    }

    #[test]
    fn test_mint_does_not_mutate_inputs() {
        let issuer_pem = issuer_key_pair().private_pem.clone();
        let payload = PAYLOAD.to_owned();

        mint(&issuer_pem, &payload).unwrap();

        assert_eq!(issuer_pem, issuer_key_pair().private_pem);
        assert_eq!(payload, PAYLOAD);
    }

    #[test]
    fn test_mint_with_custom_service_key() {
        let minter =
            JweMinter::with_service_public_key(&service_key_pair().public_pem).unwrap();

        let token = minter.mint(&issuer_key_pair().private_pem, PAYLOAD).unwrap();

        let wrapped = base64_decode(base64_url_decode(parts(&token)[1]).unwrap()).unwrap();
        assert_eq!(wrapped.len(), 256);
    }

    #[test]
    fn test_mint_ec_issuer_key() {
        let err = mint(&ec_private_key_pem(), PAYLOAD).unwrap_err();
        assert_matches!(err.error, JweError::KeyParse(_));
    }

    #[test]
    fn test_mint_undecodable_issuer_key() {
        let err = mint(b"Replace with your private key.", PAYLOAD).unwrap_err();
        assert_matches!(err.error, JweError::Config(_));
    }

    #[test]
    fn test_mint_rng_failure() {
        for fail_on in [0, 1] {
            let minter = JweMinter::new()
                .unwrap()
                .with_random_source(FailingRandom::new(fail_on));

            let err = minter
                .mint(&issuer_key_pair().private_pem, PAYLOAD)
                .unwrap_err();
            assert_matches!(err.error, JweError::Rng(_));
        }
    }

    #[test]
    fn test_mint_short_random_draw() {
        let minter = JweMinter::new().unwrap().with_random_source(ShortRandom);

        let err = minter
            .mint(&issuer_key_pair().private_pem, PAYLOAD)
            .unwrap_err();
        assert_eq!(err.error, JweError::Rng(SESSION_KEY_LEN));
    }

    #[test]
    fn test_minter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JweMinter>();
    }
}
