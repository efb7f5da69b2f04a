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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! A `crate` for minting the tokens used to hand wallet passes over to the
//! wallet service.
//!
//! A token is a proprietary variant of a compact JWE: five `.`-separated
//! parts carrying a header, an RSA-wrapped session key, an IV, the
//! AES-GCM encrypted and gzip compressed payload, and an RSA-PSS signature
//! of the issuer. The exact grammar is documented in the [`jwe`] module.
//!
//! Note: the header advertises `enc=A128GCM`, but the 32 hex characters of the
//! 16-byte session key are used directly as the AES key, so the payload is in
//! fact encrypted with AES-256-GCM. The service expects exactly this.
//!
//! # Details
//!
//! [`JweMinter`] mints tokens for the compiled-in
//! [service key](SERVICE_PUBLIC_KEY_PEM); the free function [`mint`] is a
//! shorthand for a default minter. The RSA primitives are available on their
//! own in the [`rsa`] module, e.g. for verifying callbacks of the service.
//!
//! [`open`] reverses [`JweMinter::mint`] given the service private key, which
//! is only useful against a service key pair under your control.
//!
//! # Example
//!
//! ```
//! use openssl::{pkey::PKey, rsa::Rsa};
//! use walletpass_jwe::{open, JweMinter};
//!
//! let issuer = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
//! let issuer_private_pem = issuer.private_key_to_pem_pkcs8().unwrap();
//! let issuer_public_pem = issuer.public_key_to_pem().unwrap();
//!
//! // A service key pair under our control, so that the token can be opened.
//! let service = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
//! let minter =
//!     JweMinter::with_service_public_key(&service.public_key_to_pem().unwrap()).unwrap();
//!
//! let payload = r#"{"iss":"app1","instanceIds":["EventTicketPass10001"]}"#;
//! let token = minter.mint(&issuer_private_pem, payload).unwrap();
//! assert_eq!(token.split('.').count(), 5);
//!
//! let opened = open(
//!     &service.private_key_to_pem_pkcs8().unwrap(),
//!     &issuer_public_pem,
//!     &token,
//! )
//! .unwrap();
//! assert_eq!(opened.payload(), payload);
//! ```

mod error;
pub mod jwe;
mod opener;
mod rand;
pub mod rsa;
pub mod sealer;
#[cfg(test)]
mod test_utils;
pub mod utils;

pub use error::{JweError, Result};
pub use jwe::{encoded_header, mint, JweMinter, JWE_HEADER, SERVICE_PUBLIC_KEY_PEM};
pub use opener::{open, OpenedToken, Token};
pub use rand::{OsRandom, RandomFactorSource};
pub use rsa::{RsaPrivateKey, RsaPublicKey};
