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

//! This module defines the error values returned by the crate API.

/// Error type used across the crate API.
///
/// Every failure of a mint is reported with one of these variants; no
/// partially built token is ever returned.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum JweError {
    /// The supplied key material could not be decoded, e.g. the PEM armor is
    /// missing or its body is not valid base64.
    #[strum(to_string = "Unable to decode key material: {0}")]
    Config(String),
    /// The key decoded fine but it is not an RSA key, or it is not wrapped in
    /// the expected PKCS#8 (private) or PKIX (public) structure.
    #[strum(to_string = "Unsupported key: {0}")]
    KeyParse(String),
    /// A cryptographic primitive rejected its input or failed, e.g. the
    /// plaintext is too long for OAEP or the AES key has an invalid length.
    #[strum(to_string = "Crypto backend failed: {0}")]
    Crypto(String),
    /// The secure random number generator could not provide the requested
    /// number of bytes.
    #[strum(to_string = "Secure random source failed to produce {0} bytes")]
    Rng(usize),
    /// A token part is not encoded the way the token format requires.
    #[strum(to_string = "Invalid encoding of the token {0}")]
    Encoding(&'static str),
    /// A token does not have the expected shape.
    #[strum(to_string = "Malformed token: {0}")]
    Format(String),
}

impl bherror::BhError for JweError {}

/// Type alias for [`bherror::Result`] types returned by the crate's API.
pub type Result<T> = bherror::Result<T, JweError>;
