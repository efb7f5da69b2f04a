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

//! `base64` helpers for the two alphabets used by the token format.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    DecodeError, Engine as _,
};

/// Returns the `base64url`-encoded string **with padding** of the given
/// `payload`.
///
/// The token format keeps the `=` padding on every `base64url` part.
pub fn base64_url_encode<T: AsRef<[u8]>>(payload: T) -> String {
    URL_SAFE.encode(payload)
}

/// Decodes the given `payload` as the padded `base64url`-encoded string into
/// bytes.
pub fn base64_url_decode<T: AsRef<[u8]>>(payload: T) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE.decode(payload)
}

/// Returns the standard (`+`, `/`) `base64`-encoded string of the given
/// `payload`.
pub fn base64_encode<T: AsRef<[u8]>>(payload: T) -> String {
    STANDARD.encode(payload)
}

/// Decodes the given standard `base64`-encoded `payload` into bytes.
pub fn base64_decode<T: AsRef<[u8]>>(payload: T) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(payload)
}
