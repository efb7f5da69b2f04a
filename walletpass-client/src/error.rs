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
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum ClientError {
    /// The configuration is missing a key or holds an unusable value.
    #[strum(to_string = "Invalid configuration: {0}")]
    Config(String),
    /// An access token could not be obtained.
    #[strum(to_string = "Unable to obtain an access token: {0}")]
    Token(String),
    /// The request could not be built or sent, e.g. on a connection failure
    /// or a timeout.
    #[strum(to_string = "Request failed: {0}")]
    Request(String),
    /// The server answered with a status code outside of `2xx`; the response
    /// body is kept as is.
    #[strum(to_string = "Server responded with status {0}: {1}")]
    Status(u16, String),
    /// The response could not be read or is not the expected JSON.
    #[strum(to_string = "Unexpected response: {0}")]
    Response(String),
    /// A callback signature is not valid `base64`.
    #[strum(to_string = "Invalid callback signature: {0}")]
    Signature(String),
    /// Minting a token, or verifying a signature, failed.
    #[strum(to_string = "Token operation failed")]
    Jwe,
    /// A pass model or instance failed local validation.
    #[strum(to_string = "Invalid pass: {0}")]
    Validation(String),
}

impl bherror::BhError for ClientError {}

/// Type alias for [`bherror::Result`] types returned by the crate's API.
pub type Result<T> = bherror::Result<T, ClientError>;
