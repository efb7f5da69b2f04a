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

//! Verification of the notifications the wallet server pushes to the
//! developer's callback endpoint.
//!
//! The server signs the notification parameters with RSA-PSS (SHA-256) and
//! sends the `base64` signature along. The signed content is the
//! [canonical string](sign_string) of the parameters.

use bherror::traits::{ForeignError as _, PropagateError as _};
use walletpass_jwe::{rsa::verify_pss, utils::base64_decode};

use crate::{ClientError, Result};

/// Builds the canonical string of callback parameters: entries sorted by key,
/// entries with an empty value left out, rendered as `key=value` and joined
/// with `&`.
pub fn sign_string<K, V>(params: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut params: Vec<(K, V)> = params
        .into_iter()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .collect();
    params.sort_by(|(a, _), (b, _)| a.as_ref().cmp(b.as_ref()));

    params
        .iter()
        .map(|(key, value)| format!("{}={}", key.as_ref(), value.as_ref()))
        .collect::<Vec<_>>()
        .join("&")
}

/// Checks the `base64` `signature` of callback `params` against the server's
/// PEM-armored PKIX RSA public key.
///
/// Returns `Ok(false)` if the signature does not match.
///
/// # Errors
///
/// * [`ClientError::Signature`] if the signature is not valid `base64`.
/// * [`ClientError::Jwe`] if the public key is unusable.
pub fn verify_callback<K, V>(
    params: impl IntoIterator<Item = (K, V)>,
    signature: &str,
    public_key_pem: &[u8],
) -> Result<bool>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let signature = base64_decode(signature)
        .foreign_err(|| ClientError::Signature("not standard base64".to_owned()))?;
    let content = sign_string(params);

    let valid = verify_pss(public_key_pem, content.as_bytes(), &signature)
        .with_err(|| ClientError::Jwe)?;
    if !valid {
        tracing::warn!("callback signature does not verify");
    }

    Ok(valid)
}
