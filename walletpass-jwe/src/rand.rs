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

//! Source of the random factors (session key and IV) drawn for every mint.

use bherror::traits::{ErrorContext as _, ForeignError as _};

use crate::{JweError, Result};

/// A source of cryptographically secure random bytes.
///
/// Implementations must be safe to share between threads, since a single
/// [`JweMinter`](crate::JweMinter) may be used concurrently.
pub trait RandomFactorSource: Send + Sync {
    /// Returns exactly `len` fresh random bytes.
    ///
    /// # Errors
    ///
    /// [`JweError::Rng`] is returned if the source cannot satisfy the request.
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>>;
}

/// [`RandomFactorSource`] backed by the OpenSSL CSPRNG, which is seeded from
/// the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomFactorSource for OsRandom {
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        openssl::rand::rand_bytes(&mut bytes)
            .foreign_err(|| JweError::Rng(len))
            .ctx(|| "OpenSSL RAND_bytes failed")?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length() {
        for len in [0, 12, 16, 64] {
            assert_eq!(OsRandom.random_bytes(len).unwrap().len(), len);
        }
    }

    #[test]
    fn test_random_bytes_are_fresh() {
        let first = OsRandom.random_bytes(16).unwrap();
        let second = OsRandom.random_bytes(16).unwrap();

        assert!(!first.iter().all(|b| *b == 0));
        assert_ne!(first, second);
    }
}
