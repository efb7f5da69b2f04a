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

//! Key fixtures shared by the unit tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    OnceLock,
};

use bherror::Error;
use openssl::{
    ec::{EcGroup, EcKey},
    nid::Nid,
    pkey::PKey,
    rsa::Rsa,
};

use crate::{JweError, RandomFactorSource, Result};

pub(crate) struct KeyPairPem {
    pub(crate) private_pem: Vec<u8>,
    pub(crate) public_pem: Vec<u8>,
}

fn generate_rsa_key_pair() -> KeyPairPem {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    KeyPairPem {
        private_pem: key.private_key_to_pem_pkcs8().unwrap(),
        public_pem: key.public_key_to_pem().unwrap(),
    }
}

/// RSA-2048 pair standing in for the pass issuer.
pub(crate) fn issuer_key_pair() -> &'static KeyPairPem {
    static KEYS: OnceLock<KeyPairPem> = OnceLock::new();
    KEYS.get_or_init(generate_rsa_key_pair)
}

/// RSA-2048 pair standing in for the wallet service.
pub(crate) fn service_key_pair() -> &'static KeyPairPem {
    static KEYS: OnceLock<KeyPairPem> = OnceLock::new();
    KEYS.get_or_init(generate_rsa_key_pair)
}

fn ec_key() -> PKey<openssl::pkey::Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

pub(crate) fn ec_private_key_pem() -> Vec<u8> {
    ec_key().private_key_to_pem_pkcs8().unwrap()
}

pub(crate) fn ec_public_key_pem() -> Vec<u8> {
    ec_key().public_key_to_pem().unwrap()
}

pub(crate) fn ed25519_private_key_pem() -> Vec<u8> {
    PKey::generate_ed25519()
        .unwrap()
        .private_key_to_pem_pkcs8()
        .unwrap()
}

/// Traditional `RSA PRIVATE KEY` (PKCS#1) armor.
pub(crate) fn pkcs1_rsa_private_key_pem() -> Vec<u8> {
    Rsa::generate(1024).unwrap().private_key_to_pem().unwrap()
}

/// Random source which fails on the `fail_on`-th draw (zero based).
pub(crate) struct FailingRandom {
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingRandom {
    pub(crate) fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

impl RandomFactorSource for FailingRandom {
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on {
            return Err(Error::root(JweError::Rng(len)));
        }
        Ok(vec![0x42; len])
    }
}

/// Random source which hands out one byte less than requested.
pub(crate) struct ShortRandom;

impl RandomFactorSource for ShortRandom {
    fn random_bytes(&self, len: usize) -> Result<Vec<u8>> {
        Ok(vec![0x42; len.saturating_sub(1)])
    }
}
