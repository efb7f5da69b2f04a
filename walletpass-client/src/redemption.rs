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

//! Links which let a user save a pass into their wallet.

use bherror::traits::ForeignError as _;
use reqwest::Url;

use crate::{ClientError, Result};

const SAVE_PATH: &str = "/walletkit/consumer/pass/save";

/// Host serving the save page, by region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletHost {
    /// Mainland China.
    China,
    /// Russia.
    Russia,
    /// Asia, Africa and Latin America.
    AsiaAfricaLatinAmerica,
    /// Europe.
    Europe,
    /// Any other host, e.g. a test environment.
    Custom(String),
}

impl WalletHost {
    /// The host name.
    pub fn host(&self) -> &str {
        match self {
            WalletHost::China => "walletpass-drcn.cloud.huawei.com",
            WalletHost::Russia => "walletpass-drru.cloud.huawei.com",
            WalletHost::AsiaAfricaLatinAmerica => "walletpass-dra.cloud.huawei.com",
            WalletHost::Europe => "walletpass-dre.cloud.huawei.com",
            WalletHost::Custom(host) => host,
        }
    }
}

/// Returns `https://{host}/walletkit/consumer/pass/save?jwt={token}` with the
/// token form-urlencoded.
///
/// # Errors
///
/// [`ClientError::Config`] is returned if a [`WalletHost::Custom`] host does
/// not form a valid URL.
pub fn save_url(host: &WalletHost, token: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("https://{}{SAVE_PATH}", host.host())).foreign_err(|| {
        ClientError::Config(format!("`{}` is not a valid wallet host", host.host()))
    })?;
    url.query_pairs_mut().append_pair("jwt", token);
    Ok(url)
}
