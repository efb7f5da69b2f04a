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

//! Client of the wallet pass service.
//!
//! The service stores pass *models*, the templates shared by all passes of one
//! style, and pass *instances*, the passes held by users, for each
//! [`PassCategory`]. This `crate` covers the calls a pass issuer makes:
//!
//! - loading the application credentials and endpoints from a
//!   [configuration file](ConfigFile);
//! - fetching OAuth access tokens with [`TokenService`];
//! - creating, reading, listing and updating models and instances with
//!   [`WalletServerClient`];
//! - minting the tokens which hand instances over to a wallet, and building
//!   the [save link](save_url) around them;
//! - [verifying](verify_callback) the callbacks the service sends back;
//! - checking models and instances locally before they are sent, with
//!   [`validate_model`] and [`validate_instance`].
//!
//! Token minting itself lives in the [`walletpass_jwe`] crate.
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> walletpass_client::Result<()> {
//! use futures::TryStreamExt as _;
//! use serde_json::json;
//! use walletpass_client::{
//!     ClientConfig, ConfigFile, PassCategory, PassResource, ReqwestHttpClient, WalletHost,
//!     WalletServerClient,
//! };
//!
//! let file = ConfigFile::open("release.config.properties")?;
//! let client = WalletServerClient::new(
//!     ClientConfig::from_config_file(&file)?,
//!     ReqwestHttpClient::new()?,
//! );
//!
//! let instance = json!({
//!     "organizationPassId": "1234567",
//!     "serialNumber": "EventTicketPass10001",
//! });
//! walletpass_client::validate_instance(&instance)?;
//! client
//!     .create(PassCategory::EventTicket, PassResource::Instance, &instance)
//!     .await?;
//!
//! let pages: Vec<_> = client
//!     .list_instances(PassCategory::EventTicket, "EventTicketModel001", Some(10))
//!     .try_collect()
//!     .await?;
//!
//! let issuer_key = std::fs::read("issuer_private_key.pem").unwrap();
//! let link = client.mint_save_url(
//!     &WalletHost::Europe,
//!     &issuer_key,
//!     &json!({ "instanceIds": ["EventTicketPass10001"] }),
//! )?;
//! println!("{link} {}", pages.len());
//! # Ok(())
//! # }
//! ```

mod api;
mod callback;
mod config;
mod error;
mod pass;
mod redemption;
#[cfg(test)]
mod test_utils;
mod token;
mod transport;
mod validation;

pub use api::{Page, PageInfo, WalletServerClient};
pub use callback::{sign_string, verify_callback};
pub use config::{
    parse_entries, ClientConfig, ConfigFile, APP_ID_KEY, APP_SECRET_KEY, TOKEN_URL_KEY,
    WALLET_SERVER_BASE_URL_KEY,
};
pub use error::{ClientError, Result};
pub use pass::{PassCategory, PassResource};
pub use redemption::{save_url, WalletHost};
pub use token::{AccessToken, TokenService};
pub use transport::{HttpClient, ReqwestHttpClient, DEFAULT_TIMEOUT};
pub use validation::{validate_instance, validate_instance_at, validate_model};
