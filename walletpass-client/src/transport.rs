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

//! HTTP transport used to talk to the token endpoint and the wallet server.

use std::{future::Future, time::Duration};

use bherror::{traits::ForeignError as _, Error};
use reqwest::{Client, ClientBuilder};

use crate::{ClientError, Result};

/// Timeout applied to every request sent by [`ReqwestHttpClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Interface providing functionality of sending a prepared HTTP request.
///
/// The abstraction allows replacing the transport, e.g. to pin hosts or to
/// stub the server in tests.
pub trait HttpClient: Sync {
    /// Error type used by this trait.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Sends `request` and returns the response, whatever its status code.
    fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = std::result::Result<reqwest::Response, Self::Err>> + Send;
}

/// [`HttpClient`] implementation using a single shared [`reqwest::Client`].
///
/// Connections are pooled and kept alive between requests.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient(Client);

impl ReqwestHttpClient {
    /// Creates a client with a [`DEFAULT_TIMEOUT`] per request.
    pub fn new() -> Result<Self> {
        Self::from_builder(Client::builder().timeout(DEFAULT_TIMEOUT))
    }

    /// Construct [`ReqwestHttpClient`] from [`Client`].
    pub fn from_client(client: Client) -> Self {
        Self(client)
    }

    /// Construct [`ReqwestHttpClient`] from [`ClientBuilder`].
    pub fn from_builder(builder: ClientBuilder) -> Result<Self> {
        let client = builder
            .build()
            .foreign_err(|| ClientError::Config("unable to build the HTTP client".to_owned()))?;
        Ok(Self(client))
    }
}

impl HttpClient for ReqwestHttpClient {
    type Err = reqwest::Error;

    fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = reqwest::Result<reqwest::Response>> {
        self.0.execute(request)
    }
}

/// Sends `request` and returns the response body of a `2xx` response.
pub(crate) async fn send<C: HttpClient>(client: &C, request: reqwest::Request) -> Result<String> {
    let method = request.method().clone();
    let url = request.url().clone();
    tracing::debug!(%method, %url, "sending request");

    let response = client
        .execute(request)
        .await
        .foreign_err(|| ClientError::Request(format!("{method} {url}")))?;

    let status = response.status();
    let body = response.text().await.foreign_err(|| {
        ClientError::Response(format!("unable to read the body of {method} {url}"))
    })?;

    if !status.is_success() {
        tracing::warn!(%method, %url, status = status.as_u16(), "request rejected");
        return Err(Error::root(ClientError::Status(status.as_u16(), body)));
    }

    Ok(body)
}
