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

//! OAuth 2.0 client credentials grant against the token endpoint.

use bherror::{
    traits::{ErrorContext as _, ForeignError as _},
    Error,
};
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    Method, Url,
};
use serde::Deserialize;

use crate::{transport::send, ClientError, HttpClient, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Response of the token endpoint.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    /// The bearer token.
    pub access_token: String,
    /// Lifetime of the token in seconds.
    #[serde(default)]
    pub expires_in: i64,
    /// Type of the token, normally `Bearer`.
    #[serde(default)]
    pub token_type: String,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Fetches access tokens from the OAuth token endpoint.
pub struct TokenService<C> {
    client: C,
    token_url: Url,
}

impl<C: HttpClient> TokenService<C> {
    /// Creates a [`TokenService`] posting to `token_url` through `client`.
    pub fn new(client: C, token_url: Url) -> Self {
        Self { client, token_url }
    }

    /// The underlying transport.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Requests a new access token with the client credentials grant.
    ///
    /// No caching is done; every call hits the endpoint.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Request`] or [`ClientError::Status`] if the request
    ///   fails.
    /// * [`ClientError::Token`] if the response carries no usable token.
    pub async fn fetch_token(&self, app_id: &str, app_secret: &str) -> Result<AccessToken> {
        let body = format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            urlencoding::encode(app_id),
            urlencoding::encode(app_secret)
        );

        let mut request = reqwest::Request::new(Method::POST, self.token_url.clone());
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        *request.body_mut() = Some(body.into());

        let response = send(&self.client, request)
            .await
            .ctx(|| "requesting an access token")?;

        let token: AccessToken = serde_json::from_str(&response)
            .foreign_err(|| ClientError::Token("malformed token response".to_owned()))?;
        if token.access_token.is_empty() {
            return Err(Error::root(ClientError::Token(
                "token response has an empty `access_token`".to_owned(),
            )));
        }

        tracing::debug!(expires_in = token.expires_in, "obtained access token");

        Ok(token)
    }
}
