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

//! Client of the wallet server REST API.
//!
//! Every resource lives under `{walletServerBaseUrl}/v1/{category}/{resource}`:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [create](WalletServerClient::create) | `POST /v1/{category}/{resource}` |
//! | [get](WalletServerClient::get) | `GET /v1/{category}/{resource}/{id}` |
//! | [list](WalletServerClient::list_models) | `GET /v1/{category}/{resource}?pageSize=&session=` |
//! | [update](WalletServerClient::update) | `PUT /v1/{category}/{resource}/{id}` |
//! | [patch](WalletServerClient::patch) | `PATCH /v1/{category}/{resource}/{id}` |
//! | [add_message](WalletServerClient::add_message) | `POST .../{id}/addMessage` |
//!
//! Requests carry a bearer token fetched from the token endpoint right before
//! the request is sent.

use bh_uri_utils::UriPathExtensions as _;
use bherror::traits::{ErrorContext as _, ForeignError as _, PropagateError as _};
use futures::{stream, Stream};
use reqwest::{
    header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method, Url,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{
    redemption::{save_url, WalletHost},
    transport::send,
    ClientConfig, ClientError, HttpClient, PassCategory, PassResource, Result, TokenService,
};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Paging metadata of a list response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Service which served the page.
    pub service_type: Option<String>,
    /// Size of the page.
    pub page_size: Option<i64>,
    /// Cursor of the next page; absent or empty on the last page.
    pub next_session: Option<String>,
}

/// One page of a list response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    /// Paging metadata.
    pub page_info: PageInfo,
    /// The models or instances on this page.
    #[serde(deserialize_with = "null_as_empty")]
    pub data: Vec<Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<Value>, D::Error> {
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

enum Cursor {
    First(Result<Url>),
    Next(Url, String),
    Done,
}

/// Client of the wallet server API.
pub struct WalletServerClient<C> {
    tokens: TokenService<C>,
    config: ClientConfig,
}

impl<C: HttpClient> WalletServerClient<C> {
    /// Creates a client which sends its requests through `client`.
    pub fn new(config: ClientConfig, client: C) -> Self {
        Self {
            tokens: TokenService::new(client, config.token_url().clone()),
            config,
        }
    }

    /// The settings of this client.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Creates a model or an instance.
    pub async fn create(
        &self,
        category: PassCategory,
        resource: PassResource,
        body: &Value,
    ) -> Result<Value> {
        let url = self.endpoint(category, resource, &[])?;
        self.request(Method::POST, url, Some(body)).await
    }

    /// Fetches the model or instance with the given ID.
    pub async fn get(
        &self,
        category: PassCategory,
        resource: PassResource,
        id: &str,
    ) -> Result<Value> {
        let url = self.endpoint(category, resource, &[id])?;
        self.request(Method::GET, url, None).await
    }

    /// Replaces the model or instance with the given ID.
    pub async fn update(
        &self,
        category: PassCategory,
        resource: PassResource,
        id: &str,
        body: &Value,
    ) -> Result<Value> {
        let url = self.endpoint(category, resource, &[id])?;
        self.request(Method::PUT, url, Some(body)).await
    }

    /// Updates the fields present in `body` of the model or instance with
    /// the given ID.
    pub async fn patch(
        &self,
        category: PassCategory,
        resource: PassResource,
        id: &str,
        body: &Value,
    ) -> Result<Value> {
        let url = self.endpoint(category, resource, &[id])?;
        self.request(Method::PATCH, url, Some(body)).await
    }

    /// Adds messages to the model or instance with the given ID.
    pub async fn add_message(
        &self,
        category: PassCategory,
        resource: PassResource,
        id: &str,
        messages: &Value,
    ) -> Result<Value> {
        let url = self.endpoint(category, resource, &[id, "addMessage"])?;
        self.request(Method::POST, url, Some(messages)).await
    }

    /// Lists the models of a category, page by page.
    ///
    /// Without `page_size` the server picks the page size and only the first
    /// page is returned. Otherwise pages are fetched lazily, following the
    /// `nextSession` cursor, until a page is empty or has no cursor.
    pub fn list_models(
        &self,
        category: PassCategory,
        page_size: Option<u32>,
    ) -> impl Stream<Item = Result<Page>> + '_ {
        let url = self
            .endpoint(category, PassResource::Model, &[])
            .map(|url| with_query(url, &[], page_size));
        self.pages(url, page_size.is_some())
    }

    /// Lists the instances of a model, page by page.
    ///
    /// See [`WalletServerClient::list_models`] for the paging behavior.
    pub fn list_instances(
        &self,
        category: PassCategory,
        model_id: &str,
        page_size: Option<u32>,
    ) -> impl Stream<Item = Result<Page>> + '_ {
        let url = self
            .endpoint(category, PassResource::Instance, &[])
            .map(|url| with_query(url, &[("modelId", model_id)], page_size));
        self.pages(url, page_size.is_some())
    }

    /// Mints a token carrying `payload` and returns the link which saves the
    /// pass on `host`.
    ///
    /// When `payload` is an object, its `iss` is set to the application ID,
    /// replacing any value already present.
    pub fn mint_save_url(
        &self,
        host: &WalletHost,
        issuer_private_key_pem: &[u8],
        payload: &Value,
    ) -> Result<Url> {
        let payload = self.token_payload(payload)?;

        let token =
            walletpass_jwe::mint(issuer_private_key_pem, &payload).with_err(|| ClientError::Jwe)?;

        save_url(host, &token)
    }

    fn token_payload(&self, payload: &Value) -> Result<String> {
        let mut payload = payload.clone();
        if let Some(object) = payload.as_object_mut() {
            object.insert("iss".to_owned(), Value::String(self.config.app_id().to_owned()));
        }

        serde_json::to_string(&payload).foreign_err(|| {
            ClientError::Request("unable to serialize the token payload".to_owned())
        })
    }

    fn endpoint(
        &self,
        category: PassCategory,
        resource: PassResource,
        tail: &[&str],
    ) -> Result<Url> {
        let mut path = format!("/v1/{category}/{resource}");
        for segment in tail {
            if segment.is_empty() {
                return Err(bherror::Error::root(ClientError::Request(format!(
                    "empty path segment below `{path}`"
                ))));
            }
            path.push('/');
            path.push_str(&urlencoding::encode(segment));
        }

        self.config
            .wallet_server_base_url()
            .clone()
            .add_path_suffix(&path)
            .with_err(|| ClientError::Config(format!("unable to append `{path}` to the base URL")))
    }

    async fn request(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        let token = self
            .tokens
            .fetch_token(self.config.app_id(), self.config.app_secret())
            .await?;

        let mut request = reqwest::Request::new(method, url);
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.access_token))
            .foreign_err(|| {
                ClientError::Token("access token is not a valid header value".to_owned())
            })?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).foreign_err(|| {
                ClientError::Request("unable to serialize the request body".to_owned())
            })?;
            *request.body_mut() = Some(bytes.into());
        }

        let response = send(self.tokens.client(), request).await?;
        if response.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response)
            .foreign_err(|| ClientError::Response("response body is not JSON".to_owned()))
    }

    async fn fetch_page(&self, url: Url) -> Result<Page> {
        let value = self.request(Method::GET, url, None).await?;
        if value.is_null() {
            return Ok(Page::default());
        }

        serde_json::from_value(value)
            .foreign_err(|| ClientError::Response("malformed list response".to_owned()))
    }

    fn pages(&self, url: Result<Url>, paged: bool) -> impl Stream<Item = Result<Page>> + '_ {
        stream::try_unfold(Cursor::First(url), move |cursor| self.next_page(cursor, paged))
    }

    async fn next_page(&self, cursor: Cursor, paged: bool) -> Result<Option<(Page, Cursor)>> {
        let (url, base) = match cursor {
            Cursor::Done => return Ok(None),
            Cursor::First(url) => {
                let url = url?;
                (url.clone(), url)
            }
            Cursor::Next(base, session) => {
                let mut url = base.clone();
                url.query_pairs_mut().append_pair("session", &session);
                (url, base)
            }
        };

        let page = self.fetch_page(url).await.ctx(|| "listing passes")?;
        if page.data.is_empty() {
            return Ok(None);
        }

        let next = match page.page_info.next_session.as_deref().map(str::trim) {
            Some(session) if paged && !session.is_empty() => Cursor::Next(base, session.to_owned()),
            _ => Cursor::Done,
        };

        tracing::debug!(items = page.data.len(), "fetched page");

        Ok(Some((page, next)))
    }
}

fn with_query(mut url: Url, params: &[(&str, &str)], page_size: Option<u32>) -> Url {
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            query.append_pair(key, value);
        }
        if let Some(page_size) = page_size {
            query.append_pair("pageSize", &page_size.to_string());
        }
    }
    // `query_pairs_mut` leaves an empty `?` behind when nothing was appended.
    if url.query() == Some("") {
        url.set_query(None);
    }
    url
}
