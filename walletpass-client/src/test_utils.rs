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

//! Stub transport shared by the unit tests.

use std::{collections::VecDeque, sync::Mutex};

use reqwest::{header::HeaderMap, Method, Url};
use serde_json::Value;

use crate::HttpClient;

pub(crate) const ACCESS_TOKEN: &str = "CgB6e3x9NUbDCJ2gsLgWDmrxAhrS";

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Vec<u8>>,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|value| value.to_str().unwrap())
    }

    pub(crate) fn body_str(&self) -> &str {
        std::str::from_utf8(self.body.as_deref().unwrap_or_default()).unwrap()
    }

    pub(crate) fn json(&self) -> Value {
        serde_json::from_str(self.body_str()).unwrap()
    }
}

/// Replays canned responses in order and records every request.
pub(crate) struct StubClient {
    responses: Mutex<VecDeque<http::Response<String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubClient {
    pub(crate) fn new(responses: impl IntoIterator<Item = http::Response<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn json(status: u16, body: &str) -> http::Response<String> {
        http::Response::builder()
            .status(status)
            .header("Content-type", "application/json")
            .body(body.to_owned())
            .unwrap()
    }

    pub(crate) fn token() -> http::Response<String> {
        Self::json(
            200,
            &format!(
                r#"{{"access_token":"{ACCESS_TOKEN}","expires_in":3600,"token_type":"Bearer"}}"#
            ),
        )
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl HttpClient for StubClient {
    type Err = reqwest::Error;

    async fn execute(&self, request: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let recorded = RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request
                .body()
                .and_then(|body| body.as_bytes())
                .map(<[u8]>::to_vec),
        };

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("Unexpected request: {} {}", recorded.method, recorded.url));
        self.requests.lock().unwrap().push(recorded);

        Ok(reqwest::Response::from(response))
    }
}
