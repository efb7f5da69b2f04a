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

//! Configuration of the client.
//!
//! [`ConfigFile`] reads the flat `KEY = VALUE` properties file shipped with
//! the service credentials, and [`ClientConfig`] is the typed subset of it
//! that [`WalletServerClient`](crate::WalletServerClient) needs.
//!
//! The file grammar is one entry per line:
//!
//! ```text
//! # comment
//! gw.tokenUrl = https://oauth-login.example.com/oauth2/v3/token
//! gw.appid = '1234567'             # quoted values are unquoted
//! walletServerBaseUrl = "https://passentrust.example.com/hmspass"
//! ```
//!
//! A trailing `# comment` is stripped unless it contains a quote character.
//! Lines which are not entries are ignored.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::SystemTime,
};

use bherror::{traits::ForeignError as _, Error};
use regex::Regex;
use reqwest::Url;

use crate::{ClientError, Result};

/// Key of the OAuth token endpoint URL.
pub const TOKEN_URL_KEY: &str = "gw.tokenUrl";
/// Key of the application (client) ID.
pub const APP_ID_KEY: &str = "gw.appid";
/// Key of the application (client) secret.
pub const APP_SECRET_KEY: &str = "gw.appid.secret";
/// Key of the wallet server base URL, e.g. `https://host/hmspass`.
pub const WALLET_SERVER_BASE_URL_KEY: &str = "walletServerBaseUrl";

lazy_static::lazy_static! {
    static ref ITEM_PATTERN: Regex = Regex::new(r#"^\s*([^#=]+)\s*=\s*(.*?)(\s*#[^'"]+)?$"#)
        .expect("entry pattern must be valid");
}

/// Parses the contents of a properties file into its entries.
///
/// Later entries override earlier ones with the same key.
pub fn parse_entries(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .filter_map(|line| {
            let captures = ITEM_PATTERN.captures(line.trim())?;
            let key = captures[1].trim().to_owned();
            let value = captures[2]
                .trim()
                .trim_matches(|c| matches!(c, '\'' | '"' | ' ' | '\t'))
                .to_owned();
            Some((key, value))
        })
        .collect()
}

#[derive(Debug, Default)]
struct Snapshot {
    modified: Option<SystemTime>,
    entries: HashMap<String, String>,
}

/// A properties file loaded into memory.
///
/// The file is read once on [`ConfigFile::open`] and again only on an
/// explicit [`ConfigFile::reload`]. Its modification time is recorded on every
/// load but changes are not watched.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl ConfigFile {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] is returned if the file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = Self::load(&path)?;

        tracing::debug!(
            path = %path.display(),
            entries = snapshot.entries.len(),
            "loaded configuration file"
        );

        Ok(Self {
            path,
            snapshot: RwLock::new(snapshot),
        })
    }

    fn load(path: &Path) -> Result<Snapshot> {
        let contents = std::fs::read_to_string(path).foreign_err(|| {
            ClientError::Config(format!("unable to read `{}`", path.display()))
        })?;
        let modified = std::fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .ok();

        Ok(Snapshot {
            modified,
            entries: parse_entries(&contents),
        })
    }

    /// Reads the file again, replacing all entries.
    ///
    /// On error the previously loaded entries are kept.
    pub fn reload(&self) -> Result<()> {
        let snapshot = Self::load(&self.path)?;
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
        Ok(())
    }

    /// Returns the value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read(|snapshot| snapshot.entries.get(key).cloned())
    }

    /// Returns the value of `key`, or `default` if it is not present.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }

    /// Returns all keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.read(|snapshot| snapshot.entries.keys().cloned().collect())
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the file at the last load, if the platform
    /// reports one.
    pub fn modified(&self) -> Option<SystemTime> {
        self.read(|snapshot| snapshot.modified)
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        f(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Settings of a [`WalletServerClient`](crate::WalletServerClient).
#[derive(Clone)]
pub struct ClientConfig {
    token_url: Url,
    app_id: String,
    app_secret: String,
    wallet_server_base_url: Url,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token_url", &self.token_url.as_str())
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("wallet_server_base_url", &self.wallet_server_base_url.as_str())
            .finish()
    }
}

impl ClientConfig {
    /// Creates a new [`ClientConfig`].
    pub fn new(
        token_url: Url,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        wallet_server_base_url: Url,
    ) -> Self {
        Self {
            token_url,
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            wallet_server_base_url,
        }
    }

    /// Builds the settings from the [`TOKEN_URL_KEY`], [`APP_ID_KEY`],
    /// [`APP_SECRET_KEY`] and [`WALLET_SERVER_BASE_URL_KEY`] entries.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] is returned if an entry is missing or empty,
    /// or a URL does not parse.
    pub fn from_config_file(file: &ConfigFile) -> Result<Self> {
        Ok(Self {
            token_url: required_url(file, TOKEN_URL_KEY)?,
            app_id: required(file, APP_ID_KEY)?,
            app_secret: required(file, APP_SECRET_KEY)?,
            wallet_server_base_url: required_url(file, WALLET_SERVER_BASE_URL_KEY)?,
        })
    }

    /// URL of the OAuth token endpoint.
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// The application ID, used as OAuth client ID and as token issuer.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The application secret, used as OAuth client secret.
    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }

    /// Base URL of the wallet server API.
    pub fn wallet_server_base_url(&self) -> &Url {
        &self.wallet_server_base_url
    }
}

fn required(file: &ConfigFile, key: &str) -> Result<String> {
    match file.get(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::root(ClientError::Config(format!(
            "`{key}` is missing in `{}`",
            file.path().display()
        )))),
    }
}

fn required_url(file: &ConfigFile, key: &str) -> Result<Url> {
    let value = required(file, key)?;
    Url::parse(&value).foreign_err(|| ClientError::Config(format!("`{key}` is not a valid URL")))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use assert_matches::assert_matches;
    use tempfile::NamedTempFile;

    use super::*;

    const PROPERTIES: &str = r#"
# Credentials of the app
gw.tokenUrl = https://oauth-login.example.com/oauth2/v3/token
gw.appid = '1234567'             # quoted values are unquoted
gw.appid.secret = "s3cr3t#value"
walletServerBaseUrl=https://passentrust.example.com/hmspass   # base URL
not an entry
"#;

    fn config_file(contents: &str) -> (NamedTempFile, ConfigFile) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = ConfigFile::open(file.path()).unwrap();
        (file, config)
    }

    #[test]
    fn test_parse_entries() {
        let entries = parse_entries(PROPERTIES);

        assert_eq!(entries.len(), 4);
        assert_eq!(
            entries[TOKEN_URL_KEY],
            "https://oauth-login.example.com/oauth2/v3/token"
        );
        assert_eq!(entries[APP_ID_KEY], "1234567");
        assert_eq!(entries[APP_SECRET_KEY], "s3cr3t#value");
        assert_eq!(
            entries[WALLET_SERVER_BASE_URL_KEY],
            "https://passentrust.example.com/hmspass"
        );
    }

    #[test]
    fn test_parse_entries_skips_comments_and_garbage() {
        let entries = parse_entries("# a = b\n\n   \njust text\n=value\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_parse_entries_keeps_last_duplicate() {
        let entries = parse_entries("key = first\nkey = second\n");
        assert_eq!(entries["key"], "second");
    }

    #[test]
    fn test_parse_entries_empty_value() {
        let entries = parse_entries("key =\n");
        assert_eq!(entries["key"], "");
    }

    #[test]
    fn test_config_file_accessors() {
        let (file, config) = config_file(PROPERTIES);

        assert_eq!(config.path(), file.path());
        assert_eq!(config.get(APP_ID_KEY).as_deref(), Some("1234567"));
        assert_eq!(config.get("missing"), None);
        assert_eq!(config.get_or("missing", "fallback"), "fallback");
        assert_eq!(config.get_or(APP_ID_KEY, "fallback"), "1234567");
        assert!(config.modified().is_some());

        let mut keys = config.keys();
        keys.sort();
        assert_eq!(
            keys,
            [APP_ID_KEY, APP_SECRET_KEY, TOKEN_URL_KEY, WALLET_SERVER_BASE_URL_KEY]
        );
    }

    #[test]
    fn test_config_file_reload() {
        let (file, config) = config_file("key = first\n");

        std::fs::write(file.path(), "key = second\nother = value\n").unwrap();
        config.reload().unwrap();

        assert_eq!(config.get("key").as_deref(), Some("second"));
        assert_eq!(config.get("other").as_deref(), Some("value"));
    }

    #[test]
    fn test_config_file_missing() {
        let dir = tempfile::tempdir().unwrap();

        let err = ConfigFile::open(dir.path().join("release.config.properties")).unwrap_err();
        assert_matches!(err.error, ClientError::Config(_));
    }

    #[test]
    fn test_client_config_from_file() {
        let (_file, config) = config_file(PROPERTIES);

        let client_config = ClientConfig::from_config_file(&config).unwrap();

        assert_eq!(
            client_config.token_url().as_str(),
            "https://oauth-login.example.com/oauth2/v3/token"
        );
        assert_eq!(client_config.app_id(), "1234567");
        assert_eq!(client_config.app_secret(), "s3cr3t#value");
        assert_eq!(
            client_config.wallet_server_base_url().as_str(),
            "https://passentrust.example.com/hmspass"
        );
    }

    #[test]
    fn test_client_config_missing_key() {
        let (_file, config) = config_file("gw.tokenUrl = https://example.com/token\ngw.appid =\n");

        let err = ClientConfig::from_config_file(&config).unwrap_err();
        assert_matches!(err.error, ClientError::Config(message) if message.contains(APP_ID_KEY));
    }

    #[test]
    fn test_client_config_invalid_url() {
        let (_file, config) = config_file(
            "gw.tokenUrl = not a url\ngw.appid = 1\ngw.appid.secret = 2\nwalletServerBaseUrl = https://example.com\n",
        );

        let err = ClientConfig::from_config_file(&config).unwrap_err();
        assert_matches!(err.error, ClientError::Config(message) if message.contains(TOKEN_URL_KEY));
    }

    #[test]
    fn test_client_config_debug_redacts_secret() {
        let config = ClientConfig::new(
            Url::parse("https://example.com/token").unwrap(),
            "1234567",
            "s3cr3t",
            Url::parse("https://example.com/hmspass").unwrap(),
        );

        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("1234567"));
    }
}
