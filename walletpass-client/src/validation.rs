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

//! Local checks of pass models and instances before they are sent to the
//! wallet server.
//!
//! Models and instances are handled as plain JSON values; only the fields the
//! server rejects most often are checked.

use bherror::{traits::ForeignError as _, Error};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{ClientError, Result};

const MAX_IDENTIFIER_LEN: usize = 64;

const MODEL_REQUIRED: [&str; 4] = [
    "passTypeIdentifier",
    "passStyleIdentifier",
    "organizationName",
    "passVersion",
];

const INSTANCE_REQUIRED: [&str; 4] = [
    "passTypeIdentifier",
    "passStyleIdentifier",
    "organizationPassId",
    "serialNumber",
];

const STATES: [&str; 4] = ["active", "inactive", "completed", "expired"];

fn invalid(message: impl Into<String>) -> Error<ClientError> {
    Error::root(ClientError::Validation(message.into()))
}

fn check_required(object: &Value, names: &[&str]) -> Result<()> {
    if !object.is_object() {
        return Err(invalid("pass must be a JSON object"));
    }

    for name in names {
        let Some(value) = object.get(*name).and_then(Value::as_str) else {
            return Err(invalid(format!("`{name}` is missing")));
        };
        if value.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(invalid(format!(
                "`{name}` exceeds {MAX_IDENTIFIER_LEN} characters"
            )));
        }
    }
    Ok(())
}

/// Checks that a pass model carries its identifying fields.
///
/// # Errors
///
/// [`ClientError::Validation`] names the first offending field.
pub fn validate_model(model: &Value) -> Result<()> {
    check_required(model, &MODEL_REQUIRED)
}

/// Checks that a pass instance carries its identifying fields and a
/// consistent `fields.status`.
///
/// # Errors
///
/// [`ClientError::Validation`] names the first offending field.
pub fn validate_instance(instance: &Value) -> Result<()> {
    validate_instance_at(instance, Utc::now())
}

/// Same as [`validate_instance`], with `now` as the current time.
pub fn validate_instance_at(instance: &Value, now: DateTime<Utc>) -> Result<()> {
    check_required(instance, &INSTANCE_REQUIRED)?;

    match instance.pointer("/fields/status") {
        Some(status) if status.is_object() => validate_status(status, now),
        _ => Ok(()),
    }
}

// Missing, null and empty values are all treated as absent.
fn non_empty<'a>(status: &'a Value, name: &str) -> Result<Option<&'a str>> {
    match status.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) if value.is_empty() => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(invalid(format!("`{name}` must be a string"))),
    }
}

fn parse_time(value: &str, name: &str) -> Result<DateTime<Utc>> {
    let time = DateTime::parse_from_rfc3339(value)
        .foreign_err(|| ClientError::Validation(format!("`{name}` is not an RFC 3339 time")))?;
    Ok(time.with_timezone(&Utc))
}

fn validate_status(status: &Value, now: DateTime<Utc>) -> Result<()> {
    if let Some(state) = non_empty(status, "state")? {
        let state = state.to_lowercase();
        if !STATES.contains(&state.as_str()) {
            return Err(invalid(format!("`state` is invalid: {state}")));
        }
    }

    let (effect_time, expire_time) = match (
        non_empty(status, "effectTime")?,
        non_empty(status, "expireTime")?,
    ) {
        (None, None) => return Ok(()),
        (Some(effect_time), Some(expire_time)) => (
            parse_time(effect_time, "effectTime")?,
            parse_time(expire_time, "expireTime")?,
        ),
        _ => {
            return Err(invalid(
                "`effectTime` and `expireTime` must be both present or both absent",
            ))
        }
    };

    if expire_time < now || expire_time < effect_time {
        return Err(invalid(
            "`expireTime` must be later than `effectTime` and the current time",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn model() -> Value {
        json!({
            "passVersion": "2.0",
            "passTypeIdentifier": "hwpass.com.huawei.wallet.giftcard",
            "passStyleIdentifier": "GiftCardModel001",
            "organizationName": "Huawei",
            "fields": {}
        })
    }

    fn instance(status: Value) -> Value {
        json!({
            "organizationPassId": "GiftCardPass10001",
            "passTypeIdentifier": "hwpass.com.huawei.wallet.giftcard",
            "passStyleIdentifier": "GiftCardModel001",
            "serialNumber": "GiftCardPass10001",
            "fields": { "status": status }
        })
    }

    fn validation_message(result: Result<()>) -> String {
        match result.unwrap_err().error {
            ClientError::Validation(message) => message,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_model() {
        validate_model(&model()).unwrap();
    }

    #[test]
    fn test_validate_model_missing_field() {
        for name in MODEL_REQUIRED {
            let mut model = model();
            model.as_object_mut().unwrap().remove(name);

            let message = validation_message(validate_model(&model));
            assert!(message.contains(name), "{message}");
        }
    }

    #[test]
    fn test_validate_model_non_string_field() {
        let mut model = model();
        model["passVersion"] = json!(2);

        let message = validation_message(validate_model(&model));
        assert!(message.contains("passVersion"));
    }

    #[test]
    fn test_validate_model_too_long() {
        let mut model = model();
        model["passStyleIdentifier"] = json!("x".repeat(65));
        assert_matches!(
            validate_model(&model).unwrap_err().error,
            ClientError::Validation(_)
        );

        model["passStyleIdentifier"] = json!("x".repeat(64));
        validate_model(&model).unwrap();
    }

    #[test]
    fn test_validate_model_not_an_object() {
        assert_matches!(
            validate_model(&json!(["model"])).unwrap_err().error,
            ClientError::Validation(_)
        );
    }

    #[test]
    fn test_validate_instance() {
        let status = json!({
            "state": "ACTIVE",
            "effectTime": "2024-05-01T00:00:00.000Z",
            "expireTime": "2024-12-31T23:59:59+08:00"
        });

        validate_instance_at(&instance(status), now()).unwrap();
    }

    #[test]
    fn test_validate_instance_without_status() {
        let mut instance = instance(Value::Null);
        validate_instance_at(&instance, now()).unwrap();

        instance.as_object_mut().unwrap().remove("fields");
        validate_instance_at(&instance, now()).unwrap();
    }

    #[test]
    fn test_validate_instance_missing_field() {
        let mut instance = instance(json!({}));
        instance.as_object_mut().unwrap().remove("serialNumber");

        let message = validation_message(validate_instance_at(&instance, now()));
        assert!(message.contains("serialNumber"));
    }

    #[test]
    fn test_validate_instance_invalid_state() {
        let message = validation_message(validate_instance_at(
            &instance(json!({ "state": "deleted" })),
            now(),
        ));
        assert!(message.contains("state"));
    }

    #[test]
    fn test_validate_instance_expired_state_is_allowed() {
        validate_instance_at(&instance(json!({ "state": "Expired" })), now()).unwrap();
    }

    #[test]
    fn test_validate_instance_only_one_time() {
        for status in [
            json!({ "effectTime": "2024-05-01T00:00:00Z" }),
            json!({ "expireTime": "2024-12-01T00:00:00Z", "effectTime": "" }),
        ] {
            let message = validation_message(validate_instance_at(&instance(status), now()));
            assert!(message.contains("both"), "{message}");
        }
    }

    #[test]
    fn test_validate_instance_invalid_time() {
        let status = json!({
            "effectTime": "2024-05-01",
            "expireTime": "2024-12-01T00:00:00Z"
        });

        let message = validation_message(validate_instance_at(&instance(status), now()));
        assert!(message.contains("effectTime"));
    }

    #[test]
    fn test_validate_instance_expired() {
        let status = json!({
            "effectTime": "2024-01-01T00:00:00Z",
            "expireTime": "2024-05-31T23:59:59Z"
        });

        let message = validation_message(validate_instance_at(&instance(status), now()));
        assert!(message.contains("expireTime"));
    }

    #[test]
    fn test_validate_instance_expires_before_effect() {
        let status = json!({
            "effectTime": "2025-01-01T00:00:00Z",
            "expireTime": "2024-12-01T00:00:00Z"
        });

        let message = validation_message(validate_instance_at(&instance(status), now()));
        assert!(message.contains("expireTime"));
    }

    #[test]
    fn test_validate_instance_uses_current_time() {
        let status = json!({
            "effectTime": "2000-01-01T00:00:00Z",
            "expireTime": "2001-01-01T00:00:00Z"
        });

        assert_matches!(
            validate_instance(&instance(status)).unwrap_err().error,
            ClientError::Validation(_)
        );
    }
}
