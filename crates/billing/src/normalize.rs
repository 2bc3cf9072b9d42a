//! Webhook payload normalization
//!
//! Freemius payload shapes vary across event types and webhook versions, so
//! every field is extracted through an explicit, ordered fallback list of
//! probe paths. Keeping the lists as data (rather than ad hoc chained access)
//! makes the fallback order testable independent of the transport layer.

use serde_json::Value;

/// Probe order for the canonical event name, checked at the payload root.
const EVENT_NAME_FIELDS: [&str; 4] = ["event", "action", "type", "topic"];

const USER_EMAIL_PATHS: &[&[&str]] = &[&["user", "email"], &["customer", "email"], &["email"]];
const USER_ID_PATHS: &[&[&str]] = &[&["user", "id"], &["user_id"]];
const LICENSE_ID_PATHS: &[&[&str]] = &[&["license", "id"], &["license_id"]];
const SUBSCRIPTION_ID_PATHS: &[&[&str]] = &[&["subscription", "id"], &["subscription_id"]];
const PLAN_ID_PATHS: &[&[&str]] = &[
    &["plan", "id"],
    &["subscription", "plan_id"],
    &["license", "plan_id"],
    &["plan_id"],
];

/// Stable identifiers extracted from a webhook payload.
///
/// Freemius does not populate these consistently; any of them may be absent
/// for a given event type. Numeric ids are coerced to strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifiers {
    pub user_email: Option<String>,
    pub user_id: Option<String>,
    pub license_id: Option<String>,
    pub subscription_id: Option<String>,
    /// Empty string when absent; never matches a plan table entry.
    pub plan_id: String,
}

/// A webhook payload reduced to its canonical event name and identifiers.
#[derive(Debug, Clone)]
pub struct NormalizedEvent {
    pub event_name: String,
    pub identifiers: Identifiers,
}

/// Normalize a loosely-structured provider payload. Never fails: absent
/// fields resolve to `None` and an unrecognizable event name to `"unknown"`.
pub fn normalize(payload: &Value) -> NormalizedEvent {
    let event_name = EVENT_NAME_FIELDS
        .iter()
        .find_map(|&field| string_at(payload, &[field]))
        .unwrap_or_else(|| "unknown".to_string());

    let identifiers = Identifiers {
        user_email: probe(payload, USER_EMAIL_PATHS),
        user_id: probe(payload, USER_ID_PATHS),
        license_id: probe(payload, LICENSE_ID_PATHS),
        subscription_id: probe(payload, SUBSCRIPTION_ID_PATHS),
        plan_id: probe(payload, PLAN_ID_PATHS).unwrap_or_default(),
    };

    NormalizedEvent {
        event_name,
        identifiers,
    }
}

/// Walk a path of object keys, returning the value at the end if every
/// segment exists.
fn walk<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(payload, |value, segment| value.get(segment))
}

/// First non-empty string (or string-coerced number) found along the probe
/// paths, in order.
pub(crate) fn probe(payload: &Value, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| string_at(payload, path))
}

pub(crate) fn string_at(payload: &Value, path: &[&str]) -> Option<String> {
    match walk(payload, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // Providers sometimes send numeric ids; coerce to string
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
