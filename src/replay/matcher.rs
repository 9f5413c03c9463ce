//! Request matching with tolerance for fields that legitimately vary
//! between recording and replay.
//!
//! Rules are applied in a fixed order and the first difference wins:
//!
//! 1. `method`, exact.
//! 2. `url`, after [`MatchRules::canonical_url`].
//! 3. `headers`, case-insensitive names, volatile headers ignored.
//! 4. `bodySegments`, count first, then structural JSON equality.

use std::collections::{BTreeMap, BTreeSet};

use reqwest::Url;
use serde_json::Value;

use super::format::ReplayRequest;

const ABSENT: &str = "<absent>";
const CANONICAL_BASE: &str = "http://replay.invalid/";

/// Headers carrying credentials. Their values are redacted on disk, so
/// they are never compared, whatever the volatile set says.
pub const CREDENTIAL_HEADERS: &[&str] = &["authorization", "x-goog-api-key", "proxy-authorization"];

/// Headers that differ between runs and are never compared.
pub const DEFAULT_VOLATILE_HEADERS: &[&str] = &[
    "authorization",
    "x-goog-api-key",
    "proxy-authorization",
    "x-goog-api-client",
    "x-goog-user-project",
    "user-agent",
    "date",
    "x-request-id",
    "x-goog-request-id",
    "content-length",
];

/// Query parameters that carry credentials or run-specific values.
pub const DEFAULT_VOLATILE_QUERY_PARAMS: &[&str] = &["key"];

/// Tolerance configuration for the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRules {
    /// Lowercase header names ignored on both sides.
    pub volatile_headers: BTreeSet<String>,
    /// Query parameters dropped before comparing URLs.
    pub volatile_query_params: BTreeSet<String>,
    /// Drop a leading API version segment (`v1`, `v1beta`, ...).
    pub strip_api_version: bool,
    /// Drop a leading `projects/<p>/locations/<l>` resource prefix.
    pub strip_resource_prefix: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            volatile_headers: DEFAULT_VOLATILE_HEADERS.iter().map(ToString::to_string).collect(),
            volatile_query_params: DEFAULT_VOLATILE_QUERY_PARAMS
                .iter()
                .map(ToString::to_string)
                .collect(),
            strip_api_version: true,
            strip_resource_prefix: true,
        }
    }
}

impl MatchRules {
    /// Rules that compare everything verbatim except credential headers.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            volatile_headers: BTreeSet::new(),
            volatile_query_params: BTreeSet::new(),
            strip_api_version: false,
            strip_resource_prefix: false,
        }
    }

    /// Adds a header to the volatile set.
    #[must_use]
    pub fn with_volatile_header(mut self, name: &str) -> Self {
        self.volatile_headers.insert(name.to_ascii_lowercase());
        self
    }

    /// Host- and version-independent form of `url`.
    ///
    /// Absolute and path-only URLs canonicalize identically, so a recording
    /// stored in canonical form still matches the live URL the client builds.
    #[must_use]
    pub fn canonical_url(&self, url: &str) -> String {
        let Ok(base) = Url::parse(CANONICAL_BASE) else {
            return url.to_string();
        };
        let Ok(parsed) = Url::options().base_url(Some(&base)).parse(url) else {
            return url.to_string();
        };

        let mut segments: Vec<&str> =
            parsed.path_segments().map(|s| s.filter(|seg| !seg.is_empty()).collect()).unwrap_or_default();

        if self.strip_api_version && segments.first().is_some_and(|s| is_api_version(s)) {
            segments.remove(0);
        }
        if self.strip_resource_prefix
            && segments.len() >= 4
            && segments[0] == "projects"
            && segments[2] == "locations"
        {
            segments.drain(..4);
        }

        let mut pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(k, _)| !self.volatile_query_params.contains(&**k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.sort();

        let mut out = format!("/{}", segments.join("/"));
        if !pairs.is_empty() {
            let mut query = base;
            query.query_pairs_mut().extend_pairs(&pairs);
            out.push('?');
            out.push_str(query.query().unwrap_or_default());
        }
        out
    }

    /// Whether `name` is a credential header, redacted before recording.
    #[must_use]
    pub fn is_credential_header(name: &str) -> bool {
        CREDENTIAL_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h))
    }

    fn comparable_headers(&self, headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .filter(|(k, _)| !self.volatile_headers.contains(k) && !Self::is_credential_header(k))
            .collect()
    }
}

/// `v1`, `v1beta`, `v1alpha`, `v1beta1`, `v2`, ...
fn is_api_version(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix('v') else {
        return false;
    };
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let suffix = &rest[digits..];
    let channel = suffix.trim_end_matches(|c: char| c.is_ascii_digit());
    matches!(channel, "" | "alpha" | "beta")
}

/// First difference between a recorded and an actual request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Path of the differing field.
    pub field: String,
    /// Recorded value.
    pub expected: String,
    /// Value seen during replay.
    pub actual: String,
}

impl Mismatch {
    fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self { field: field.into(), expected: expected.into(), actual: actual.into() }
    }
}

/// Compares requests under a set of [`MatchRules`].
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    rules: MatchRules,
}

impl Matcher {
    /// A matcher using `rules`.
    #[must_use]
    pub fn new(rules: MatchRules) -> Self {
        Self { rules }
    }

    /// The rules in effect.
    #[must_use]
    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// Checks `actual` against `recorded`.
    ///
    /// # Errors
    ///
    /// Returns the first [`Mismatch`] found.
    pub fn check(&self, actual: &ReplayRequest, recorded: &ReplayRequest) -> Result<(), Mismatch> {
        if actual.method != recorded.method {
            return Err(Mismatch::new("method", &recorded.method, &actual.method));
        }

        let expected_url = self.rules.canonical_url(&recorded.url);
        let actual_url = self.rules.canonical_url(&actual.url);
        if expected_url != actual_url {
            return Err(Mismatch::new("url", expected_url, actual_url));
        }

        let expected_headers = self.rules.comparable_headers(&recorded.headers);
        let actual_headers = self.rules.comparable_headers(&actual.headers);
        let names: BTreeSet<&String> = expected_headers.keys().chain(actual_headers.keys()).collect();
        for name in names {
            let expected = expected_headers.get(name);
            let got = actual_headers.get(name);
            if expected != got {
                return Err(Mismatch::new(
                    format!("headers.{name}"),
                    expected.map_or(ABSENT, String::as_str),
                    got.map_or(ABSENT, String::as_str),
                ));
            }
        }

        if recorded.body_segments.len() != actual.body_segments.len() {
            return Err(Mismatch::new(
                "bodySegments.length",
                recorded.body_segments.len().to_string(),
                actual.body_segments.len().to_string(),
            ));
        }
        for (index, (expected, got)) in
            recorded.body_segments.iter().zip(&actual.body_segments).enumerate()
        {
            if let Some(mismatch) = json_difference(format!("bodySegments[{index}]"), expected, got) {
                return Err(mismatch);
            }
        }
        Ok(())
    }
}

/// Finds the first structural difference between two JSON values.
///
/// Object key order is irrelevant; numbers compare by value, so `1` and
/// `1.0` are equal.
#[must_use]
pub fn json_difference(path: String, expected: &Value, actual: &Value) -> Option<Mismatch> {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => {
            let keys: BTreeSet<&String> = e.keys().chain(a.keys()).collect();
            keys.into_iter().find_map(|key| {
                let child = format!("{path}.{key}");
                match (e.get(key), a.get(key)) {
                    (Some(ev), Some(av)) => json_difference(child, ev, av),
                    (Some(ev), None) => Some(Mismatch::new(child, ev.to_string(), ABSENT)),
                    (None, Some(av)) => Some(Mismatch::new(child, ABSENT, av.to_string())),
                    (None, None) => None,
                }
            })
        }
        (Value::Array(e), Value::Array(a)) => {
            let element = e
                .iter()
                .zip(a)
                .enumerate()
                .find_map(|(i, (ev, av))| json_difference(format!("{path}[{i}]"), ev, av));
            element.or_else(|| {
                (e.len() != a.len()).then(|| {
                    Mismatch::new(format!("{path}.length"), e.len().to_string(), a.len().to_string())
                })
            })
        }
        (Value::Number(e), Value::Number(a)) => {
            let equal = match (e.as_i64(), a.as_i64(), e.as_u64(), a.as_u64()) {
                (Some(x), Some(y), _, _) => x == y,
                (_, _, Some(x), Some(y)) => x == y,
                _ => e.as_f64() == a.as_f64(),
            };
            (!equal).then(|| Mismatch::new(path, e.to_string(), a.to_string()))
        }
        _ => (expected != actual).then(|| Mismatch::new(path, expected.to_string(), actual.to_string())),
    }
}
