//! # Request Module
//!
//! Plain request descriptions produced by the task templates, plus the two
//! small URL helpers the suite needs:
//!
//! - [`create_url_path`] - join a path and ordered query parameters
//! - [`next_page_url`] - pull the `next` link out of a FHIR `Bundle`
//!
//! Nothing in here talks to the network; [`crate::attack`] turns a
//! [`RequestSpec`] into a goose request.

use serde_json::Value;
use url::form_urlencoded;

/// One GET request a task wants to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// Path relative to the target host, e.g. `/v2/fhir/Patient`
    pub path: String,
    /// Query parameters, encoded in insertion order
    pub params: Vec<(&'static str, String)>,
    /// Extra request headers
    pub headers: Vec<(&'static str, &'static str)>,
    /// Whether the response is a paged `Bundle` whose `next` link should be
    /// requested on the task's following iterations.
    pub follow_pages: bool,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
            headers: Vec::new(),
            follow_pages: false,
        }
    }

    pub fn param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.params.push((name, value.into()));
        self
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn follow_pages(mut self) -> Self {
        self.follow_pages = true;
        self
    }

    /// Path plus encoded query string.
    pub fn url(&self) -> String {
        create_url_path(&self.path, &self.params)
    }
}

/// Build `path?query` from ordered parameters.
///
/// Parameters are form-urlencoded, so `|` becomes `%7C` and `:` becomes
/// `%3A`. An empty parameter list returns `path` unchanged.
pub fn create_url_path<K, V>(path: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return path.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish();
    format!("{path}?{query}")
}

/// URL of the `next` page link of a FHIR `Bundle`, if any.
pub fn next_page_url(bundle: &Value) -> Option<String> {
    bundle
        .get("link")?
        .as_array()?
        .iter()
        .find(|link| link.get("relation").and_then(Value::as_str) == Some("next"))
        .and_then(|link| link.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
