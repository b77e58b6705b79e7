//! Routes: a method plus a path template that resolves to a URL and a bucket key.

use crate::errors::{InstatusError, InstatusResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;
use std::fmt;

/// Characters left untouched when a text parameter is substituted.
/// Unreserved characters and `/` pass through, everything else is escaped.
const PATH_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Value substituted into a path placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathParam {
    /// Text, percent-encoded on substitution.
    Text(String),
    /// Integer, formatted verbatim.
    Integer(i64),
}

impl fmt::Display for PathParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", utf8_percent_encode(text, PATH_PARAM)),
            Self::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for PathParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PathParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for PathParam {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for PathParam {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PathParam {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for PathParam {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

/// A logical API operation.
///
/// The bucket key is the unsubstituted template, so `v1/{page_id}/incidents`
/// is one bucket whatever page it is called for.
#[derive(Debug, Clone)]
pub struct Route {
    method: Method,
    path: String,
    absolute: bool,
    params: Vec<(String, PathParam)>,
}

impl Route {
    /// Creates a route relative to the API base URL.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            absolute: false,
            params: Vec::new(),
        }
    }

    /// Creates a route for a fully qualified URL.
    ///
    /// The URL is used as-is for both the request and the bucket key.
    pub fn absolute(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            path: url.into(),
            absolute: true,
            params: Vec::new(),
        }
    }

    /// Adds a placeholder value.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<PathParam>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Gets the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Gets the unsubstituted path template (or absolute URL).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Gets the rate-limit bucket key.
    pub fn bucket(&self) -> &str {
        &self.path
    }

    /// Returns true for routes built from a fully qualified URL.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Resolves the route into an absolute URL against `base_url`.
    pub fn url(&self, base_url: &str) -> InstatusResult<String> {
        if self.absolute {
            return Ok(self.path.clone());
        }
        let path = self.substitute()?;
        Ok(format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    fn lookup(&self, name: &str) -> Option<&PathParam> {
        self.params
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    fn substitute(&self) -> InstatusResult<String> {
        let mut out = String::with_capacity(self.path.len() + 32);
        let mut chars = self.path.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => {
                                return Err(InstatusError::client(format!(
                                    "Unterminated placeholder in route {}",
                                    self.path
                                )))
                            }
                        }
                    }
                    let value = self.lookup(&name).ok_or_else(|| {
                        InstatusError::client(format!(
                            "Missing value for '{}' in route {}",
                            name, self.path
                        ))
                    })?;
                    out.push_str(&value.to_string());
                }
                c => out.push(c),
            }
        }

        Ok(out)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::InstatusErrorKind;

    const BASE: &str = "https://api.instatus.com/";

    #[test]
    fn test_resolves_template() {
        let route = Route::new(Method::GET, "v1/{page_id}/incidents/{incident_id}")
            .param("page_id", "ck8a")
            .param("incident_id", "inc-1");

        assert_eq!(
            route.url(BASE).unwrap(),
            "https://api.instatus.com/v1/ck8a/incidents/inc-1"
        );
        assert_eq!(route.bucket(), "v1/{page_id}/incidents/{incident_id}");
    }

    #[test]
    fn test_same_template_same_bucket() {
        let a = Route::new(Method::GET, "v1/{page_id}/components").param("page_id", "one");
        let b = Route::new(Method::GET, "v1/{page_id}/components").param("page_id", "two");

        assert_eq!(a.bucket(), b.bucket());
        assert_ne!(a.url(BASE).unwrap(), b.url(BASE).unwrap());
    }

    #[test]
    fn test_text_params_are_percent_encoded() {
        let route = Route::new(Method::GET, "v1/{page_id}/metrics/{metric_id}")
            .param("page_id", "a b/c?")
            .param("metric_id", 42);

        assert_eq!(
            route.url("http://localhost:8080").unwrap(),
            "http://localhost:8080/v1/a%20b/c%3F/metrics/42"
        );
    }

    #[test]
    fn test_unicode_params_are_utf8_encoded() {
        let route = Route::new(Method::GET, "v1/{page_id}").param("page_id", "é");
        assert_eq!(route.url(BASE).unwrap(), "https://api.instatus.com/v1/%C3%A9");
    }

    #[test]
    fn test_missing_param_is_client_error() {
        let route = Route::new(Method::DELETE, "v1/{page_id}/team/{team_member_id}")
            .param("page_id", "p");

        let error = route.url(BASE).unwrap_err();
        assert_eq!(error.kind(), InstatusErrorKind::Client);
        assert!(error.message().contains("team_member_id"));
    }

    #[test]
    fn test_unterminated_placeholder() {
        let route = Route::new(Method::GET, "v1/{page_id");
        assert_eq!(route.url(BASE).unwrap_err().kind(), InstatusErrorKind::Client);
    }

    #[test]
    fn test_escaped_braces() {
        let route = Route::new(Method::GET, "v1/{{literal}}");
        assert_eq!(route.url(BASE).unwrap(), "https://api.instatus.com/v1/{literal}");
    }

    #[test]
    fn test_absolute_route() {
        let url = "https://acme.instatus.com/summary.json";
        let route = Route::absolute(Method::GET, url).param("ignored", "x");

        assert!(route.is_absolute());
        assert_eq!(route.url(BASE).unwrap(), url);
        assert_eq!(route.bucket(), url);
    }
}
