//! Country code extraction from GeoIP response bodies

use serde_json::Value;

/// Key holding the country in `cdn-cgi/trace` style bodies
const TRACE_KEY: &str = "loc";

/// Pulls a single country-code-like value out of a response
pub struct ResponseExtractor;

impl ResponseExtractor {
    /// Walk a dotted path such as `location.country.code` through nested objects.
    ///
    /// Returns `None` when a segment is missing, an intermediate value is not an
    /// object, or the leaf is null or empty.
    pub fn extract_path(value: &Value, path: &str) -> Option<String> {
        let mut current = value;
        for key in path.split('.') {
            current = current.as_object()?.get(key)?;
        }

        match current {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().to_string()),
            Value::Array(_) | Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Parse newline-delimited `key=value` text and return the `loc` entry
    pub fn extract_trace(text: &str) -> Option<String> {
        Self::trace_value(text, TRACE_KEY)
    }

    /// Look up `key` in newline-delimited `key=value` text
    pub fn trace_value(text: &str, key: &str) -> Option<String> {
        text.lines()
            .filter_map(|line| line.split_once('='))
            .find(|(k, _)| k.trim() == key)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Extract from a raw body, choosing JSON or trace parsing.
    ///
    /// A JSON body that fails to decode yields `None`, as does a trace body paired
    /// with a path.
    pub fn extract(body: &str, is_json: bool, path: Option<&str>) -> Option<String> {
        match (is_json, path) {
            (true, Some(path)) => {
                let value: Value = serde_json::from_str(body).ok()?;
                Self::extract_path(&value, path)
            }
            (_, None) => Self::extract_trace(body),
            (false, Some(_)) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_flat_key() {
        let body = json!({"countryCode": "US", "query": "1.2.3.4"});
        assert_eq!(
            ResponseExtractor::extract_path(&body, "countryCode"),
            Some("US".to_string())
        );
    }

    #[test]
    fn test_extract_nested_key() {
        let body = json!({"location": {"country": {"code": "DE", "name": "Germany"}}});
        assert_eq!(
            ResponseExtractor::extract_path(&body, "location.country.code"),
            Some("DE".to_string())
        );
    }

    #[test]
    fn test_missing_segment_is_not_found() {
        let body = json!({"location": {"region": {"code": "BY"}}});
        assert_eq!(ResponseExtractor::extract_path(&body, "location.country.code"), None);
        assert_eq!(ResponseExtractor::extract_path(&body, "nope"), None);
    }

    #[test]
    fn test_non_object_intermediate_is_not_found() {
        let body = json!({"location": "DE"});
        assert_eq!(ResponseExtractor::extract_path(&body, "location.country"), None);

        let body = json!({"location": [{"country": "DE"}]});
        assert_eq!(ResponseExtractor::extract_path(&body, "location.country"), None);

        let body = json!("US");
        assert_eq!(ResponseExtractor::extract_path(&body, "country"), None);
    }

    #[test]
    fn test_null_and_empty_leaves_are_not_found() {
        let body = json!({"country": null, "country_code": ""});
        assert_eq!(ResponseExtractor::extract_path(&body, "country"), None);
        assert_eq!(ResponseExtractor::extract_path(&body, "country_code"), None);
    }

    #[test]
    fn test_scalar_leaf_is_stringified() {
        let body = json!({"asn": 13335});
        assert_eq!(
            ResponseExtractor::extract_path(&body, "asn"),
            Some("13335".to_string())
        );
    }

    #[test]
    fn test_extract_trace() {
        let text = "fl=123abc\nh=www.cloudflare.com\nip=1.2.3.4\nloc=NL\ntls=TLSv1.3\n";
        assert_eq!(ResponseExtractor::extract_trace(text), Some("NL".to_string()));
        assert_eq!(
            ResponseExtractor::trace_value(text, "ip"),
            Some("1.2.3.4".to_string())
        );
    }

    #[test]
    fn test_extract_trace_without_loc() {
        assert_eq!(ResponseExtractor::extract_trace("ip=1.2.3.4\ngarbage\n"), None);
        assert_eq!(ResponseExtractor::extract_trace(""), None);
        assert_eq!(ResponseExtractor::extract_trace("loc=\n"), None);
    }

    #[test]
    fn test_extract_dispatch() {
        assert_eq!(
            ResponseExtractor::extract(r#"{"country":"FR"}"#, true, Some("country")),
            Some("FR".to_string())
        );
        assert_eq!(
            ResponseExtractor::extract("loc=FR", false, None),
            Some("FR".to_string())
        );
        assert_eq!(ResponseExtractor::extract("not json", true, Some("country")), None);
        assert_eq!(ResponseExtractor::extract("<html>", false, Some("country")), None);
    }
}
