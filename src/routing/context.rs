//! Per-request context handed to handlers.

use std::collections::HashMap;

use axum::http::{Extensions, HeaderMap};
use serde_json::{Map, Value};

/// Parameters captured from parametric path segments, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(pub HashMap<String, String>);

/// Action name of the matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAction(pub String);

/// Request as seen by the dispatcher.
///
/// The transport fills `method`, `path` and `headers`; handlers communicate
/// through the attribute bag (`state`), typed `extensions`, and the response
/// fields `status`/`body`.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    /// Attribute bag. The dispatcher writes the action name and captured
    /// parameters here under the keys from `RouterSettings`.
    pub state: Map<String, Value>,
    pub extensions: Extensions,
    pub status: Option<u16>,
    pub body: Option<Value>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.insert(key.into(), value.into());
    }

    /// Captured parameter `name` of the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.extensions
            .get::<RouteParams>()
            .and_then(|params| params.0.get(name))
            .map(String::as_str)
    }

    /// Action name of the matched route, if it is named.
    pub fn action(&self) -> Option<&str> {
        self.extensions
            .get::<RouteAction>()
            .map(|action| action.0.as_str())
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Mutable JSON object body, creating an empty object when the body is
    /// unset or not an object.
    pub fn body_object(&mut self) -> &mut Map<String, Value> {
        if !matches!(self.body, Some(Value::Object(_))) {
            self.body = Some(Value::Object(Map::new()));
        }
        match self.body {
            Some(Value::Object(ref mut map)) => map,
            _ => unreachable!("body was just set to an object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_bag() {
        let mut ctx = RequestContext::new("GET", "/");
        assert!(ctx.get("user").is_none());
        ctx.set("user", "alice");
        assert_eq!(ctx.get("user"), Some(&json!("alice")));
    }

    #[test]
    fn test_body_object() {
        let mut ctx = RequestContext::new("GET", "/");
        ctx.body_object().insert("done".into(), json!(true));
        ctx.body_object().insert("more".into(), json!(1));
        assert_eq!(ctx.body, Some(json!({"done": true, "more": 1})));

        ctx.body = Some(json!("text"));
        ctx.body_object();
        assert_eq!(ctx.body, Some(json!({})));
    }

    #[test]
    fn test_typed_route_data() {
        let mut ctx = RequestContext::new("GET", "/items/42");
        let mut params = HashMap::new();
        params.insert("id".to_string(), "42".to_string());
        ctx.extensions.insert(RouteParams(params));
        ctx.extensions.insert(RouteAction("items.read".into()));
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.param("missing"), None);
        assert_eq!(ctx.action(), Some("items.read"));
    }
}
