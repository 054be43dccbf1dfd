//! Picking values out of loosely-shaped JSON, where the same field
//! lives in different places depending on the service version.

use serde_json::Value;

/// First of the JSON pointers that leads to a non-empty string.
pub fn first_str<'a>(value: &'a Value, pointers: &[&str]) -> Option<&'a str> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
}

/// Like [`first_str`], also accepting numbers (ids are sometimes one, sometimes the other).
pub fn first_string_or_number(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::{first_str, first_string_or_number};
    use serde_json::json;

    #[test]
    fn falls_back_in_order() {
        let value = json!({
            "user": {"name": ""},
            "owner": {"user": {"name": "kotaru", "id": 1234}},
        });
        assert_eq!(
            first_str(&value, &["/user/name", "/owner/user/name"]),
            Some("kotaru")
        );
        assert_eq!(first_str(&value, &["/missing"]), None);
        assert_eq!(
            first_string_or_number(&value, &["/user/id", "/owner/user/id"]).as_deref(),
            Some("1234")
        );
        assert_eq!(
            first_string_or_number(&value, &["/owner/user"]).as_deref(),
            None
        );
    }
}
