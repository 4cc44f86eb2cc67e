//! `{token}` template resolution against feature properties.

use crate::style::{FeatureProperties, PropertyValue};

/// Replace every `{key}` in `template` with the feature's value for
/// `key`, or the empty string if the feature has no such property.
pub fn resolve_tokens(properties: &FeatureProperties, template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        rest = &rest[start + 1..];
        match rest.find('}') {
            Some(end) => {
                let key = &rest[..end];
                if let Some(value) = properties.get(key) {
                    match value {
                        PropertyValue::String(s) => out.push_str(s),
                        PropertyValue::Number(n) => out.push_str(&n.to_string()),
                        PropertyValue::Bool(b) => out.push_str(&b.to_string()),
                    }
                }
                rest = &rest[end + 1..];
            }
            None => {
                out.push('{');
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn replaces_tokens() {
        let mut properties: FeatureProperties = HashMap::new();
        properties.insert(
            "name".to_string(),
            PropertyValue::String("Berlin".to_string()),
        );
        properties.insert("ref".to_string(), PropertyValue::Number(100.0));

        assert_eq!(resolve_tokens(&properties, "{name}"), "Berlin");
        assert_eq!(resolve_tokens(&properties, "{name} ({ref})"), "Berlin (100)");
        assert_eq!(resolve_tokens(&properties, "{missing}!"), "!");
        assert_eq!(resolve_tokens(&properties, "plain"), "plain");
    }
}
