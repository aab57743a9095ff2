//! Field-level change detection for audit detail.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Field name.
    pub field: String,
    /// Value before the mutation (`null` if absent).
    pub before: Value,
    /// Value after the mutation (`null` if absent).
    pub after: Value,
}

/// Compares the top-level fields of two JSON objects.
///
/// Non-object inputs are treated as empty objects. Changes are returned in
/// key order.
#[must_use]
pub fn diff_fields(before: &Value, after: &Value) -> Vec<FieldChange> {
    let empty = Map::new();
    let before = before.as_object().unwrap_or(&empty);
    let after = after.as_object().unwrap_or(&empty);

    let mut keys: Vec<&String> = before.keys().chain(after.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let old = before.get(key).cloned().unwrap_or(Value::Null);
            let new = after.get(key).cloned().unwrap_or(Value::Null);
            (old != new).then(|| FieldChange {
                field: key.clone(),
                before: old,
                after: new,
            })
        })
        .collect()
}

/// Wraps a change list as audit detail: `{"changes": [...]}`.
#[must_use]
pub fn changes_detail(changes: &[FieldChange]) -> Value {
    serde_json::json!({ "changes": changes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diff_reports_changed_added_and_removed() {
        let before = json!({"name": "Chequing", "detail_type": "Checking", "note": "x"});
        let after = json!({"name": "Main Chequing", "detail_type": "Checking", "is_active": false});

        let changes = diff_fields(&before, &after);

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].field, "is_active");
        assert_eq!(changes[0].before, Value::Null);
        assert_eq!(changes[1].field, "name");
        assert_eq!(changes[1].after, json!("Main Chequing"));
        assert_eq!(changes[2].field, "note");
        assert_eq!(changes[2].after, Value::Null);
    }

    #[test]
    fn test_identical_objects_have_no_changes() {
        let value = json!({"status": "sent"});
        assert!(diff_fields(&value, &value).is_empty());
    }

    #[test]
    fn test_changes_detail_shape() {
        let detail = changes_detail(&diff_fields(&json!({"a": 1}), &json!({"a": 2})));
        assert_eq!(detail["changes"][0]["field"], "a");
        assert_eq!(detail["changes"][0]["before"], 1);
        assert_eq!(detail["changes"][0]["after"], 2);
    }
}
