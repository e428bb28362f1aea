//! Reading and writing `serde_json::Value` trees by [`FieldPath`].

use serde_json::{Map, Value};
use tracing::warn;

use super::{FieldPath, Segment, MAX_INDEX};

/// Look up the value at `path`.
///
/// Returns `None` as soon as a key is absent, a node has the wrong shape, or
/// an index is out of bounds. A present JSON `null` is returned as found.
pub fn get<'a>(model: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(model, |node, segment| match segment {
            Segment::Key(key) => node.as_object()?.get(key),
            Segment::Index(index) => node.as_array()?.get(*index),
        })
}

/// Return a copy of `model` with `value` written at `path`.
///
/// The input is left untouched. See [`set_in_place`] for how missing
/// intermediate nodes are created.
pub fn set(model: &Value, path: &FieldPath, value: Value) -> Value {
    let mut out = model.clone();
    set_in_place(&mut out, path, value);
    out
}

/// Write `value` at `path` inside `model`, creating whatever is missing.
///
/// A key segment turns a non-object node into an empty object. An index
/// segment turns a non-array node into an array and pads it with empty
/// objects up to and including the index.
///
/// Indexes above [`MAX_INDEX`] are never written. Parsed paths cannot hold
/// one; a hand-built path that does is dropped with a warning.
pub fn set_in_place(model: &mut Value, path: &FieldPath, value: Value) {
    let too_large = path
        .segments()
        .iter()
        .any(|segment| matches!(segment, Segment::Index(index) if *index > MAX_INDEX));
    if too_large {
        warn!(path = %path, max = MAX_INDEX, "index out of range, write dropped");
        return;
    }

    let mut node = model;
    for segment in path.segments() {
        node = match segment {
            Segment::Key(key) => {
                if !node.is_object() {
                    *node = Value::Object(Map::new());
                }
                &mut node[key.as_str()]
            }
            Segment::Index(index) => {
                if !node.is_array() {
                    *node = Value::Array(Vec::new());
                }
                if let Value::Array(items) = node {
                    if items.len() <= *index {
                        items.resize_with(index + 1, || Value::Object(Map::new()));
                    }
                }
                &mut node[*index]
            }
        };
    }
    *node = value;
}

/// Every leaf address in `value`, objects walked in key order.
///
/// Scalars, `null`, and empty containers are leaves. The root itself is
/// never reported.
pub fn leaf_paths(value: &Value) -> Vec<FieldPath> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    walk(value, &mut prefix, &mut out);
    out
}

fn walk(value: &Value, prefix: &mut Vec<Segment>, out: &mut Vec<FieldPath>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                prefix.push(Segment::Key(key.clone()));
                walk(child, prefix, out);
                prefix.pop();
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                prefix.push(Segment::Index(index));
                walk(child, prefix, out);
                prefix.pop();
            }
        }
        _ => {
            if let Some(path) = FieldPath::from_segments(prefix.clone()) {
                out.push(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn p(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn test_get_found_and_missing() {
        let model = json!({
            "customer": {"name": "Acme", "phone": null},
            "items": [{"sku": "X1"}]
        });

        assert_eq!(get(&model, &p("customer.name")), Some(&json!("Acme")));
        assert_eq!(get(&model, &p("customer.phone")), Some(&Value::Null));
        assert_eq!(get(&model, &p("items[0].sku")), Some(&json!("X1")));
        assert_eq!(get(&model, &p("customer.email")), None);
        assert_eq!(get(&model, &p("items[1].sku")), None);
        // wrong shapes are simply not found
        assert_eq!(get(&model, &p("customer[0]")), None);
        assert_eq!(get(&model, &p("items.sku")), None);
        assert_eq!(get(&model, &p("customer.name.first")), None);
    }

    #[test]
    fn test_set_round_trip() {
        let model = json!({"customer": {"name": "Old"}, "notes": "keep"});
        for (path, value) in [
            ("customer.name", json!("Acme")),
            ("customer.address.city", json!("Pune")),
            ("items[1].qty", json!(4)),
            ("notes", json!(null)),
        ] {
            let path = p(path);
            let updated = set(&model, &path, value.clone());
            assert_eq!(get(&updated, &path), Some(&value));
        }
    }

    #[test]
    fn test_set_does_not_mutate_input() {
        let model = json!({"customer": {"name": "Old"}, "items": [{"sku": "A"}]});
        let before = model.clone();

        let updated = set(&model, &p("items[0].sku"), json!("B"));

        assert_eq!(model, before);
        assert_eq!(updated["items"][0]["sku"], json!("B"));
        assert_eq!(updated["customer"], before["customer"]);
    }

    #[test]
    fn test_set_extends_arrays_with_placeholders() {
        let updated = set(&json!({}), &p("items[2].sku"), json!("X"));

        assert_eq!(get(&updated, &p("items[2].sku")), Some(&json!("X")));
        assert_eq!(get(&updated, &p("items[0].sku")), None);
        assert_eq!(updated, json!({"items": [{}, {}, {"sku": "X"}]}));
    }

    #[test]
    fn test_set_huge_index_leaves_model_alone() {
        let model = json!({"items": [{"sku": "X1"}]});
        let path = FieldPath::root("items").index(usize::MAX);
        assert_eq!(set(&model, &path, json!(1)), model);

        let path = FieldPath::root("extra").index(MAX_INDEX + 1).key("sku");
        assert_eq!(set(&model, &path, json!("Y")), model);
    }

    #[test]
    fn test_set_at_max_index() {
        let model = set(&json!({}), &p("items[9999]"), json!(1));
        let items = model["items"].as_array().unwrap();
        assert_eq!(items.len(), MAX_INDEX + 1);
        assert_eq!(items[MAX_INDEX], json!(1));
        assert_eq!(items[0], json!({}));
    }

    #[test]
    fn test_set_replaces_wrong_shapes() {
        let model = json!({"customer": "Acme", "items": {"0": "x"}});

        let updated = set(&model, &p("customer.name"), json!("Acme"));
        assert_eq!(updated["customer"], json!({"name": "Acme"}));

        let updated = set(&model, &p("items[0]"), json!("y"));
        assert_eq!(updated["items"], json!(["y"]));
    }

    #[test]
    fn test_set_on_scalar_root() {
        let updated = set(&json!(null), &p("a.b"), json!(1));
        assert_eq!(updated, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_leaf_paths() {
        let candidate = json!({
            "customer": {"name": "Acme"},
            "items": [{"qty": 2, "sku": "X1"}],
            "notes": null,
            "tags": []
        });

        let paths: Vec<String> = leaf_paths(&candidate).iter().map(|p| p.to_string()).collect();
        assert_eq!(
            paths,
            vec!["customer.name", "items[0].qty", "items[0].sku", "notes", "tags"]
        );
        assert!(leaf_paths(&json!("scalar")).is_empty());
    }
}
