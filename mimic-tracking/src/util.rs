use serde_json::Value;

/// Looks up a nested key like `"a.b.c"`, split by `sep`.
///
/// Returns `None` as soon as a component is missing or the current value is not an
/// object.
pub fn get_nested<'a>(value: &'a Value, key: &str, sep: &str) -> Option<&'a Value> {
    key.split(sep)
        .try_fold(value, |curr, k| curr.as_object().and_then(|m| m.get(k)))
}
