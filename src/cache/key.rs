use crate::encode::crypto::canonical_json;
use serde::Serialize;
use std::fmt::Debug;

pub const MAX_KEY_LEN: usize = 255;

/// Cache key for a call of `func_name` with `args`.
///
/// Layout is `prefix:func_name:args` (or `func_name:args` with an empty
/// prefix) where `args` is compact JSON with sorted keys. Arguments that do
/// not serialize fall back to their `Debug` form. Keys are cut to
/// [`MAX_KEY_LEN`] bytes, so very long argument lists can collide.
pub fn make_cache_key<A: Serialize + Debug + ?Sized>(func_name: &str, prefix: &str, args: &A) -> String {
    let payload = canonical_json(args).unwrap_or_else(|_| format!("{:?}", args));

    let mut key = if prefix.is_empty() {
        format!("{}:{}", func_name, payload)
    } else {
        format!("{}:{}:{}", prefix, func_name, payload)
    };
    truncate_on_char_boundary(&mut key, MAX_KEY_LEN);
    key
}

fn truncate_on_char_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_key_layout() {
        assert_eq!(make_cache_key("lookup", "", &(1, "a")), r#"lookup:[1,"a"]"#);
        assert_eq!(
            make_cache_key("lookup", "user", &json!({"id": 7})),
            r#"user:lookup:{"id":7}"#
        );
    }

    #[test]
    fn test_key_ignores_map_order() {
        let mut a = HashMap::new();
        a.insert("x", 1);
        a.insert("y", 2);
        let b = json!({"y": 2, "x": 1});
        assert_eq!(make_cache_key("f", "p", &a), make_cache_key("f", "p", &b));
    }

    #[test]
    fn test_non_serializable_args_fall_back_to_debug() {
        // maps with non-string keys cannot become JSON objects
        let mut args = HashMap::new();
        args.insert((1, 2), "v");
        let key = make_cache_key("f", "", &args);
        assert_eq!(key, format!("f:{:?}", args));
    }

    #[test]
    fn test_key_is_truncated_on_char_boundary() {
        let long = "é".repeat(300);
        let key = make_cache_key("f", "", &long);
        assert!(key.len() <= MAX_KEY_LEN);
        assert!(key.len() >= MAX_KEY_LEN - 1);
        assert!(key.starts_with("f:\"é"));
    }
}
