//! Property-based tests for attribute key normalization.

use anvil_resources::{normalize_key, Attributes};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// Strategy for a list of lowercase words of at least two letters.
fn words_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{2,8}", 1..5)
}

fn snake(words: &[String]) -> String {
    words.join("_")
}

fn camel(words: &[String]) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            if i == 0 {
                w.clone()
            } else {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn camel_and_snake_keys_normalize_alike(words in words_strategy()) {
        prop_assert_eq!(normalize_key(&camel(&words)), snake(&words));
        prop_assert_eq!(normalize_key(&snake(&words)), snake(&words));
    }

    #[test]
    fn normalization_is_idempotent(key in "[a-zA-Z][a-zA-Z_]{0,20}") {
        let once = normalize_key(&key);
        prop_assert_eq!(normalize_key(&once), once.clone());
    }

    #[test]
    fn lookup_works_with_either_casing(words in words_strategy(), value in any::<i64>()) {
        let mut map = Map::new();
        map.insert(camel(&words), json!(value));
        let attrs = Attributes::from_map(map);

        prop_assert_eq!(attrs.get_i64(&camel(&words)), Some(value));
        prop_assert_eq!(attrs.get_i64(&snake(&words)), Some(value));
    }

    #[test]
    fn nested_keys_are_normalized(outer in words_strategy(), inner in words_strategy()) {
        let mut inner_map = Map::new();
        inner_map.insert(camel(&inner), Value::Bool(true));
        let mut map = Map::new();
        map.insert(camel(&outer), Value::Array(vec![Value::Object(inner_map)]));
        let attrs = Attributes::from_map(map);

        let nested = attrs.get_array(&snake(&outer)).unwrap();
        prop_assert_eq!(nested[0].get(snake(&inner)), Some(&Value::Bool(true)));
    }
}
