//! Recursive merge of option maps.

use crate::options::{OptionMap, OptionValue};

/// Merge `incoming` on top of `base`.
///
/// Where both sides hold a `Map` under the same key the maps are merged
/// recursively; any other incoming value replaces what was there. Keys that
/// `incoming` does not mention are left alone. `incoming` is only borrowed.
pub fn deep_merge(mut base: OptionMap, incoming: &OptionMap) -> OptionMap {
    for (key, value) in incoming {
        let merged = match (base.remove(key), value) {
            (Some(OptionValue::Map(existing)), OptionValue::Map(overlay)) => {
                OptionValue::Map(deep_merge(existing, overlay))
            }
            _ => value.clone(),
        };
        base.insert(key.clone(), merged);
    }
    base
}

/// Fold any number of overlays left to right. An empty slice yields an empty
/// map.
pub fn deep_merge_all(maps: &[OptionMap]) -> OptionMap {
    match maps.split_first() {
        None => OptionMap::new(),
        Some((first, rest)) => rest
            .iter()
            .fold(first.clone(), |acc, overlay| deep_merge(acc, overlay)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionKey;

    fn key(name: &str) -> OptionKey {
        OptionKey::from(name)
    }

    fn map<const N: usize>(entries: [(&str, OptionValue); N]) -> OptionMap {
        entries.into_iter().map(|(k, v)| (key(k), v)).collect()
    }

    #[test]
    fn nested_leaf_is_overwritten_and_siblings_kept() {
        let base = map([("a", map([("x", 1.into()), ("y", 2.into())]).into())]);
        let incoming = map([("a", map([("y", 9.into())]).into())]);

        let merged = deep_merge(base, &incoming);

        assert_eq!(merged, map([("a", map([("x", 1.into()), ("y", 9.into())]).into())]));
    }

    #[test]
    fn scalar_replaces_map_and_map_replaces_scalar() {
        let base = map([("a", map([("x", 1.into())]).into()), ("b", true.into())]);
        let incoming = map([("a", "flat".into()), ("b", map([("z", 3.into())]).into())]);

        let merged = deep_merge(base, &incoming);

        assert_eq!(merged[&key("a")], OptionValue::from("flat"));
        assert_eq!(merged[&key("b")], OptionValue::Map(map([("z", 3.into())])));
    }

    #[test]
    fn untouched_keys_survive() {
        let base = map([("keep", 1.into()), ("change", 2.into())]);
        let merged = deep_merge(base, &map([("change", 5.into())]));
        assert_eq!(merged, map([("keep", 1.into()), ("change", 5.into())]));
    }

    #[test]
    fn disjoint_merge_is_idempotent() {
        let base = map([("a", 1.into())]);
        let incoming = map([("b", 2.into())]);
        let once = deep_merge(base, &incoming);
        let twice = deep_merge(once.clone(), &incoming);
        assert_eq!(once, twice);
    }

    #[test]
    fn sibling_order_does_not_matter() {
        let base = map([("a", map([("x", 1.into())]).into())]);
        let left = deep_merge(
            base.clone(),
            &map([("a", map([("y", 2.into())]).into()), ("b", 3.into())]),
        );
        let right = deep_merge(
            deep_merge(base, &map([("b", 3.into())])),
            &map([("a", map([("y", 2.into())]).into())]),
        );
        assert_eq!(left, right);
    }

    #[test]
    fn incoming_is_not_mutated() {
        let incoming = map([("a", map([("y", 9.into())]).into())]);
        let snapshot = incoming.clone();
        let _ = deep_merge(map([("a", map([("x", 1.into())]).into())]), &incoming);
        assert_eq!(incoming, snapshot);
    }

    #[test]
    fn merge_all_folds_left_to_right() {
        assert!(deep_merge_all(&[]).is_empty());

        let only = map([("a", 1.into())]);
        assert_eq!(deep_merge_all(std::slice::from_ref(&only)), only);

        let merged = deep_merge_all(&[
            map([("a", 1.into())]),
            map([("a", 2.into()), ("b", 1.into())]),
            map([("a", 3.into())]),
        ]);
        assert_eq!(merged, map([("a", 3.into()), ("b", 1.into())]));
    }
}
