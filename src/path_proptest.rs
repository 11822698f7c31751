//! Property-based tests for path confinement and label merging.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::error::Error;
    use crate::path::normalize_relative;
    use crate::resolver::merge_labels;
    use proptest::prelude::*;
    use std::collections::BTreeMap;
    use std::path::{Component, Path};

    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("..".to_string()),
            Just(".".to_string()),
            "[a-z0-9_-]{1,8}",
        ]
    }

    fn relative_path() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..8).prop_map(|parts| parts.join("/"))
    }

    fn labels() -> impl Strategy<Value = BTreeMap<String, String>> {
        prop::collection::btree_map("[a-d]", "[a-z]{1,4}", 0..4)
    }

    // ============================================================================
    // normalize_relative property tests
    // ============================================================================

    proptest! {
        /// Property: a normalized path never contains `..` or a root
        #[test]
        fn normalized_path_is_plain(input in relative_path()) {
            if let Ok(normalized) = normalize_relative(&input, Path::new("/repo")) {
                for component in normalized.components() {
                    prop_assert!(
                        matches!(component, Component::Normal(_)),
                        "unexpected component {:?} in {:?} from {:?}",
                        component,
                        normalized,
                        input
                    );
                }
            }
        }

        /// Property: rejection happens exactly when some prefix climbs above the root
        #[test]
        fn escape_detected_iff_depth_goes_negative(input in relative_path()) {
            let mut depth: i32 = 0;
            let mut escaped = false;
            for part in input.split('/') {
                match part {
                    ".." => {
                        depth -= 1;
                        if depth < 0 {
                            escaped = true;
                            break;
                        }
                    }
                    "." => {}
                    _ => depth += 1,
                }
            }

            let result = normalize_relative(&input, Path::new("/repo"));
            if escaped {
                let is_escape = matches!(result, Err(Error::PathEscape { .. }));
                prop_assert!(is_escape);
            } else {
                prop_assert!(result.is_ok());
            }
        }

        /// Property: absolute paths are always rejected
        #[test]
        fn absolute_paths_rejected(input in relative_path()) {
            let absolute = format!("/{}", input);
            let is_escape = matches!(
                normalize_relative(&absolute, Path::new("/repo")),
                Err(Error::PathEscape { .. })
            );
            prop_assert!(is_escape);
        }
    }

    // ============================================================================
    // merge_labels property tests
    // ============================================================================

    proptest! {
        /// Property: every key of every layer is present in the merge
        #[test]
        fn merge_is_union_of_keys(a in labels(), b in labels(), c in labels(), d in labels()) {
            let merged = merge_labels([&a, &b, &c, &d]);
            for layer in [&a, &b, &c, &d] {
                for key in layer.keys() {
                    prop_assert!(merged.contains_key(key));
                }
            }
            let total: std::collections::BTreeSet<_> =
                a.keys().chain(b.keys()).chain(c.keys()).chain(d.keys()).collect();
            prop_assert_eq!(merged.len(), total.len());
        }

        /// Property: the last layer defining a key wins
        #[test]
        fn last_layer_wins(a in labels(), b in labels(), c in labels(), d in labels()) {
            let merged = merge_labels([&a, &b, &c, &d]);
            let newest_first = [&d, &c, &b, &a];
            for (key, value) in &merged {
                let expected = newest_first
                    .iter()
                    .find_map(|layer| layer.get(key))
                    .unwrap();
                prop_assert_eq!(value, expected);
            }
        }
    }
}
