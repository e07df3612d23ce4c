//! Property-based tests for descriptor parsing and variable resolution.
//!
//! These tests use proptest to generate random descriptors and verify that
//! parser and resolver invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::descriptor::{parse_list, Descriptor};
    use crate::error::Error;
    use crate::resolve::{resolve, ResolveMode};
    use proptest::prelude::*;

    /// Keys that never collide with the separator, comment or placeholder
    /// markers
    fn key() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,7}"
    }

    /// Placeholder-free values with no surrounding whitespace
    fn plain_value() -> impl Strategy<Value = String> {
        "[A-Za-z0-9./_;-]([A-Za-z0-9 ./_;-]{0,14}[A-Za-z0-9./_;-])?"
    }

    fn render(entries: &[(String, String)]) -> String {
        entries
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Distinct keys in first-seen order, each with its last value
    fn expected(entries: &[(String, String)]) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::new();
        for (k, v) in entries {
            match out.iter_mut().find(|(existing, _)| existing == k) {
                Some(entry) => entry.1 = v.clone(),
                None => out.push((k.clone(), v.clone())),
            }
        }
        out
    }

    // ============================================================================
    // Parsing properties
    // ============================================================================

    proptest! {
        /// Property: rendered `key: value` lines parse back to the same
        /// mapping, later duplicates overwriting earlier ones in place
        #[test]
        fn parse_preserves_rendered_entries(
            entries in prop::collection::vec((key(), plain_value()), 0..12)
        ) {
            let descriptor = Descriptor::parse(&render(&entries)).unwrap();
            let parsed: Vec<(String, String)> = descriptor
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            prop_assert_eq!(parsed, expected(&entries));
        }

        /// Property: comments and blank lines never change the mapping
        #[test]
        fn comments_and_blank_lines_are_ignored(
            entries in prop::collection::vec((key(), plain_value()), 1..8),
            comment in "[A-Za-z0-9 :%]{0,20}"
        ) {
            let plain = Descriptor::parse(&render(&entries)).unwrap();
            let noisy_text = entries
                .iter()
                .map(|(k, v)| format!("\n# {}\n  {} : {} #{}", comment, k, v, comment))
                .collect::<String>();
            let noisy = Descriptor::parse(&noisy_text).unwrap();
            prop_assert_eq!(plain, noisy);
        }

        /// Property: list tokens are trimmed and never empty
        #[test]
        fn list_tokens_are_trimmed_and_non_empty(value in "[a-z ;]{0,30}") {
            for token in parse_list(&value) {
                prop_assert!(!token.is_empty());
                prop_assert_eq!(token.trim(), token.as_str());
                prop_assert!(!token.contains(';'));
            }
        }
    }

    // ============================================================================
    // Resolution properties
    // ============================================================================

    proptest! {
        /// Property: a placeholder-free descriptor resolves in zero passes
        /// and is left untouched
        #[test]
        fn resolve_without_placeholders_is_identity(
            entries in prop::collection::vec((key(), plain_value()), 0..12)
        ) {
            let mut descriptor = Descriptor::parse(&render(&entries)).unwrap();
            let before = descriptor.clone();
            let resolution = resolve(&mut descriptor, ResolveMode::Strict).unwrap();
            prop_assert_eq!(resolution.passes, 0);
            prop_assert_eq!(descriptor, before);
        }

        /// Property: resolving an already resolved descriptor changes nothing
        #[test]
        fn resolve_is_idempotent(depth in 1usize..10, reversed in any::<bool>()) {
            let mut descriptor = chain(depth, reversed);
            resolve(&mut descriptor, ResolveMode::Strict).unwrap();
            let once = descriptor.clone();
            let second = resolve(&mut descriptor, ResolveMode::Strict).unwrap();
            prop_assert_eq!(second.passes, 0);
            prop_assert_eq!(descriptor, once);
        }

        /// Property: a reference chain of depth D settles within D passes
        /// whatever the key order, and no marker survives
        #[test]
        fn chain_converges_within_depth(depth in 1usize..12, reversed in any::<bool>()) {
            let mut descriptor = chain(depth, reversed);
            let resolution = resolve(&mut descriptor, ResolveMode::Strict).unwrap();

            prop_assert!(resolution.complete);
            prop_assert!(resolution.passes <= depth);
            for (_, value) in descriptor.iter() {
                prop_assert!(!value.contains('%'));
            }
            let last = format!("k{}", depth);
            let expected = format!("root{}", "/x".repeat(depth));
            prop_assert_eq!(descriptor.get(&last), Some(expected.as_str()));
        }

        /// Property: a reference cycle of any length is reported, never looped
        #[test]
        fn cycles_are_reported(length in 1usize..8) {
            let mut descriptor = Descriptor::new();
            for i in 0..length {
                descriptor.insert(format!("c{}", i), format!("%c{}%", (i + 1) % length));
            }
            let result = resolve(&mut descriptor, ResolveMode::Strict);
            let is_cycle = matches!(result, Err(Error::CyclicReference { .. }));
            prop_assert!(is_cycle);
        }
    }

    /// `k0: root`, `k1: %k0%/x`, ... `kD: %k(D-1)%/x`, optionally in reverse
    /// key order
    fn chain(depth: usize, reversed: bool) -> Descriptor {
        let mut entries: Vec<(String, String)> = (0..=depth)
            .map(|i| {
                let value = if i == 0 {
                    "root".to_string()
                } else {
                    format!("%k{}%/x", i - 1)
                };
                (format!("k{}", i), value)
            })
            .collect();
        if reversed {
            entries.reverse();
        }

        let mut descriptor = Descriptor::new();
        for (k, v) in entries {
            descriptor.insert(k, v);
        }
        descriptor
    }
}
