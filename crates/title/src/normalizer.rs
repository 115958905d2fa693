//! Cosmetic title normalization used for cross-site matching.

/// Maps raw titles onto an equivalence class for matching.
///
/// Raw titles stay byte-exact for display; only the *matching* key is built
/// from the normalized form. The table is append-only: editing or adding an
/// entry changes the normalized key of existing titles, and the stored
/// `normalized_key` column must then be recalculated for every title.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringNormalizer;

impl StringNormalizer {
    /// Literal substitutions applied by [`normalize`](Self::normalize).
    ///
    /// No replacement produces text matched by another entry, so the order
    /// in which they are applied does not matter.
    pub const REPLACEMENTS: &'static [(&'static str, &'static str)] = &[
        // RIGHT SINGLE QUOTATION MARK
        ("\u{2019}", "'"),
        // HORIZONTAL ELLIPSIS
        ("\u{2026}", "..."),
        ("_", " "),
    ];

    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, input: impl AsRef<str>) -> String {
        Self::REPLACEMENTS
            .iter()
            .fold(input.as_ref().to_string(), |text, (find, replacement)| text.replace(find, replacement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("JustAString", "JustAString")]
    #[case("Foo bar", "Foo bar")]
    #[case("Foo_bar", "Foo bar")]
    #[case("Apostrophe\u{2019}", "Apostrophe'")]
    #[case("ellipsis\u{2026}", "ellipsis...")]
    #[case("Rock_\u{2019}n\u{2019}_roll\u{2026}", "Rock 'n' roll...")]
    fn test_normalizations(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(StringNormalizer::new().normalize(input), expected);
    }

    #[test]
    fn test_space_and_underscore_are_equivalent() {
        let normalizer = StringNormalizer::new();
        assert_eq!(normalizer.normalize("Foo_bar"), normalizer.normalize("Foo bar"));
    }

    #[test]
    fn test_normalized_keys_match_stored_data() {
        let key = crate::StringHasher::new().hash(StringNormalizer::new().normalize("Foo_bar"));
        assert_eq!(key, 3439045753236424292);
    }

    #[rstest]
    #[case("")]
    #[case("Plain")]
    #[case("Mixed \u{2019}quote\u{2019} and\u{2026} dots_ here")]
    #[case("...''__")]
    fn test_normalize_is_idempotent(#[case] input: &str) {
        let normalizer = StringNormalizer::new();
        let once = normalizer.normalize(input);
        assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn test_replacements_do_not_feed_each_other() {
        for (_, replacement) in StringNormalizer::REPLACEMENTS {
            for (find, _) in StringNormalizer::REPLACEMENTS {
                assert!(!replacement.contains(find), "{replacement:?} contains {find:?}");
            }
        }
    }
}
