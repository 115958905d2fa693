//! Core wiki namespaces.
//!
//! Only the sixteen namespaces every wiki shares (main through category
//! talk) can be matched across sites, because the numeric IDs of custom
//! namespaces are assigned per site.

/// Numeric namespace identifier.
pub type Namespace = i32;

pub const MAIN: Namespace = 0;
pub const CATEGORY_TALK: Namespace = 15;

const CANONICAL_NAMES: [&str; 16] = [
    "",
    "Talk",
    "User",
    "User_talk",
    "Project",
    "Project_talk",
    "File",
    "File_talk",
    "MediaWiki",
    "MediaWiki_talk",
    "Template",
    "Template_talk",
    "Help",
    "Help_talk",
    "Category",
    "Category_talk",
];

/// Returns `true` for namespaces shared by every site.
pub fn is_core_namespace(namespace: Namespace) -> bool {
    (MAIN..=CATEGORY_TALK).contains(&namespace)
}

/// Canonical (site-independent) name of a core namespace.
///
/// The main namespace has an empty name; non-core namespaces have none.
pub fn canonical_name(namespace: Namespace) -> Option<&'static str> {
    usize::try_from(namespace).ok().and_then(|index| CANONICAL_NAMES.get(index)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Some(""))]
    #[case(1, Some("Talk"))]
    #[case(14, Some("Category"))]
    #[case(15, Some("Category_talk"))]
    #[case(16, None)]
    #[case(-1, None)]
    fn test_canonical_name(#[case] namespace: Namespace, #[case] expected: Option<&str>) {
        assert_eq!(canonical_name(namespace), expected);
        assert_eq!(is_core_namespace(namespace), expected.is_some());
    }
}
