//! URL-safe identifiers derived from human-readable names.

/// Derive a slug from a name.
///
/// Lower-cases the name, drops every character that is not an ASCII letter,
/// digit or whitespace, and joins the remaining words with `-`.
///
/// Returns `None` when nothing usable is left (for example a name written
/// entirely in non-Latin script), since an empty slug cannot be unique.
///
/// ```
/// use bazaar_core::slugify;
///
/// assert_eq!(slugify("Gaming Laptops").as_deref(), Some("gaming-laptops"));
/// assert_eq!(slugify("USB-C  Cables!").as_deref(), Some("usbc-cables"));
/// assert_eq!(slugify("!!!"), None);
/// ```
#[must_use]
pub fn slugify(name: &str) -> Option<String> {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");

    if slug.is_empty() { None } else { Some(slug) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_simple() {
        assert_eq!(slugify("Phones").as_deref(), Some("phones"));
    }

    #[test]
    fn test_slugify_collapses_whitespace_and_trims() {
        assert_eq!(
            slugify("  Smart   Home \t Devices ").as_deref(),
            Some("smart-home-devices")
        );
    }

    #[test]
    fn test_slugify_strips_punctuation_without_separating() {
        assert_eq!(slugify("Kid's Toys & Games").as_deref(), Some("kids-toys-games"));
    }

    #[test]
    fn test_slugify_drops_non_ascii_letters() {
        assert_eq!(slugify("Điện thoại 5G").as_deref(), Some("in-thoi-5g"));
    }

    #[test]
    fn test_slugify_empty_result() {
        assert_eq!(slugify(""), None);
        assert_eq!(slugify("日本"), None);
    }
}
