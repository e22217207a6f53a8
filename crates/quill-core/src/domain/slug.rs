//! URL slug derivation.

use unicode_normalization::UnicodeNormalization;

/// Convert a title into a URL slug.
///
/// Accented letters are folded to their ASCII base via NFKD ("Café" becomes
/// "cafe"); anything else outside ASCII is dropped. The result is lower-cased,
/// keeps only letters, digits, underscores and hyphens, collapses runs of
/// hyphens and whitespace into a single hyphen and has leading/trailing
/// hyphens and underscores stripped.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut separator = false;

    for c in value.nfkd().filter(char::is_ascii).map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if separator && !slug.is_empty() {
                slug.push('-');
            }
            separator = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            separator = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Post title"), "post-title");
        assert_eq!(slugify("Test title"), "test-title");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("Hello, World!  Again"), "hello-world-again");
        assert_eq!(slugify("Rust 2024: what's new?"), "rust-2024-whats-new");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  --rust_lang--  tips "), "rust_lang-tips");
        assert_eq!(slugify("a - - b"), "a-b");
    }

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify("Café crème"), "cafe-creme");
        assert_eq!(slugify("Ångström Über"), "angstrom-uber");
        assert_eq!(slugify("ﬁne print"), "fine-print");
    }

    #[test]
    fn test_slugify_drops_unfoldable_characters() {
        assert_eq!(slugify("Rust 日本"), "rust");
    }

    #[test]
    fn test_slugify_nothing_left() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }
}
