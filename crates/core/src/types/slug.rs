//! URL slugs for categories and products.

/// Lowercase, hyphen-separated slug derived from a display name.
///
/// Runs of anything other than ASCII letters or digits collapse into a
/// single hyphen, and leading or trailing hyphens are dropped.
///
/// ```
/// use schoolmall_core::slugify;
///
/// assert_eq!(slugify("Grade 1"), "grade-1");
/// assert_eq!(slugify("  Art & Craft Supplies "), "art-craft-supplies");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Candidate slugs for `base`: `base`, `base-1`, `base-2`, ...
///
/// Callers take the first candidate that is not already in use.
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_owned()).chain((1_u32..).map(move |n| format!("{base}-{n}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Pre-school"), "pre-school");
        assert_eq!(slugify("Grade 10"), "grade-10");
        assert_eq!(slugify("HP 250 G8 Laptop!!"), "hp-250-g8-laptop");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("Ünïcode Books"), "n-code-books");
    }

    #[test]
    fn test_candidates() {
        let first: Vec<String> = candidates("books").take(3).collect();
        assert_eq!(first, ["books", "books-1", "books-2"]);
    }
}
