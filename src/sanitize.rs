//! Turning free-form metadata into path segments.

/// Characters kept besides alphanumerics.
const KEEP: [char; 3] = [' ', '.', '_'];

/// Fallback label for segments that end up unusable.
pub const UNKNOWN: &str = "Unknown";

/// Sanitize a string for use as a single path segment.
///
/// Keeps alphanumeric characters, spaces, periods and underscores, collapses
/// runs of spaces and trims both ends. May return an empty string.
pub fn sanitize(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_alphanumeric() || KEEP.contains(c))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize a value and fall back to [`UNKNOWN`] when nothing usable remains.
///
/// Segments made only of periods are rejected too, so `..` can never climb
/// out of the destination root.
pub fn segment(value: Option<&str>) -> String {
    let cleaned = value.map(sanitize).unwrap_or_default();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        UNKNOWN.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Abbey Road", "Abbey Road")]
    #[case("Beatles, The", "Beatles The")]
    #[case("  AC/DC  ", "ACDC")]
    #[case("Live\tat  the\nBBC", "Liveat theBBC")]
    #[case("Vol. 2 _ Remastered", "Vol. 2 _ Remastered")]
    #[case("Björk: Homogenic", "Björk Homogenic")]
    #[case("?!*", "")]
    fn test_sanitize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input), expected);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for input in ["a  b", " x.y_z ", "<<>>", "Sigur Rós — ( )", "..", "t\u{7}ab"] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }

    #[test]
    fn test_sanitize_output_alphabet() {
        let out = sanitize("a/b\\c:d*e?f\"g<h>i|j \u{0} k\r\nl  m");
        assert!(out
            .chars()
            .all(|c| c.is_alphanumeric() || KEEP.contains(&c)));
        assert!(!out.contains("  "));
        assert_eq!(out.trim(), out);
    }

    #[rstest]
    #[case(None, "Unknown")]
    #[case(Some("!!!"), "Unknown")]
    #[case(Some(".."), "Unknown")]
    #[case(Some(". ."), ". .")]
    #[case(Some("Now 80"), "Now 80")]
    fn test_segment(#[case] input: Option<&str>, #[case] expected: &str) {
        assert_eq!(segment(input), expected);
    }
}
