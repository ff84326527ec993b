//! Text cleanup helpers.

use scraper::Html;

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of an HTML fragment, entities decoded and whitespace collapsed.
///
/// A bare `<` or `>` that does not open a tag stays in the text.
pub fn html_text(s: &str) -> String {
    let fragment = Html::parse_fragment(s);
    collapse_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_snippet(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn extracts_text_from_markup() {
        assert_eq!(html_text("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(html_text("   "), "");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            html_text("<p>AT&amp;T&#8217;s plan &mdash; 2 &lt; 3</p>"),
            "AT&T\u{2019}s plan \u{2014} 2 < 3"
        );
    }

    #[test]
    fn keeps_literal_angle_brackets() {
        assert_eq!(
            html_text("if a < b and c > d then win"),
            "if a < b and c > d then win"
        );
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_snippet("short", 10), "short");
        assert_eq!(truncate_snippet("héllo wörld", 5), "héllo...");
    }
}
