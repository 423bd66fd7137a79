//! Markup cleanup for feed summaries.

use crate::utils::{collapse_whitespace, truncate_chars};
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

static CDATA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
static CDATA_FRAGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"<!\[CDATA\[|\]\]>").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static IMG_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).unwrap());

/// Turn an HTML fragment into capped plain text.
///
/// The result never contains `<`, `>` or CDATA markers. It may be empty, in
/// which case callers fall back to the title.
pub fn clean_summary(raw: &str, max_chars: usize) -> String {
    let text = strip_markup(raw);
    truncate_chars(&text, max_chars).trim().to_string()
}

/// Plain text of an HTML fragment with whitespace collapsed, uncapped.
pub fn strip_markup(raw: &str) -> String {
    let unwrapped = CDATA.replace_all(raw, "$1");
    // Openers without a closer (and the reverse) survive the paired unwrap.
    let unwrapped = CDATA_FRAGMENT.replace_all(&unwrapped, " ");
    let no_comments = COMMENT.replace_all(&unwrapped, " ");
    let no_blocks = BLOCK.replace_all(&no_comments, " ");
    let no_tags = TAG.replace_all(&no_blocks, " ");
    let decoded = decode_html_entities(&no_tags);
    // Escaped markers only appear once decoded.
    let decoded = CDATA_FRAGMENT.replace_all(&decoded, " ");
    let residual: String = decoded.chars().filter(|c| *c != '<' && *c != '>').collect();
    collapse_whitespace(&residual)
}

/// `src` of the first `<img>` in an HTML fragment.
pub fn first_img_src(raw: &str) -> Option<String> {
    let unwrapped = CDATA.replace_all(raw, "$1");
    IMG_SRC
        .captures(&unwrapped)
        .map(|c| decode_html_entities(&c[1]).trim().to_string())
        .filter(|src| !src.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_cdata() {
        let raw = "<![CDATA[<p>Hello <b>world</b></p>]]>";
        assert_eq!(clean_summary(raw, 500), "Hello world");
    }

    #[test]
    fn test_escaped_markup_never_survives() {
        let raw = "Use &lt;script&gt;alert(1)&lt;/script&gt; carefully";
        let cleaned = clean_summary(raw, 500);
        assert!(!cleaned.contains('<') && !cleaned.contains('>'));
        assert_eq!(cleaned, "Use scriptalert(1)/script carefully");
    }

    #[test]
    fn test_drops_scripts_and_comments() {
        let raw = "<p>Kept</p><script>var x = 1;</script><!-- hidden --><style>p{}</style>";
        assert_eq!(clean_summary(raw, 500), "Kept");
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(
            clean_summary("Caf&eacute; &amp; bar&nbsp;&#8212;&#x27;s &mdash; ok", 500),
            "Café & bar —'s — ok"
        );
        assert_eq!(
            clean_summary("Ve&#318;k&aacute; noc na n&aacute;mest&iacute; &scaron;tart", 500),
            "Veľká noc na námestí štart"
        );
    }

    #[test]
    fn test_unterminated_cdata_markers_are_dropped() {
        assert_eq!(clean_summary("<![CDATA[ cut off teaser", 500), "cut off teaser");
        assert_eq!(clean_summary("&lt;![CDATA[ cut off teaser", 500), "cut off teaser");
        assert_eq!(clean_summary("stray closer ]]&gt; here", 500), "stray closer here");
        assert_eq!(clean_summary("<p>tail]]></p>", 500), "tail");
    }

    #[test]
    fn test_caps_by_characters() {
        let raw = format!("<p>{}</p>", "é".repeat(600));
        let cleaned = clean_summary(&raw, 500);
        assert_eq!(cleaned.chars().count(), 500);
    }

    #[test]
    fn test_cap_then_trim() {
        assert_eq!(clean_summary("abc def", 4), "abc");
    }

    #[test]
    fn test_markup_only_is_empty() {
        assert_eq!(clean_summary("<img src=\"a.jpg\"/><br/>", 500), "");
    }

    #[test]
    fn test_first_img_src() {
        let raw = r#"<p>Intro</p><img class="lead" src="https://cdn.example.com/a.jpg?w=1&amp;h=2" /><img src='b.jpg'>"#;
        assert_eq!(
            first_img_src(raw).as_deref(),
            Some("https://cdn.example.com/a.jpg?w=1&h=2")
        );
        assert_eq!(first_img_src("<p>No image</p>"), None);
    }
}
