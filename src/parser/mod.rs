//! RSS and Atom parsing into [`Article`] candidates.
//!
//! [`FeedParser`] accepts whatever a relay returned and never fails: a
//! document that is not well-formed XML yields no candidates, and the caller
//! decides what to do next. Lookup goes through the namespace-tolerant tree in
//! [`xml`], so `<title>`, `<atom:title>` and friends are all found the same way.

pub mod dates;
pub mod html;
pub mod xml;

use crate::models::Article;
use crate::utils::truncate_for_log;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use url::Url;
use self::xml::Element;

/// Fields holding the item body, most complete first.
const SUMMARY_FIELDS: &[&str] = &["content:encoded", "description", "summary", "content"];

/// Fields holding the publication date, in order of preference.
const DATE_FIELDS: &[&str] = &["pubDate", "published", "updated", "date"];

#[derive(Debug, Clone)]
pub struct FeedParser {
    summary_max_chars: usize,
}

impl FeedParser {
    pub fn new(summary_max_chars: usize) -> Self {
        Self { summary_max_chars }
    }

    /// Parse a feed document into article candidates labelled `source`.
    pub fn parse(&self, raw: &str, source: &str) -> Vec<Article> {
        self.parse_at(raw, source, None, Utc::now())
    }

    /// Like [`FeedParser::parse`], resolving relative links against `base_url`.
    pub fn parse_with_base(&self, raw: &str, source: &str, base_url: &str) -> Vec<Article> {
        self.parse_at(raw, source, Url::parse(base_url).ok().as_ref(), Utc::now())
    }

    /// Parse with an explicit fetch time, used for items without a usable date.
    pub(crate) fn parse_at(
        &self,
        raw: &str,
        source: &str,
        base: Option<&Url>,
        fetched_at: DateTime<Utc>,
    ) -> Vec<Article> {
        let root = match xml::parse_document(raw) {
            Ok(root) => root,
            Err(e) => {
                warn!(
                    %source,
                    error = %e,
                    preview = %truncate_for_log(raw, 120),
                    "Feed document is not well-formed; skipping parse"
                );
                return Vec::new();
            }
        };

        let mut nodes = root.descendants_named("item");
        nodes.extend(root.descendants_named("entry"));

        let articles: Vec<Article> = nodes
            .into_iter()
            .filter_map(|node| self.article_from_node(node, source, base, fetched_at))
            .collect();

        debug!(%source, root = %root.name, count = articles.len(), "Parsed feed document");
        articles
    }

    fn article_from_node(
        &self,
        node: &Element,
        source: &str,
        base: Option<&Url>,
        fetched_at: DateTime<Utc>,
    ) -> Option<Article> {
        let title = html::strip_markup(&node.child_text("title")?);
        if title.is_empty() {
            return None;
        }

        let raw_summary = SUMMARY_FIELDS
            .iter()
            .find_map(|field| node.child_text(field))
            .unwrap_or_default();
        let summary = html::clean_summary(&raw_summary, self.summary_max_chars);

        let link = item_link(node)
            .map(|l| resolve(&l, base))
            .unwrap_or_default();

        let effective_date = DATE_FIELDS
            .iter()
            .filter_map(|field| node.child_text(field))
            .find_map(|text| dates::parse_lenient(&text))
            .unwrap_or(fetched_at);

        let image = item_image(node, &raw_summary).map(|src| resolve(&src, base));

        Article::new(&title, summary, link, effective_date, source).map(|a| a.with_image(image))
    }
}

/// Plain `<link>` text first, then an Atom-style `href`.
fn item_link(node: &Element) -> Option<String> {
    let links = node.children_named("link");

    if let Some(text) = links
        .iter()
        .map(|l| l.text().trim().to_string())
        .find(|t| !t.is_empty())
    {
        return Some(text);
    }

    let with_href: Vec<&Element> = links.into_iter().filter(|l| l.attr("href").is_some()).collect();
    let preferred = with_href
        .iter()
        .find(|l| matches!(l.attr("rel"), Some("alternate") | None))
        .or_else(|| with_href.first());
    if let Some(href) = preferred.and_then(|l| l.attr("href")) {
        return Some(href.trim().to_string());
    }

    node.child("guid")
        .filter(|g| g.attr("isPermaLink") != Some("false"))
        .map(|g| g.text().trim().to_string())
        .filter(|t| t.starts_with("http://") || t.starts_with("https://"))
}

/// Image enclosure, then Media RSS, then the first `<img>` in the body.
fn item_image(node: &Element, raw_summary: &str) -> Option<String> {
    let enclosure = node
        .children_named("enclosure")
        .into_iter()
        .filter(|e| e.attr("type").is_some_and(|t| t.starts_with("image/")))
        .find_map(|e| e.attr("url"));
    if let Some(url) = enclosure {
        return Some(url.to_string());
    }

    let media_content = node
        .descendants_named("media:content")
        .into_iter()
        .filter(|e| {
            e.attr("medium").is_none_or(|m| m == "image")
                && e.attr("type").is_none_or(|t| t.starts_with("image/"))
        })
        .find_map(|e| e.attr("url"));
    if let Some(url) = media_content {
        return Some(url.to_string());
    }

    let thumbnail = node
        .descendants_named("media:thumbnail")
        .into_iter()
        .find_map(|e| e.attr("url"));
    if let Some(url) = thumbnail {
        return Some(url.to_string());
    }

    html::first_img_src(raw_summary)
}

/// Make `href` absolute against `base` when it is relative.
fn resolve(href: &str, base: Option<&Url>) -> String {
    let href = href.trim();
    if href.is_empty() || Url::parse(href).is_ok() {
        return href.to_string();
    }
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}
