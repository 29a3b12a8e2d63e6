//! Mobile-safe description gatekeeper (spec §4.5). Strips desktop HTML
//! cruft down to plain text, then re-wraps it in a minimal inline-styled
//! template that reads well in the marketplace app's mobile webview.

use lazy_static::lazy_static;
use regex::Regex;

const MOBILE_TEMPLATE_OPEN: &str = "<div style=\"max-width:800px;margin:0 auto;padding:16px;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;font-size:16px;line-height:1.6;color:#333;\">";
const MOBILE_TEMPLATE_CLOSE: &str = "</div>";

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref CSS_BLOCK: Regex = Regex::new(r"(?is)<style.*?</style>").unwrap();
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script.*?</script>").unwrap();
    static ref HTML_COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref HTML_ENTITY: Regex = Regex::new(r"&[a-zA-Z0-9#]+;").unwrap();
    static ref MULTI_NEWLINES: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref MULTI_SPACES: Regex = Regex::new(r"[ \t]{2,}").unwrap();
    static ref WIDE_WIDTH: Regex = Regex::new(r"(?i)width\s*:\s*\d{4,}px").unwrap();
    static ref SMALL_FONT: Regex = Regex::new(r"(?i)font-size\s*:\s*(\d+)(px|pt)").unwrap();
    static ref TABLE_TAG: Regex = Regex::new(r"(?i)<table").unwrap();
    static ref STYLE_TAG: Regex = Regex::new(r"(?i)<style").unwrap();
}

const ENTITY_MAP: [(&str, &str); 8] = [
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&#34;", "\""),
];

pub struct MobileEnforcer;

impl MobileEnforcer {
    pub fn new() -> Self {
        MobileEnforcer
    }

    /// Reduces a raw (possibly HTML-heavy) description to clean plain
    /// text: strips scripts/styles/comments, drops tags, decodes known
    /// entities, then collapses runs of whitespace.
    pub fn strip_html(&self, html: &str) -> String {
        let mut text = SCRIPT_BLOCK.replace_all(html, "").to_string();
        text = CSS_BLOCK.replace_all(&text, "").to_string();
        text = HTML_COMMENT.replace_all(&text, "").to_string();
        text = HTML_TAG.replace_all(&text, "\n").to_string();

        for (entity, replacement) in ENTITY_MAP {
            text = text.replace(entity, replacement);
        }
        text = HTML_ENTITY.replace_all(&text, "").to_string();

        text = MULTI_SPACES.replace_all(&text, " ").to_string();
        text = MULTI_NEWLINES.replace_all(&text, "\n\n").to_string();

        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect();
        lines.join("\n")
    }

    /// Wraps plain text (blank-line-separated paragraphs) in the fixed
    /// mobile-safe template, converting single newlines within a
    /// paragraph to `<br>`.
    pub fn wrap_in_template(&self, plain_text: &str) -> String {
        let paragraphs: Vec<String> = plain_text
            .split("\n\n")
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| {
                let with_breaks = p.replace('\n', "<br>");
                format!("<p style=\"margin:0 0 12px 0;\">{with_breaks}</p>")
            })
            .collect();
        format!(
            "{}{}{}",
            MOBILE_TEMPLATE_OPEN,
            paragraphs.join(""),
            MOBILE_TEMPLATE_CLOSE
        )
    }

    /// Full pipeline: strip, then wrap. A description that strips down to
    /// nothing (blank or whitespace-only) stays empty rather than coming
    /// back as an empty template shell.
    pub fn make_mobile_safe(&self, html: &str) -> String {
        let plain = self.strip_html(html);
        if plain.trim().is_empty() {
            return String::new();
        }
        self.wrap_in_template(&plain)
    }

    /// True if `html` avoids the desktop-only constructs that break in a
    /// narrow viewport: fixed wide widths, sub-14px/11pt fonts, tables,
    /// and inline `<style>` blocks.
    pub fn is_mobile_safe(&self, html: &str) -> bool {
        if WIDE_WIDTH.is_match(html) {
            return false;
        }
        for cap in SMALL_FONT.captures_iter(html) {
            let size: f64 = cap[1].parse().unwrap_or(0.0);
            let unit = &cap[2];
            let too_small = (unit.eq_ignore_ascii_case("px") && size < 14.0)
                || (unit.eq_ignore_ascii_case("pt") && size < 11.0);
            if too_small {
                return false;
            }
        }
        if TABLE_TAG.is_match(html) || STYLE_TAG.is_match(html) {
            return false;
        }
        true
    }
}

impl Default for MobileEnforcer {
    fn default() -> Self {
        Self::new()
    }
}
