//! Host page access for the public widget.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("valid tag regex")
});

/// Comments and the bodies of raw-text elements, which hold no real tags.
static OPAQUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<!--.*?-->|<script\b(?:[^>"']|"[^"]*"|'[^']*')*>(.*?)</script\s*>|<style\b(?:[^>"']|"[^"]*"|'[^']*')*>(.*?)</style\s*>"#,
    )
    .expect("valid opaque span regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("valid attribute regex")
});

static BODY_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("valid body regex"));

/// The parts of a hosting document the widget is allowed to touch.
pub trait HostPage {
    /// Value of attribute `name` on the `<script>` element with id `script_id`.
    fn script_attribute(&self, script_id: &str, name: &str) -> Option<String>;

    /// Whether any element with this id exists.
    fn has_element(&self, id: &str) -> bool;

    /// Adds markup to the end of the document body.
    fn inject(&mut self, markup: &str);
}

/// An HTML document held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    html: String,
}

impl HtmlPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    /// Real tags only: nothing inside comments or script and style bodies.
    fn tags(&self) -> Vec<(String, HashMap<String, String>)> {
        let markup = mask_opaque_spans(&self.html);
        TAG_RE
            .captures_iter(&markup)
            .map(|caps| {
                let name = caps[1].to_ascii_lowercase();
                let attrs = caps
                    .get(2)
                    .map(|m| parse_attributes(m.as_str()))
                    .unwrap_or_default();
                (name, attrs)
            })
            .collect()
    }
}

impl HostPage for HtmlPage {
    fn script_attribute(&self, script_id: &str, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.tags()
            .into_iter()
            .filter(|(tag, attrs)| tag == "script" && attrs.get("id").map(String::as_str) == Some(script_id))
            .find_map(|(_, mut attrs)| attrs.remove(&name))
    }

    fn has_element(&self, id: &str) -> bool {
        self.tags()
            .into_iter()
            .any(|(_, attrs)| attrs.get("id").map(String::as_str) == Some(id))
    }

    fn inject(&mut self, markup: &str) {
        let scanned = mask_opaque_spans(&self.html);
        match BODY_CLOSE_RE.find_iter(&scanned).last() {
            Some(close) => self.html.insert_str(close.start(), markup),
            None => self.html.push_str(markup),
        }
    }
}

/// Blanks out comments and raw-text bodies, keeping every byte offset.
fn mask_opaque_spans(html: &str) -> String {
    let mut bytes = html.as_bytes().to_vec();
    for caps in OPAQUE_RE.captures_iter(html) {
        let span = match caps.get(1).or_else(|| caps.get(2)) {
            Some(body) => body.range(),
            None => caps.get(0).map(|m| m.range()).unwrap_or_default(),
        };
        bytes[span].fill(b' ');
    }
    // Whole characters were replaced, so the bytes are still UTF-8.
    String::from_utf8_lossy(&bytes).into_owned()
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| unescape_entities(m.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

fn unescape_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2f;", "/")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
