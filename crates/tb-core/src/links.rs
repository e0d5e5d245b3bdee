use crate::types::CommitLookup;
use regex::Regex;
use std::sync::LazyLock;

const TOOLTIP_MAX: usize = 75;

/// `r1432` style legacy revisions and bare 5..40 char hashes.
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\br[1-9]\d*\b|\b[0-9a-fA-F]{5,40}\b").expect("reference pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
    /// Base URL of the changeset view, without a trailing slash.
    pub changeset_base: String,
    pub long_tooltips: bool,
    pub revmap_enabled: bool,
}

/// Renders `text` as HTML, turning unambiguous revision references into
/// changeset links. `lookup` resolves one reference through the revmap.
pub fn linkify<F>(text: &str, options: &LinkOptions, mut lookup: F) -> String
where
    F: FnMut(&str) -> Vec<CommitLookup>,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in REFERENCE_RE.find_iter(text) {
        out.push_str(&escape_html(&text[last..m.start()]));
        last = m.end();
        let reference = m.as_str();
        if !options.revmap_enabled {
            out.push_str(&escape_html(reference));
            continue;
        }
        let hits = lookup(reference);
        match hits.as_slice() {
            [hit] => out.push_str(&changeset_anchor(reference, hit, options)),
            // Ambiguous or unknown references stay plain text.
            _ => out.push_str(&escape_html(reference)),
        }
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

fn changeset_anchor(reference: &str, hit: &CommitLookup, options: &LinkOptions) -> String {
    let title = if options.long_tooltips {
        hit.message.clone()
    } else {
        shorten_line(&hit.message, TOOLTIP_MAX)
    };
    format!(
        r#"<a class="changeset" href="{}/{}" title="{}">{}</a>"#,
        escape_html(options.changeset_base.trim_end_matches('/')),
        escape_html(&hit.hash),
        escape_html(&title),
        escape_html(reference)
    )
}

/// Texts of `max` chars or more are cut at the last space before `max` and
/// get a ` ...` suffix. Line breaks are kept.
pub fn shorten_line(text: &str, max: usize) -> String {
    if text.chars().count() < max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    let end = head.rfind(' ').unwrap_or(head.len());
    format!("{} ...", &head[..end])
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
