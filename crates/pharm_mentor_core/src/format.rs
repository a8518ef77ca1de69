//! crates/pharm_mentor_core/src/format.rs
//!
//! Translates the lightweight markdown conventions used by the generation
//! service into HTML fragments. Pure text-to-text; no rendering context.

use regex::Regex;
use std::sync::LazyLock;

/// Which conventions to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatProfile {
    /// Chat replies: headers, bold, italics, bullets, numbered lists, rules,
    /// arrows and links.
    Chat,
    /// Image analysis: headers, bold, bullets and arrows only.
    Analysis,
}

static HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]*(.*)$").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[*-][ \t]+(.*)$").unwrap());
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\d+)\.[ \t]+(.*)$").unwrap());
static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^---[ \t]*$").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+?)\*").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]\n]*)\]\(([^)\s]*)\)").unwrap());

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn replace_arrows(text: &str) -> String {
    text.replace(r"$\rightarrow$", "→").replace(r"\rightarrow", "→")
}

fn render_link(label: &str, href: &str) -> String {
    let safe = ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| href.starts_with(scheme));
    if safe {
        format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
    } else {
        label.to_string()
    }
}

fn emphasize(text: &str, profile: FormatProfile) -> String {
    let bold = BOLD.replace_all(text, "<strong>$1</strong>");
    match profile {
        FormatProfile::Chat => ITALIC.replace_all(&bold, "<em>$1</em>").into_owned(),
        FormatProfile::Analysis => bold.into_owned(),
    }
}

/// Emphasis applies to link labels and surrounding text, never to a URL.
fn emphasize_with_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in LINK.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&emphasize(&text[last..whole.start()], FormatProfile::Chat));
        out.push_str(&render_link(&emphasize(&caps[1], FormatProfile::Chat), &caps[2]));
        last = whole.end();
    }
    out.push_str(&emphasize(&text[last..], FormatProfile::Chat));
    out
}

/// Converts generation-service markdown into an HTML fragment.
///
/// The input is HTML-escaped first, so the only markup in the output is
/// what the translation rules produce.
pub fn format_markdown(text: &str, profile: FormatProfile) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut html = escape_html(&text.replace("\r\n", "\n"));
    html = HEADER.replace_all(&html, "<h3>$1</h3>").into_owned();
    html = BULLET
        .replace_all(&html, r#"<div class="bullet"><span>•</span><span>$1</span></div>"#)
        .into_owned();
    if profile == FormatProfile::Chat {
        html = NUMBERED
            .replace_all(&html, r#"<div class="numbered"><span>$1.</span><span>$2</span></div>"#)
            .into_owned();
        html = RULE.replace_all(&html, "<hr />").into_owned();
    }
    html = match profile {
        FormatProfile::Chat => emphasize_with_links(&html),
        FormatProfile::Analysis => emphasize(&html, profile),
    };
    html = replace_arrows(&html);
    html.replace('\n', "<br />")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_lose_their_hashes() {
        assert_eq!(
            format_markdown("### Mechanism", FormatProfile::Analysis),
            "<h3>Mechanism</h3>"
        );
    }

    #[test]
    fn bold_italic_and_bullets_in_chat() {
        let html = format_markdown("- **Key:** an *important* idea", FormatProfile::Chat);
        assert_eq!(
            html,
            r#"<div class="bullet"><span>•</span><span><strong>Key:</strong> an <em>important</em> idea</span></div>"#
        );
    }

    #[test]
    fn numbered_lists_rules_and_links_are_chat_only() {
        let input = "1. First\n---\n[PCI](https://www.pci.nic.in)";
        let chat = format_markdown(input, FormatProfile::Chat);
        assert!(chat.contains(r#"<div class="numbered"><span>1.</span><span>First</span></div>"#));
        assert!(chat.contains("<hr />"));
        assert!(chat.contains(r#"<a href="https://www.pci.nic.in""#));

        let analysis = format_markdown(input, FormatProfile::Analysis);
        assert!(!analysis.contains("numbered"));
        assert!(!analysis.contains("<hr />"));
        assert!(!analysis.contains("<a "));
    }

    #[test]
    fn arrows_and_line_breaks() {
        assert_eq!(
            format_markdown("A $\\rightarrow$ B\nC \\rightarrow D", FormatProfile::Analysis),
            "A → B<br />C → D"
        );
    }

    #[test]
    fn raw_html_is_escaped() {
        let html = format_markdown("<script>alert(1)</script>", FormatProfile::Chat);
        assert_eq!(html, "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn unsafe_link_schemes_keep_only_the_label() {
        let html = format_markdown("[click](javascript:alert(1))", FormatProfile::Chat);
        assert!(!html.contains("href"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let text = "# Title\n* item\n**bold**";
        assert_eq!(
            format_markdown(text, FormatProfile::Chat),
            format_markdown(text, FormatProfile::Chat)
        );
    }

    #[test]
    fn asterisks_inside_urls_are_left_alone() {
        let html = format_markdown("*see* [the *docs*](https://x.org/a*b*c)", FormatProfile::Chat);
        assert_eq!(
            html,
            r#"<em>see</em> <a href="https://x.org/a*b*c" target="_blank" rel="noopener noreferrer">the <em>docs</em></a>"#
        );
    }
}
