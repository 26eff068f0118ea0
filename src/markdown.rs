//! Markdown to HTML conversion.
//!
//! A thin layer over [pulldown-cmark](https://docs.rs/pulldown-cmark) with
//! the CommonMark extensions prose documents usually lean on: tables,
//! strikethrough, task lists, and footnotes.
//!
//! Two things are added on top of the parser's event stream:
//!
//! - **Bare URL linking**: `https://…` and `http://…` in running text become
//!   links, the way GitHub-flavoured renderers treat them. Text inside links,
//!   images, code, and raw `<a>` elements is left alone.
//! - **Title extraction**: the text of the first level-1 heading, used as the
//!   document `<title>`.

use pulldown_cmark::{
    CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
    html as md_html,
};

/// Result of converting one markdown source.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    /// Body markup, ready to be placed inside `<body>`.
    pub html: String,
    /// Plain text of the first `# heading`, if any.
    pub title: Option<String>,
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Convert markdown `source` into body HTML and extract its title.
pub fn convert(source: &str) -> Converted {
    let events: Vec<Event<'_>> =
        TextMergeStream::new(Parser::new_ext(source, parser_options())).collect();

    let title = first_heading(&events);
    let linked = link_bare_urls(events);

    let mut html = String::with_capacity(source.len() * 3 / 2);
    md_html::push_html(&mut html, linked.into_iter());
    Converted { html, title }
}

/// Plain text of the first level-1 heading.
fn first_heading(events: &[Event<'_>]) -> Option<String> {
    let start = events.iter().position(|e| {
        matches!(
            e,
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            })
        )
    })?;

    let mut title = String::new();
    for event in &events[start + 1..] {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => title.push_str(t),
            Event::SoftBreak | Event::HardBreak => title.push(' '),
            _ => {}
        }
    }
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Wrap bare URLs in running text with autolink events.
fn link_bare_urls(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    // Nesting depth of constructs whose text must not be linked.
    let mut opaque_depth = 0usize;

    for event in events {
        match &event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_)) => {
                opaque_depth += 1;
            }
            Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock) => {
                opaque_depth = opaque_depth.saturating_sub(1);
            }
            Event::Html(raw) | Event::InlineHtml(raw) => {
                let (opened, closed) = anchor_tags(raw);
                opaque_depth = (opaque_depth + opened).saturating_sub(closed);
            }
            Event::Text(text) if opaque_depth == 0 && contains_url(text) => {
                let text = text.to_string();
                split_urls(&text, &mut out);
                continue;
            }
            _ => {}
        }
        out.push(event);
    }
    out
}

/// Count `<a …>` and `</a>` tags in a raw HTML fragment.
fn anchor_tags(raw: &str) -> (usize, usize) {
    let lower = raw.to_ascii_lowercase();
    let is_boundary = |rest: &str| {
        rest.chars()
            .next()
            .is_none_or(|c| c == '>' || c == '/' || c.is_ascii_whitespace())
    };
    let (mut opened, mut closed) = (0, 0);
    for (i, _) in lower.match_indices('<') {
        let tag = &lower[i + 1..];
        if let Some(rest) = tag.strip_prefix("/a") {
            if is_boundary(rest) {
                closed += 1;
            }
        } else if let Some(rest) = tag.strip_prefix('a') {
            if is_boundary(rest) {
                opened += 1;
            }
        }
    }
    (opened, closed)
}

const URL_SCHEMES: &[&str] = &["https://", "http://"];

fn contains_url(text: &str) -> bool {
    URL_SCHEMES.iter().any(|s| text.contains(s))
}

/// Position of the next URL scheme in `text`.
fn next_url_start(text: &str) -> Option<usize> {
    URL_SCHEMES.iter().filter_map(|s| text.find(s)).min()
}

/// Length of the URL at the start of `text`.
///
/// A URL runs to the next whitespace or `<`, minus trailing sentence
/// punctuation. A closing parenthesis is kept only if the URL also contains
/// an opening one.
fn url_len(text: &str) -> usize {
    let end = text
        .find(|c: char| c.is_whitespace() || c == '<')
        .unwrap_or(text.len());
    let mut url = &text[..end];
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']);
        let trimmed = if trimmed.ends_with(')') && !trimmed.contains('(') {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if trimmed.len() == url.len() {
            break;
        }
        url = trimmed;
    }
    url.len()
}

fn split_urls<'a>(text: &str, out: &mut Vec<Event<'a>>) {
    let mut rest = text;
    while let Some(start) = next_url_start(rest) {
        let len = url_len(&rest[start..]);
        if URL_SCHEMES.contains(&&rest[start..start + len]) {
            // "https://" on its own is not a link.
            let skip = start + len;
            out.push(Event::Text(CowStr::from(rest[..skip].to_string())));
            rest = &rest[skip..];
            continue;
        }
        if start > 0 {
            out.push(Event::Text(CowStr::from(rest[..start].to_string())));
        }
        let url = rest[start..start + len].to_string();
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(url.clone()),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        out.push(Event::Text(CowStr::from(url)));
        out.push(Event::End(TagEnd::Link));
        rest = &rest[start + len..];
    }
    if !rest.is_empty() {
        out.push(Event::Text(CowStr::from(rest.to_string())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_common_prose_constructs() {
        let html = convert(
            "# Title\n\nSome **bold**, *italic* and `code`.\n\n- one\n- two\n\n1. first\n\n[link](https://example.com)\n",
        )
        .html;
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<code>code</code>"));
        assert!(html.contains("<ul>"));
        assert!(html.contains("<ol>"));
        assert!(html.contains(r#"<a href="https://example.com">link</a>"#));
    }

    #[test]
    fn converts_fenced_code_blocks() {
        let html = convert("```rust\nfn main() {}\n```\n").html;
        assert!(html.contains(r#"<pre><code class="language-rust">fn main() {}"#));
    }

    #[test]
    fn converts_tables_and_strikethrough() {
        let html = convert("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n").html;
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn angle_bracket_autolinks() {
        let html = convert("See <https://example.com>.").html;
        assert!(html.contains(r#"<a href="https://example.com">https://example.com</a>"#));
    }

    #[test]
    fn bare_urls_become_links() {
        let html = convert("Visit https://example.com/docs today.").html;
        assert!(html.contains(
            r#"Visit <a href="https://example.com/docs">https://example.com/docs</a> today."#
        ));
    }

    #[test]
    fn bare_url_trailing_punctuation_excluded() {
        let html = convert("Docs live at http://example.com/a_b.").html;
        assert!(html.contains(r#"<a href="http://example.com/a_b">http://example.com/a_b</a>."#));
    }

    #[test]
    fn bare_url_in_parentheses() {
        let html = convert("(see https://example.com)").html;
        assert!(html.contains(r#"(see <a href="https://example.com">https://example.com</a>)"#));
    }

    #[test]
    fn bare_url_keeps_balanced_parenthesis() {
        let html = convert("https://en.wikipedia.org/wiki/Rust_(programming_language)").html;
        assert!(html.contains(r#"href="https://en.wikipedia.org/wiki/Rust_(programming_language)""#));
    }

    #[test]
    fn multiple_bare_urls() {
        let html = convert("a https://one.example b http://two.example c").html;
        assert_eq!(html.matches("<a href=").count(), 2);
    }

    #[test]
    fn urls_in_code_are_not_linked() {
        let html = convert("```\nhttps://example.com\n```\n\n`https://inline.example`").html;
        assert!(!html.contains("<a href"));
    }

    #[test]
    fn urls_inside_links_are_not_relinked() {
        let html = convert("[https://example.com](https://example.com)").html;
        assert_eq!(html.matches("<a href=").count(), 1);
    }

    #[test]
    fn urls_inside_raw_html_anchor_are_not_relinked() {
        let html = convert(r#"See <a href="https://x.io">https://x.io</a> now"#).html;
        assert_eq!(html.matches("<a href").count(), 1);
    }

    #[test]
    fn urls_after_raw_html_anchor_are_linked() {
        let html = convert(r#"<A HREF="/home">home</A> and https://after.example"#).html;
        assert!(html.contains(r#"<a href="https://after.example">https://after.example</a>"#));
    }

    #[test]
    fn other_raw_tags_do_not_block_linking() {
        let html = convert("<abbr>URL</abbr> https://example.com").html;
        assert!(html.contains(r#"<a href="https://example.com">"#));
    }

    #[test]
    fn anchor_tag_counting() {
        assert_eq!(anchor_tags(r#"<a href="x">"#), (1, 0));
        assert_eq!(anchor_tags("</a>"), (0, 1));
        assert_eq!(anchor_tags(r#"<p><a href="x">y</a></p>"#), (1, 1));
        assert_eq!(anchor_tags("<abbr><aside></abbr>"), (0, 0));
    }

    #[test]
    fn scheme_alone_is_not_a_link() {
        let html = convert("the https:// prefix").html;
        assert!(!html.contains("<a href"));
        assert!(html.contains("the https:// prefix"));
    }

    #[test]
    fn raw_html_in_text_is_escaped() {
        let html = convert("1 < 2 & 3 > 2").html;
        assert!(html.contains("1 &lt; 2 &amp; 3 &gt; 2"));
    }

    #[test]
    fn title_from_first_h1() {
        let converted = convert("Intro\n\n## Sub\n\n# Main `Title`\n\n# Second");
        assert_eq!(converted.title.as_deref(), Some("Main Title"));
    }

    #[test]
    fn no_title_without_h1() {
        assert_eq!(convert("## Only a subheading\n\nText").title, None);
        assert_eq!(convert("").title, None);
    }
}
