// 🧼 Output Sanitization - neutralize markup before echoing stored text
//
// Stored articles keep exactly what the client sent. This filter runs only on
// the way out, so `title` and `content` can never carry live script back to a
// browser.

use crate::db::Article;
use regex::Regex;
use std::sync::OnceLock;

// ============================================================================
// WHITELIST
// ============================================================================

/// Attributes allowed on each whitelisted tag, `None` if the tag is not allowed
fn allowed_attributes(tag: &str) -> Option<&'static [&'static str]> {
    const NONE: &[&str] = &[];
    const CELL: &[&str] = &["width", "rowspan", "colspan", "align", "valign"];
    const COL: &[&str] = &["align", "valign", "span", "width"];

    let attrs: &'static [&'static str] = match tag {
        "a" => &["target", "href", "title"],
        "abbr" => &["title"],
        "area" => &["shape", "coords", "href", "alt"],
        "bdi" | "bdo" => &["dir"],
        "blockquote" => &["cite"],
        "col" | "colgroup" => COL,
        "del" | "ins" => &["datetime"],
        "details" => &["open"],
        "font" => &["color", "size", "face"],
        "img" => &["src", "alt", "title", "width", "height"],
        "table" => &["width", "border", "align", "valign"],
        "td" | "th" => CELL,
        "tr" => &["rowspan", "align", "valign"],
        "address" | "article" | "aside" | "b" | "big" | "br" | "caption" | "center"
        | "cite" | "code" | "dd" | "div" | "dl" | "dt" | "em" | "figcaption" | "figure"
        | "footer" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "header" | "hr" | "i"
        | "li" | "mark" | "nav" | "ol" | "p" | "pre" | "s" | "section" | "small"
        | "span" | "strike" | "strong" | "sub" | "summary" | "sup" | "tbody" | "tfoot"
        | "thead" | "tt" | "u" | "ul" => NONE,
        _ => return None,
    };

    Some(attrs)
}

const SAFE_URL_PREFIXES: &[&str] = &[
    "http://", "https://", "mailto:", "tel:", "#", "/", "./", "../",
];

static COMMENT_PATTERN: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn comment_pattern() -> &'static Regex {
    COMMENT_PATTERN.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"))
}

fn attribute_pattern() -> &'static Regex {
    ATTRIBUTE_PATTERN.get_or_init(|| {
        Regex::new(
            r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
        )
        .expect("valid attribute regex")
    })
}

// ============================================================================
// ESCAPING
// ============================================================================

fn escape_text(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr_value(value: &str) -> String {
    value
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Returns the value to emit, or an empty string to drop it
fn safe_attr_value(attr: &str, value: &str) -> String {
    let value = value.trim();

    if attr == "href" || attr == "src" {
        if value.is_empty() {
            return String::new();
        }
        let lower = value.to_ascii_lowercase();
        let safe = SAFE_URL_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
            || (attr == "src" && lower.starts_with("data:image/"));
        if !safe {
            return String::new();
        }
    }

    escape_attr_value(value)
}

// ============================================================================
// FILTER
// ============================================================================

/// Rebuild a single `<...>` tag, or escape it if the tag is not whitelisted
fn filter_tag(tag: &str) -> String {
    let inner = &tag[1..tag.len() - 1];
    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, inner),
    };

    let name_end = body
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(body.len());
    let name = body[..name_end].to_ascii_lowercase();

    let Some(allowed) = allowed_attributes(&name) else {
        return escape_text(tag);
    };

    if closing {
        return format!("</{name}>");
    }

    let attrs_src = &body[name_end..];
    let mut out = format!("<{name}");

    for cap in attribute_pattern().captures_iter(attrs_src) {
        let attr = cap[1].to_ascii_lowercase();
        if !allowed.contains(&attr.as_str()) {
            continue;
        }

        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| safe_attr_value(&attr, m.as_str()))
            .unwrap_or_default();

        out.push(' ');
        out.push_str(&attr);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&value);
            out.push('"');
        }
    }

    if attrs_src.trim_end().ends_with('/') {
        out.push_str(" /");
    }
    out.push('>');
    out
}

/// Byte length of the tag starting at `tail[0] == '<'`, including the closing `>`
///
/// Returns `None` when another `<` appears first (outside quotes) or the
/// input ends, meaning the leading `<` is plain text.
fn tag_length(tail: &str) -> Option<usize> {
    let mut quote: Option<char> = None;

    for (i, c) in tail.char_indices().skip(1) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i + 1),
                '<' => return None,
                _ => {}
            },
        }
    }

    None
}

/// Whitelist HTML filter for untrusted text
///
/// Whitelisted tags survive with their allowed attributes; every other tag is
/// escaped so it renders as inert text. Comments are removed.
///
/// ```
/// use articles_api::sanitize::filter_xss;
///
/// assert_eq!(
///     filter_xss("<script>alert(1)</script>"),
///     "&lt;script&gt;alert(1)&lt;/script&gt;"
/// );
/// assert_eq!(filter_xss("<b>bold</b>"), "<b>bold</b>");
/// ```
pub fn filter_xss(input: &str) -> String {
    let without_comments = comment_pattern().replace_all(input, "");
    let mut out = String::with_capacity(without_comments.len());
    let mut rest: &str = &without_comments;

    while let Some(open) = rest.find('<') {
        out.push_str(&escape_text(&rest[..open]));
        let tail = &rest[open..];

        match tag_length(tail) {
            Some(len) => {
                out.push_str(&filter_tag(&tail[..len]));
                rest = &tail[len..];
            }
            None => {
                out.push_str("&lt;");
                rest = &tail[1..];
            }
        }
    }

    out.push_str(&escape_text(rest));
    out
}

/// Sanitize the client-supplied text fields of an article for output
pub fn sanitize_article(article: Article) -> Article {
    Article {
        title: filter_xss(&article.title),
        content: filter_xss(&article.content),
        ..article
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_script_tag_is_escaped() {
        assert_eq!(
            filter_xss("<script>alert(1)</script>"),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
        assert_eq!(
            filter_xss(r#"Naughty <script>alert("xss");</script> title"#),
            r#"Naughty &lt;script&gt;alert("xss");&lt;/script&gt; title"#
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "Just a normal title, with punctuation & \"quotes\"!";
        assert_eq!(filter_xss(text), text);
    }

    #[test]
    fn test_whitelisted_tags_kept() {
        assert_eq!(
            filter_xss("<p>Some <strong>bold</strong> and <em>em</em></p>"),
            "<p>Some <strong>bold</strong> and <em>em</em></p>"
        );
        assert_eq!(filter_xss("line<br/>break"), "line<br />break");
        assert_eq!(filter_xss("<B>loud</B>"), "<b>loud</b>");
    }

    #[test]
    fn test_event_handlers_stripped() {
        assert_eq!(
            filter_xss(r#"<img src="https://url.to.file.which/does-not.exist" onerror="alert(document.cookie);">"#),
            r#"<img src="https://url.to.file.which/does-not.exist">"#
        );
        assert_eq!(
            filter_xss("<b onmouseover=alert(1)>hover</b>"),
            "<b>hover</b>"
        );
    }

    #[test]
    fn test_unsafe_urls_dropped() {
        assert_eq!(
            filter_xss(r#"<a href="javascript:alert(1)" title="t">x</a>"#),
            r#"<a href title="t">x</a>"#
        );
        assert_eq!(
            filter_xss(r#"<a href="  JavaScript:alert(1)">x</a>"#),
            "<a href>x</a>"
        );
        assert_eq!(
            filter_xss(r#"<img src="data:text/html;base64,PHNjcmlwdD4=">"#),
            "<img src>"
        );
    }

    #[test]
    fn test_safe_urls_kept() {
        assert_eq!(
            filter_xss(r#"<a href="https://example.com/a?b=c" target='_blank'>ok</a>"#),
            r#"<a href="https://example.com/a?b=c" target="_blank">ok</a>"#
        );
        assert_eq!(filter_xss("<a href=/relative>r</a>"), r#"<a href="/relative">r</a>"#);
        assert_eq!(
            filter_xss(r#"<a href="mailto:me@example.com">m</a>"#),
            r#"<a href="mailto:me@example.com">m</a>"#
        );
        assert_eq!(
            filter_xss(r#"<img src="data:image/png;base64,AAAA">"#),
            r#"<img src="data:image/png;base64,AAAA">"#
        );
    }

    #[test]
    fn test_quoted_gt_inside_attribute() {
        assert_eq!(
            filter_xss(r#"<a title="a>b">x</a>"#),
            r#"<a title="a&gt;b">x</a>"#
        );
    }

    #[test]
    fn test_disallowed_tags_escaped() {
        assert_eq!(
            filter_xss(r#"<iframe src="https://evil.example"></iframe>"#),
            r#"&lt;iframe src="https://evil.example"&gt;&lt;/iframe&gt;"#
        );
        assert_eq!(
            filter_xss("<style>body{}</style>"),
            "&lt;style&gt;body{}&lt;/style&gt;"
        );
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(filter_xss("a<!-- hidden <script> -->b"), "ab");
        assert_eq!(filter_xss("a<!--\nmulti\nline\n-->b"), "ab");
    }

    #[test]
    fn test_stray_angle_brackets_escaped() {
        assert_eq!(filter_xss("1 < 2 and 3 > 2"), "1 &lt; 2 and 3 &gt; 2");
        assert_eq!(filter_xss("<<script>"), "&lt;&lt;script&gt;");
        assert_eq!(filter_xss("unterminated <b"), "unterminated &lt;b");
        assert_eq!(filter_xss("a > b"), "a &gt; b");
    }

    #[test]
    fn test_unicode_text_survives() {
        assert_eq!(filter_xss("Café <i>naïve</i> 日本"), "Café <i>naïve</i> 日本");
    }

    #[test]
    fn test_sanitize_article_only_touches_title_and_content() {
        let published = Utc::now();
        let article = Article {
            id: 7,
            title: "<script>alert(1)</script>".to_string(),
            content: r#"<img src="x" onerror="alert(2)">"#.to_string(),
            style: "<b>News</b>".to_string(),
            date_published: published,
            author: Some(3),
        };

        let clean = sanitize_article(article);

        assert_eq!(clean.title, "&lt;script&gt;alert(1)&lt;/script&gt;");
        assert_eq!(clean.content, r#"<img src>"#);
        assert_eq!(clean.style, "<b>News</b>", "style passes through unchanged");
        assert_eq!(clean.id, 7);
        assert_eq!(clean.date_published, published);
        assert_eq!(clean.author, Some(3));
    }
}
