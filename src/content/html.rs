use scraper::{ElementRef, Html, Node};

/// Elements whose content is never readable text.
const SKIPPED: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "object",
];

/// Elements that start a new paragraph.
const PARAGRAPHS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "table", "ul", "ol", "dl",
    "hr", "figure",
];

/// Elements that start a new line.
const LINES: &[&str] = &[
    "div", "li", "dt", "dd", "tr", "section", "article", "header", "footer", "nav", "main",
    "aside", "form", "address", "figcaption", "caption",
];

/// Convert an HTML document into readable plain text.
///
/// Markup, scripts and styles are dropped, character references are decoded,
/// whitespace inside a line is collapsed, and block elements become line or
/// paragraph breaks. Runs of blank lines collapse into one.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);
    walk(document.root_element(), &mut raw);
    tidy(&raw)
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let breaks = if PARAGRAPHS.contains(&name) {
        2
    } else if LINES.contains(&name) {
        1
    } else {
        0
    };
    ensure_breaks(out, breaks);

    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            walk(child, out);
        } else if let Node::Text(text) = child.value() {
            push_collapsed(out, text);
        }
    }

    if name == "td" || name == "th" {
        out.push(' ');
    }
    ensure_breaks(out, breaks);
}

/// Append text with every whitespace run reduced to one space.
fn push_collapsed(out: &mut String, text: &str) {
    let mut in_space = out.ends_with(' ');
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
}

/// Make `out` end with at least `count` line breaks. Never breaks at the start.
fn ensure_breaks(out: &mut String, count: usize) {
    if count == 0 {
        return;
    }
    while out.ends_with(' ') {
        out.pop();
    }
    if out.is_empty() {
        return;
    }
    let present = out.chars().rev().take_while(|ch| *ch == '\n').count();
    for _ in present..count {
        out.push('\n');
    }
}

fn tidy(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut pending_blank = false;
    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            pending_blank = !lines.is_empty();
            continue;
        }
        if pending_blank {
            lines.push(String::new());
            pending_blank = false;
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup() {
        let html = r#"<html><head><title>Ignored</title><style>p { color: red }</style></head>
            <body><h1>Safety   guidance</h1><p>Understanding the <b>safety</b> risks
            of your application.</p><script>alert("x")</script></body></html>"#;

        let text = html_to_text(html);
        assert_eq!(
            text,
            "Safety guidance\n\nUnderstanding the safety risks of your application."
        );
        assert!(!text.contains('<'));
        assert!(!text.contains("alert"));
        assert!(!text.contains("Ignored"));
    }

    #[test]
    fn decodes_entities() {
        let text = html_to_text("<p>Fish &amp; chips &lt;3 &quot;yum&quot;</p>");
        assert_eq!(text, "Fish & chips <3 \"yum\"");
    }

    #[test]
    fn line_breaks_and_lists() {
        let text = html_to_text("<div>one<br>two</div><ul><li>a</li><li>b</li></ul>");
        assert_eq!(text, "one\ntwo\n\na\nb");
    }

    #[test]
    fn table_cells_are_separated() {
        let text = html_to_text("<table><tr><td>year</td><td>gdp</td></tr><tr><td>2022</td><td>25.4</td></tr></table>");
        assert_eq!(text, "year gdp\n2022 25.4");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(html_to_text("just text"), "just text");
        assert_eq!(html_to_text(""), "");
    }
}
