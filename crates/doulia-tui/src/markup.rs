//! Display-only markup for reply text: blank-line paragraphs, `## ` headings
//! and `**bold**` spans.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Parse a line of text and convert **bold** markdown to styled spans
pub fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn heading_line(text: &str) -> Line<'static> {
    let plain = text.replace("**", "");
    Line::from(Span::styled(
        plain,
        Style::default()
            .fg(Color::LightBlue)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Lay out a block of reply text. Paragraphs are separated by one empty line.
pub fn render_text(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let paragraphs = text
        .split("\n\n")
        .map(|p| p.trim_matches(|c: char| c == '\n' || c == '\r'))
        .filter(|p| !p.trim().is_empty());

    for (i, paragraph) in paragraphs.enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        for line in paragraph.lines() {
            match line.trim_start().strip_prefix("## ") {
                Some(heading) => lines.push(heading_line(heading)),
                None => lines.push(parse_markdown_line(line)),
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn is_bold(span: &Span) -> bool {
        span.style.add_modifier.contains(Modifier::BOLD)
    }

    #[test]
    fn test_bold_spans() {
        let line = parse_markdown_line("Le **Pricing Prédictif** optimise vos marges");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "Pricing Prédictif");
        assert!(is_bold(&line.spans[1]));
        assert!(!is_bold(&line.spans[0]));
        assert_eq!(plain(&line), "Le Pricing Prédictif optimise vos marges");
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let line = parse_markdown_line("a **b");
        assert_eq!(plain(&line), "a **b");
        assert!(line.spans.iter().all(|s| !is_bold(s)));
    }

    #[test]
    fn test_paragraphs_and_headings() {
        let lines = render_text("## Audit\nPremier point\n\n\n\nSecond **point**");
        assert_eq!(lines.len(), 4);
        assert_eq!(plain(&lines[0]), "Audit");
        assert!(is_bold(&lines[0].spans[0]));
        assert_eq!(plain(&lines[1]), "Premier point");
        assert_eq!(plain(&lines[2]), "");
        assert_eq!(plain(&lines[3]), "Second point");
    }

    #[test]
    fn test_empty_text_renders_nothing() {
        assert!(render_text("").is_empty());
        assert!(render_text("\n\n").is_empty());
    }
}
