//! Google Docs rendering
//!
//! Walks `body.content` from the Docs v1 `documents.get` payload.
//! Paragraph styles map to markdown headings and list bullets, text run
//! styles to bold/italic markers; tables render row-per-line and tables
//! of contents are recursed. Inline objects become placeholder tokens.

use serde_json::Value;

use super::{placeholder, Format};
use crate::error::{Error, Result};

pub fn render(doc: &Value, format: Format) -> Result<String> {
    let content = doc
        .pointer("/body/content")
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Conversion("document has no body content".to_string()))?;

    let mut out = String::new();
    render_elements(content, format, &mut out);

    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("{}\n", trimmed))
    }
}

fn render_elements(elements: &[Value], format: Format, out: &mut String) {
    for element in elements {
        if let Some(paragraph) = element.get("paragraph") {
            render_paragraph(paragraph, format, out);
        } else if let Some(table) = element.get("table") {
            render_table(table, format, out);
        } else if let Some(toc) = element.get("tableOfContents") {
            // Table of contents nests regular structural elements.
            if let Some(inner) = toc.get("content").and_then(|v| v.as_array()) {
                render_elements(inner, format, out);
            }
        }
        // sectionBreak and anything unknown carry no text
    }
}

// ── Paragraphs ──────────────────────────────────────────────────────────────

/// One visual fragment of a paragraph.
enum Piece {
    Text {
        content: String,
        bold: bool,
        italic: bool,
    },
    Object {
        id: String,
    },
}

fn render_paragraph(paragraph: &Value, format: Format, out: &mut String) {
    let pieces = paragraph_pieces(paragraph);
    let heading = heading_level(paragraph);
    let bullet = bullet_nesting(paragraph);

    let line = match format {
        Format::Markdown => markdown_line(&pieces),
        Format::Text => text_line(&pieces),
        Format::Html => html_line(&pieces),
    };

    if line.trim().is_empty() {
        if format != Format::Html {
            out.push('\n');
        }
        return;
    }

    match format {
        Format::Markdown => {
            if let Some(level) = heading {
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(&line);
                out.push_str("\n\n");
            } else if let Some(nesting) = bullet {
                out.push_str(&"  ".repeat(nesting));
                out.push_str("- ");
                out.push_str(&line);
                out.push('\n');
            } else {
                out.push_str(&line);
                out.push_str("\n\n");
            }
        }
        Format::Text => {
            out.push_str(&line);
            out.push('\n');
        }
        Format::Html => {
            if let Some(level) = heading {
                out.push_str(&format!("<h{}>{}</h{}>\n", level, line, level));
            } else if bullet.is_some() {
                out.push_str(&format!("<li>{}</li>\n", line));
            } else {
                out.push_str(&format!("<p>{}</p>\n", line));
            }
        }
    }
}

fn paragraph_pieces(paragraph: &Value) -> Vec<Piece> {
    let Some(elements) = paragraph.get("elements").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    let mut pieces = Vec::new();
    for element in elements {
        if let Some(run) = element.get("textRun") {
            let content = run
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                // Docs terminates each paragraph's last run with a newline.
                .replace('\n', "");
            let style = run.get("textStyle");
            let flag = |name: &str| {
                style
                    .and_then(|s| s.get(name))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false)
            };
            pieces.push(Piece::Text {
                content,
                bold: flag("bold"),
                italic: flag("italic"),
            });
        } else if let Some(obj) = element.get("inlineObjectElement") {
            let id = obj
                .get("inlineObjectId")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            pieces.push(Piece::Object { id });
        }
    }
    pieces
}

/// Heading level from the paragraph's named style, if any.
fn heading_level(paragraph: &Value) -> Option<usize> {
    let style = paragraph
        .pointer("/paragraphStyle/namedStyleType")?
        .as_str()?;
    match style {
        "TITLE" => Some(1),
        "SUBTITLE" => Some(2),
        "HEADING_1" => Some(1),
        "HEADING_2" => Some(2),
        "HEADING_3" => Some(3),
        "HEADING_4" => Some(4),
        "HEADING_5" => Some(5),
        "HEADING_6" => Some(6),
        _ => None,
    }
}

/// `Some(nesting)` when the paragraph is a list item.
fn bullet_nesting(paragraph: &Value) -> Option<usize> {
    let bullet = paragraph.get("bullet")?;
    let nesting = bullet
        .get("nestingLevel")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    Some(nesting as usize)
}

fn markdown_line(pieces: &[Piece]) -> String {
    let mut line = String::new();
    for piece in pieces {
        match piece {
            Piece::Text {
                content,
                bold,
                italic,
            } => {
                if content.trim().is_empty() {
                    line.push_str(content);
                    continue;
                }
                match (bold, italic) {
                    (true, true) => line.push_str(&format!("***{}***", content)),
                    (true, false) => line.push_str(&format!("**{}**", content)),
                    (false, true) => line.push_str(&format!("*{}*", content)),
                    (false, false) => line.push_str(content),
                }
            }
            Piece::Object { id } => line.push_str(&placeholder("image", id)),
        }
    }
    line
}

fn text_line(pieces: &[Piece]) -> String {
    let mut line = String::new();
    for piece in pieces {
        match piece {
            Piece::Text { content, .. } => line.push_str(content),
            Piece::Object { id } => line.push_str(&placeholder("image", id)),
        }
    }
    line
}

fn html_line(pieces: &[Piece]) -> String {
    let mut line = String::new();
    for piece in pieces {
        match piece {
            Piece::Text {
                content,
                bold,
                italic,
            } => {
                let escaped = html_escape(content);
                match (bold, italic) {
                    (true, true) => {
                        line.push_str(&format!("<strong><em>{}</em></strong>", escaped))
                    }
                    (true, false) => line.push_str(&format!("<strong>{}</strong>", escaped)),
                    (false, true) => line.push_str(&format!("<em>{}</em>", escaped)),
                    (false, false) => line.push_str(&escaped),
                }
            }
            Piece::Object { id } => line.push_str(&html_escape(&placeholder("image", id))),
        }
    }
    line
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ── Tables ──────────────────────────────────────────────────────────────────

fn render_table(table: &Value, format: Format, out: &mut String) {
    let Some(rows) = table.get("tableRows").and_then(|v| v.as_array()) else {
        return;
    };

    for row in rows {
        let cells: Vec<String> = row
            .get("tableCells")
            .and_then(|v| v.as_array())
            .map(|cells| cells.iter().map(cell_text).collect())
            .unwrap_or_default();
        if cells.is_empty() {
            continue;
        }

        match format {
            Format::Markdown => {
                out.push_str(&format!("| {} |\n", cells.join(" | ")));
            }
            Format::Text => {
                out.push_str(&cells.join("\t"));
                out.push('\n');
            }
            Format::Html => {
                let escaped: Vec<String> = cells.iter().map(|c| html_escape(c)).collect();
                out.push_str(&format!("<p>{}</p>\n", escaped.join(" | ")));
            }
        }
    }
    if format == Format::Markdown {
        out.push('\n');
    }
}

/// Flatten a table cell's nested content to a single plain-text line.
fn cell_text(cell: &Value) -> String {
    let mut inner = String::new();
    if let Some(content) = cell.get("content").and_then(|v| v.as_array()) {
        render_elements(content, Format::Text, &mut inner);
    }
    inner.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paragraph(text: &str) -> Value {
        json!({
            "paragraph": {
                "elements": [{"textRun": {"content": format!("{}\n", text)}}]
            }
        })
    }

    fn doc(content: Vec<Value>) -> Value {
        json!({"body": {"content": content}})
    }

    #[test]
    fn test_missing_body_is_conversion_error() {
        let err = render(&json!({"title": "empty"}), Format::Text).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn test_plain_paragraphs() {
        let doc = doc(vec![paragraph("First."), paragraph("Second.")]);
        assert_eq!(render(&doc, Format::Text).unwrap(), "First.\nSecond.\n");
        assert_eq!(
            render(&doc, Format::Markdown).unwrap(),
            "First.\n\nSecond.\n"
        );
    }

    #[test]
    fn test_heading_levels() {
        let doc = doc(vec![
            json!({
                "paragraph": {
                    "paragraphStyle": {"namedStyleType": "HEADING_1"},
                    "elements": [{"textRun": {"content": "Overview\n"}}]
                }
            }),
            json!({
                "paragraph": {
                    "paragraphStyle": {"namedStyleType": "HEADING_3"},
                    "elements": [{"textRun": {"content": "Details\n"}}]
                }
            }),
        ]);

        let md = render(&doc, Format::Markdown).unwrap();
        assert!(md.contains("# Overview"));
        assert!(md.contains("### Details"));

        // text output strips heading syntax
        let text = render(&doc, Format::Text).unwrap();
        assert_eq!(text, "Overview\nDetails\n");

        let html = render(&doc, Format::Html).unwrap();
        assert!(html.contains("<h1>Overview</h1>"));
        assert!(html.contains("<h3>Details</h3>"));
    }

    #[test]
    fn test_bold_and_italic_runs() {
        let doc = doc(vec![json!({
            "paragraph": {
                "elements": [
                    {"textRun": {"content": "normal "}},
                    {"textRun": {"content": "strong", "textStyle": {"bold": true}}},
                    {"textRun": {"content": " and "}},
                    {"textRun": {"content": "slanted\n", "textStyle": {"italic": true}}}
                ]
            }
        })]);

        let md = render(&doc, Format::Markdown).unwrap();
        assert_eq!(md, "normal **strong** and *slanted*\n");

        let text = render(&doc, Format::Text).unwrap();
        assert_eq!(text, "normal strong and slanted\n");

        let html = render(&doc, Format::Html).unwrap();
        assert!(html.contains("<strong>strong</strong>"));
        assert!(html.contains("<em>slanted</em>"));
    }

    #[test]
    fn test_bullets_with_nesting() {
        let doc = doc(vec![
            json!({
                "paragraph": {
                    "bullet": {"listId": "l1"},
                    "elements": [{"textRun": {"content": "top\n"}}]
                }
            }),
            json!({
                "paragraph": {
                    "bullet": {"listId": "l1", "nestingLevel": 1},
                    "elements": [{"textRun": {"content": "nested\n"}}]
                }
            }),
        ]);

        let md = render(&doc, Format::Markdown).unwrap();
        assert!(md.contains("- top"));
        assert!(md.contains("  - nested"));
    }

    #[test]
    fn test_inline_object_becomes_placeholder() {
        let doc = doc(vec![json!({
            "paragraph": {
                "elements": [
                    {"textRun": {"content": "see chart "}},
                    {"inlineObjectElement": {"inlineObjectId": "kix.abc123"}}
                ]
            }
        })]);

        for format in [Format::Markdown, Format::Text, Format::Html] {
            let rendered = render(&doc, format).unwrap();
            assert!(
                rendered.contains("[image: kix.abc123]"),
                "missing placeholder in {:?}: {}",
                format,
                rendered
            );
        }
    }

    #[test]
    fn test_table_rows() {
        let cell = |text: &str| {
            json!({"content": [{"paragraph": {"elements": [{"textRun": {"content": format!("{}\n", text)}}]}}]})
        };
        let doc = doc(vec![json!({
            "table": {
                "tableRows": [
                    {"tableCells": [cell("Name"), cell("Role")]},
                    {"tableCells": [cell("Ada"), cell("Engineer")]}
                ]
            }
        })]);

        let md = render(&doc, Format::Markdown).unwrap();
        assert!(md.contains("| Name | Role |"));
        assert!(md.contains("| Ada | Engineer |"));

        let text = render(&doc, Format::Text).unwrap();
        assert!(text.contains("Ada\tEngineer"));
    }

    #[test]
    fn test_table_of_contents_recursed() {
        let doc = doc(vec![json!({
            "tableOfContents": {
                "content": [paragraph("Chapter 1")]
            }
        })]);
        assert_eq!(render(&doc, Format::Text).unwrap(), "Chapter 1\n");
    }

    #[test]
    fn test_html_escapes_entities() {
        let doc = doc(vec![paragraph("a < b && c > d")]);
        let html = render(&doc, Format::Html).unwrap();
        assert!(html.contains("a &lt; b &amp;&amp; c &gt; d"));
    }

    #[test]
    fn test_empty_document() {
        let doc = doc(vec![]);
        assert_eq!(render(&doc, Format::Markdown).unwrap(), "");
    }
}
