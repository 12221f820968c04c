//! Google Slides rendering
//!
//! One block per slide, delimited by a literal `--- Slide N ---` marker
//! line. Page elements are ordered top-to-bottom then left-to-right by
//! their transforms; shape text runs are concatenated, images and other
//! visual elements become placeholder tokens.

use serde_json::Value;

use super::placeholder;
use crate::error::{Error, Result};

pub fn render(presentation: &Value) -> Result<String> {
    let slides = presentation
        .get("slides")
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Conversion("presentation has no slides".to_string()))?;

    let mut blocks = Vec::with_capacity(slides.len());
    for (index, slide) in slides.iter().enumerate() {
        blocks.push(render_slide(slide, index + 1));
    }

    Ok(blocks.join("\n"))
}

fn render_slide(slide: &Value, number: usize) -> String {
    let mut block = format!("--- Slide {} ---\n", number);

    let mut elements: Vec<&Value> = slide
        .get("pageElements")
        .and_then(|v| v.as_array())
        .map(|els| els.iter().collect())
        .unwrap_or_default();

    // Reading order: top-to-bottom, then left-to-right.
    elements.sort_by(|a, b| {
        let pos_a = element_position(a);
        let pos_b = element_position(b);
        pos_a
            .1
            .total_cmp(&pos_b.1)
            .then(pos_a.0.total_cmp(&pos_b.0))
    });

    for element in elements {
        render_element(element, &mut block);
    }

    block
}

/// (x, y) from the element transform; elements without one sort first.
fn element_position(element: &Value) -> (f64, f64) {
    let get = |key: &str| {
        element
            .pointer(&format!("/transform/{}", key))
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    };
    (get("translateX"), get("translateY"))
}

fn render_element(element: &Value, out: &mut String) {
    if let Some(shape) = element.get("shape") {
        let text = shape_text(shape);
        if !text.is_empty() {
            out.push_str(&text);
        }
    } else if element.get("image").is_some() {
        let id = element
            .get("objectId")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        out.push_str(&placeholder("image", id));
        out.push('\n');
    } else if let Some(table) = element.get("table") {
        render_table(table, out);
    } else if element.get("video").is_some() || element.get("sheetsChart").is_some() {
        let id = element
            .get("objectId")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        out.push_str(&placeholder("embedded object", id));
        out.push('\n');
    }
}

/// Concatenated text runs of a shape, one line per paragraph.
fn shape_text(shape: &Value) -> String {
    let Some(elements) = shape.pointer("/text/textElements").and_then(|v| v.as_array()) else {
        return String::new();
    };

    let mut text = String::new();
    for element in elements {
        if let Some(content) = element.pointer("/textRun/content").and_then(|v| v.as_str()) {
            text.push_str(content);
        }
    }

    // Slides text runs carry their own newlines; normalize the tail.
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

fn render_table(table: &Value, out: &mut String) {
    let Some(rows) = table.get("tableRows").and_then(|v| v.as_array()) else {
        return;
    };
    for row in rows {
        let cells: Vec<String> = row
            .get("tableCells")
            .and_then(|v| v.as_array())
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| shape_text(cell).trim_end().to_string())
                    .collect()
            })
            .unwrap_or_default();
        if !cells.is_empty() {
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_box(text: &str, x: f64, y: f64) -> Value {
        json!({
            "objectId": "shape",
            "transform": {"translateX": x, "translateY": y},
            "shape": {"text": {"textElements": [
                {"textRun": {"content": format!("{}\n", text)}}
            ]}}
        })
    }

    #[test]
    fn test_missing_slides_is_conversion_error() {
        let err = render(&json!({"presentationId": "p"})).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
    }

    #[test]
    fn test_n_slides_yield_n_delimited_blocks_in_order() {
        let presentation = json!({
            "slides": [
                {"pageElements": [text_box("Intro", 0.0, 0.0)]},
                {"pageElements": [text_box("Middle", 0.0, 0.0)]},
                {"pageElements": []},
            ]
        });

        let rendered = render(&presentation).unwrap();
        let markers: Vec<&str> = rendered
            .lines()
            .filter(|l| l.starts_with("--- Slide"))
            .collect();
        assert_eq!(
            markers,
            vec!["--- Slide 1 ---", "--- Slide 2 ---", "--- Slide 3 ---"]
        );
        // content stays inside its slide's block
        let intro_pos = rendered.find("Intro").unwrap();
        let slide2_pos = rendered.find("--- Slide 2 ---").unwrap();
        assert!(intro_pos < slide2_pos);
    }

    #[test]
    fn test_elements_ordered_top_to_bottom_left_to_right() {
        let presentation = json!({
            "slides": [{"pageElements": [
                text_box("bottom-left", 10.0, 500.0),
                text_box("top-right", 400.0, 50.0),
                text_box("top-left", 10.0, 50.0),
            ]}]
        });

        let rendered = render(&presentation).unwrap();
        let top_left = rendered.find("top-left").unwrap();
        let top_right = rendered.find("top-right").unwrap();
        let bottom_left = rendered.find("bottom-left").unwrap();
        assert!(top_left < top_right);
        assert!(top_right < bottom_left);
    }

    #[test]
    fn test_image_placeholder() {
        let presentation = json!({
            "slides": [{"pageElements": [
                {"objectId": "img42", "image": {"contentUrl": "https://example.com/x.png"}}
            ]}]
        });
        let rendered = render(&presentation).unwrap();
        assert!(rendered.contains("[image: img42]"));
        assert!(!rendered.contains("example.com"));
    }

    #[test]
    fn test_slide_table() {
        let cell = |text: &str| {
            json!({"text": {"textElements": [{"textRun": {"content": format!("{}\n", text)}}]}})
        };
        let presentation = json!({
            "slides": [{"pageElements": [{
                "objectId": "t1",
                "table": {"tableRows": [
                    {"tableCells": [cell("a"), cell("b")]}
                ]}
            }]}]
        });
        let rendered = render(&presentation).unwrap();
        assert!(rendered.contains("a\tb"));
    }

    #[test]
    fn test_empty_presentation() {
        let rendered = render(&json!({"slides": []})).unwrap();
        assert_eq!(rendered, "");
    }
}
