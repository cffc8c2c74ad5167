//! HTML-like attribute values.
//!
//! Values written as `<...>` in DOT text, or passed through [`strdup_html`],
//! keep their markup. They are checked when the owning graph is laid out;
//! renderers draw the markup-free text.

use std::sync::LazyLock;

use regex::Regex;

use super::graph::Value;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)\b[^<>]*?(/?)>").expect("tag pattern is valid")
});

const CONTAINERS: &[&str] = &[
    "TABLE", "TR", "TD", "FONT", "B", "I", "U", "O", "S", "SUB", "SUP",
];
const EMPTY_ELEMENTS: &[&str] = &["BR", "HR", "VR", "IMG"];

/// Mark `text` as an HTML-like value.
pub fn strdup_html(text: &str) -> Value {
    Value {
        text: text.to_string(),
        html: true,
    }
}

/// Check that every tag is known and properly nested.
pub fn validate(text: &str) -> Result<(), String> {
    let mut open: Vec<String> = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        check_text(&text[last..whole.start()])?;
        last = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_uppercase();
        let self_closing = !caps[3].is_empty();

        if EMPTY_ELEMENTS.contains(&name.as_str()) {
            if closing && open.last() == Some(&name) {
                open.pop();
            }
            continue;
        }
        if !CONTAINERS.contains(&name.as_str()) {
            return Err(format!("unknown HTML element <{}>", &caps[2]));
        }
        if self_closing {
            continue;
        }
        if closing {
            match open.pop() {
                Some(top) if top == name => {}
                Some(top) => return Err(format!("</{name}> does not close <{top}>")),
                None => return Err(format!("</{name}> has no opening tag")),
            }
        } else {
            open.push(name);
        }
    }
    check_text(&text[last..])?;

    match open.pop() {
        Some(top) => Err(format!("<{top}> is never closed")),
        None => Ok(()),
    }
}

fn check_text(segment: &str) -> Result<(), String> {
    if segment.contains('<') || segment.contains('>') {
        return Err(format!("stray markup near '{}'", segment.trim()));
    }
    Ok(())
}

/// Markup-free text: `<BR/>` becomes a line break, other tags vanish and the
/// basic entities are decoded.
pub fn strip(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in TAG.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&text[last..whole.start()]);
        if caps[2].eq_ignore_ascii_case("BR") {
            out.push('\n');
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[path = "../../tests/rust/test_engine_html.rs"]
mod tests;
