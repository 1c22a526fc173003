#![forbid(unsafe_code)]

//! Text snapshots of element trees.
//!
//! One line per element, children indented by two spaces:
//!
//! ```text
//! Window "Player" [open]
//!   Label "Player"
//!   Field<f32> "speed"
//!     Label "speed"
//!   Button "Reset"
//! ```
//!
//! A line holds the kind, a value type for value elements, the element's
//! own text (or its header's text for containers), and state markers:
//! `[open]`/`[closed]`, `[disabled]`, `[locked]` (not interactable),
//! `[destroyed]`.

use std::fmt::Write as _;

use weave_element::{Element, ElementKind};

/// Render `root` and its materialized descendants.
#[must_use]
pub fn tree_snapshot(root: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &Element, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(element.kind().name());
    if let Some(type_name) = element.value_type_name() {
        let _ = write!(out, "<{}>", short_name(type_name));
    }
    if let Some(text) = caption(element) {
        let _ = write!(out, " {text:?}");
    }
    for marker in markers(element) {
        let _ = write!(out, " [{marker}]");
    }
    out.push('\n');
    for child in element.children() {
        write_element(out, &child, depth + 1);
    }
}

fn caption(element: &Element) -> Option<String> {
    element
        .text()
        .or_else(|| element.header().and_then(|header| header.text()))
}

fn markers(element: &Element) -> Vec<&'static str> {
    let mut markers = Vec::new();
    if element.is_destroyed() {
        markers.push("destroyed");
        return markers;
    }
    if matches!(
        element.kind(),
        ElementKind::Fold | ElementKind::Window | ElementKind::ListView
    ) {
        markers.push(if element.is_open() { "open" } else { "closed" });
    }
    if !element.is_enabled() {
        markers.push("disabled");
    }
    if !element.is_interactable() {
        markers.push("locked");
    }
    markers
}

/// `alloc::vec::Vec<u8>` -> `Vec<u8>`, `alloc::string::String` -> `String`.
fn short_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            segment.push(c);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
    out
}

/// Assert that an element tree renders to the expected snapshot.
///
/// Leading and trailing blank lines of `expected` are ignored, as is the
/// indentation common to all its lines, so snapshots can be written as
/// indented raw strings.
#[macro_export]
macro_rules! assert_tree {
    ($root:expr, $expected:expr $(,)?) => {{
        let actual = $crate::snapshot::tree_snapshot(&$root);
        let expected = $crate::snapshot::normalize_expected($expected);
        if actual != expected {
            panic!(
                "element tree mismatch\n--- expected ---\n{}--- actual ---\n{}",
                expected, actual
            );
        }
    }};
}

#[doc(hidden)]
#[must_use]
pub fn normalize_expected(expected: &str) -> String {
    let lines: Vec<&str> = expected
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .collect();
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |i| i + 1);
    let lines = &lines[..end];
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = String::new();
    for line in lines {
        out.push_str(line.get(indent..).unwrap_or(""));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_strip_paths() {
        assert_eq!(short_name("alloc::string::String"), "String");
        assert_eq!(short_name("alloc::vec::Vec<u8>"), "Vec<u8>");
        assert_eq!(
            short_name("core::option::Option<alloc::string::String>"),
            "Option<String>"
        );
    }

    #[test]
    fn normalize_strips_common_indent() {
        let expected = "
            Row
              Label \"a\"
        ";
        assert_eq!(normalize_expected(expected), "Row\n  Label \"a\"\n");
    }

    #[test]
    fn snapshot_lists_kinds_and_markers() {
        let fold = Element::fold(Element::label("More"), [Element::label("a")]);
        fold.set_enabled(false);
        assert_tree!(
            fold,
            r#"
            Fold "More" [closed] [disabled]
              Label "More"
              Label "a"
            "#
        );
    }
}
