//! Text rendering of view trees

use rawview_plugin_api::ViewElement;

const INDENT: &str = "  ";

/// Render `view` as an indented outline: label, then its lines, then its
/// children one level deeper.
pub fn render_tree(view: &ViewElement) -> String {
    let mut out = String::new();
    write_element(&mut out, view, 0);
    out
}

fn write_element(out: &mut String, view: &ViewElement, depth: usize) {
    let pad = INDENT.repeat(depth);
    out.push_str(&pad);
    out.push_str(&view.label);
    out.push('\n');
    for line in &view.lines {
        out.push_str(&pad);
        out.push_str(INDENT);
        out.push_str(line);
        out.push('\n');
    }
    for child in &view.children {
        write_element(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_tree_indents_children() {
        let view = ViewElement::new("sample.raw")
            .with_line("3 bytes")
            .with_child(ViewElement::new("Hex dump").with_line("00000000  01 02 03"));

        assert_eq!(
            render_tree(&view),
            "sample.raw\n  3 bytes\n  Hex dump\n    00000000  01 02 03\n"
        );
    }

    #[test]
    fn test_empty_element_is_just_label() {
        assert_eq!(render_tree(&ViewElement::new("empty")), "empty\n");
    }
}
