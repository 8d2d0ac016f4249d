//! Presentational hints.
//!
//! [WHATWG HTML § 15.3 Presentational hints](https://html.spec.whatwg.org/multipage/rendering.html#presentational-hints)
//!
//! Legacy attributes such as `bgcolor` or `cellpadding` are translated into
//! declarations that enter the cascade just above the user-agent sheet.

use lumen_dom::{DomTree, ElementData, NodeId};

use crate::parser::Declaration;
use crate::style::values::{ColorValue, format_number, legacy_font_size};

fn hint(name: &str, value: impl Into<String>) -> Declaration {
    Declaration {
        name: name.to_string(),
        value: value.into(),
        important: false,
    }
}

/// [§ 2.3.4.4 Parsing dimension values](https://html.spec.whatwg.org/multipage/common-microsyntaxes.html#rules-for-parsing-dimension-values)
///
/// `"50"` is pixels, `"50%"` a percentage; anything else is ignored.
fn dimension(attr: &str) -> Option<String> {
    let attr = attr.trim();
    if let Some(pct) = attr.strip_suffix('%') {
        let value: f32 = pct.trim().parse().ok()?;
        return Some(format!("{}%", format_number(value)));
    }
    let value: f32 = attr.strip_suffix("px").unwrap_or(attr).trim().parse().ok()?;
    (value >= 0.0).then(|| format!("{}px", format_number(value)))
}

fn pixels(attr: &str) -> Option<f32> {
    attr.trim().parse::<f32>().ok().filter(|v| *v >= 0.0)
}

/// [§ 2.3.6 Colors](https://html.spec.whatwg.org/multipage/common-microsyntaxes.html#rules-for-parsing-a-legacy-colour-value)
///
/// Legacy color attributes accept named colors and hex with or without `#`.
fn legacy_color(attr: &str) -> Option<String> {
    ColorValue::parse(attr.trim()).map(|c| c.to_hex_string())
}

/// The nearest enclosing `table` element of a cell or row.
fn enclosing_table(tree: &DomTree, id: NodeId) -> Option<&ElementData> {
    tree.ancestors(id)
        .filter_map(|a| tree.as_element(a))
        .find(|e| e.tag_name == "table")
}

/// Declarations implied by `element`'s attributes, in application order.
#[must_use]
pub fn presentational_hints(tree: &DomTree, id: NodeId, element: &ElementData) -> Vec<Declaration> {
    let mut out = Vec::new();
    let tag = element.tag_name.as_str();

    // [§ 15.3.1 Hidden elements](https://html.spec.whatwg.org/multipage/rendering.html#hidden-elements)
    // "[hidden] { display: none; }"
    if element.attr("hidden").is_some() {
        out.push(hint("display", "none"));
    }
    if let Some(dir) = element.attr("dir") {
        let dir = dir.trim().to_ascii_lowercase();
        if dir == "ltr" || dir == "rtl" {
            out.push(hint("direction", dir));
        }
    }

    // "The bgcolor attribute ... maps to the background-color property."
    if matches!(tag, "body" | "table" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th")
        && let Some(color) = element.attr("bgcolor").and_then(legacy_color)
    {
        out.push(hint("background-color", color));
    }
    if tag == "body"
        && let Some(color) = element.attr("text").and_then(legacy_color)
    {
        out.push(hint("color", color));
    }

    // "The width and height attributes map to the dimension properties."
    if matches!(tag, "img" | "table" | "td" | "th" | "col" | "hr" | "iframe" | "video" | "canvas") {
        if let Some(width) = element.attr("width").and_then(dimension) {
            out.push(hint("width", width));
        }
        if tag != "table"
            && let Some(height) = element.attr("height").and_then(dimension)
        {
            out.push(hint("height", height));
        }
    }

    if let Some(align) = element.attr("align").map(|a| a.trim().to_ascii_lowercase()) {
        match (tag, align.as_str()) {
            // [§ 15.4.3 Attributes for embedded content and images](https://html.spec.whatwg.org/multipage/rendering.html#attributes-for-embedded-content-and-images)
            ("img" | "table", "left" | "right") => out.push(hint("float", align)),
            ("table", "center") => {
                out.push(hint("margin-left", "auto"));
                out.push(hint("margin-right", "auto"));
            }
            ("img", "middle" | "top" | "bottom") => out.push(hint("vertical-align", align)),
            // [§ 15.3.3 Flow content](https://html.spec.whatwg.org/multipage/rendering.html#flow-content-3)
            (
                "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "td" | "th" | "tr" | "caption"
                | "thead" | "tbody" | "tfoot",
                "left" | "right" | "center" | "justify",
            ) => out.push(hint("text-align", align)),
            _ => {}
        }
    }
    if matches!(tag, "td" | "th" | "tr" | "thead" | "tbody" | "tfoot") {
        let valign = element
            .attr("valign")
            .or_else(|| {
                // A row's valign also reaches cells without their own.
                tree.parent(id)
                    .and_then(|p| tree.as_element(p))
                    .filter(|p| p.tag_name == "tr" && matches!(tag, "td" | "th"))
                    .and_then(|p| p.attr("valign"))
            })
            .map(|v| v.trim().to_ascii_lowercase());
        if let Some(valign) = valign
            && matches!(valign.as_str(), "top" | "middle" | "bottom" | "baseline")
        {
            out.push(hint("vertical-align", valign));
        }
        if matches!(tag, "td" | "th") && element.attr("nowrap").is_some() {
            out.push(hint("white-space", "nowrap"));
        }
    }

    // [§ 15.3.10 Tables](https://html.spec.whatwg.org/multipage/rendering.html#tables-2)
    if tag == "table" {
        if let Some(border) = element.attr("border") {
            // "border" with no number means 1.
            let width = pixels(border).unwrap_or(1.0);
            if width > 0.0 {
                out.push(hint("border", format!("{}px outset", format_number(width))));
            }
        }
        if let Some(spacing) = element.attr("cellspacing").and_then(pixels) {
            out.push(hint("border-spacing", format!("{}px", format_number(spacing))));
        }
    }
    if matches!(tag, "td" | "th")
        && let Some(table) = enclosing_table(tree, id)
    {
        if let Some(padding) = table.attr("cellpadding").and_then(pixels) {
            out.push(hint("padding", format!("{}px", format_number(padding))));
        }
        if table.attr("border").is_some_and(|b| pixels(b).unwrap_or(1.0) > 0.0) {
            out.push(hint("border", "1px inset"));
        }
    }

    if tag == "img" {
        if let Some(border) = element.attr("border").and_then(pixels) {
            out.push(hint("border", format!("{}px solid", format_number(border))));
        }
        if let Some(h) = element.attr("hspace").and_then(pixels) {
            out.push(hint("margin-left", format!("{}px", format_number(h))));
            out.push(hint("margin-right", format!("{}px", format_number(h))));
        }
        if let Some(v) = element.attr("vspace").and_then(pixels) {
            out.push(hint("margin-top", format!("{}px", format_number(v))));
            out.push(hint("margin-bottom", format!("{}px", format_number(v))));
        }
    }

    // [§ 15.3.8 The font element](https://html.spec.whatwg.org/multipage/rendering.html#phrasing-content-3)
    if tag == "font" {
        if let Some(color) = element.attr("color").and_then(legacy_color) {
            out.push(hint("color", color));
        }
        if let Some(face) = element.attr("face").filter(|f| !f.trim().is_empty()) {
            out.push(hint("font-family", face.trim()));
        }
        if let Some(size) = element.attr("size").and_then(legacy_font_size) {
            out.push(hint("font-size", format!("{}px", format_number(size))));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tree: &mut DomTree, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(tag);
        for (name, value) in attrs {
            let _ = data.attrs.insert((*name).to_string(), (*value).to_string());
        }
        tree.append_element(parent, data)
    }

    fn hints_of(tree: &DomTree, id: NodeId) -> Vec<(String, String)> {
        let element = tree.as_element(id).unwrap();
        presentational_hints(tree, id, element)
            .into_iter()
            .map(|d| (d.name, d.value))
            .collect()
    }

    #[test]
    fn test_table_attributes_reach_cells() {
        let mut tree = DomTree::new();
        let table = el(
            &mut tree,
            NodeId::ROOT,
            "table",
            &[("border", "2"), ("cellpadding", "4"), ("cellspacing", "0")],
        );
        let tr = el(&mut tree, table, "tr", &[("valign", "top")]);
        let td = el(&mut tree, tr, "td", &[("bgcolor", "ff0000")]);

        let table_hints = hints_of(&tree, table);
        assert!(table_hints.contains(&("border".into(), "2px outset".into())));
        assert!(table_hints.contains(&("border-spacing".into(), "0px".into())));

        let cell_hints = hints_of(&tree, td);
        assert!(cell_hints.contains(&("background-color".into(), "#ff0000".into())));
        assert!(cell_hints.contains(&("vertical-align".into(), "top".into())));
        assert!(cell_hints.contains(&("padding".into(), "4px".into())));
        assert!(cell_hints.contains(&("border".into(), "1px inset".into())));
    }

    #[test]
    fn test_font_and_image_hints() {
        let mut tree = DomTree::new();
        let font = el(&mut tree, NodeId::ROOT, "font", &[("color", "red"), ("size", "+1")]);
        let img = el(&mut tree, NodeId::ROOT, "img", &[("width", "50%"), ("align", "right")]);
        assert_eq!(
            hints_of(&tree, font),
            vec![
                ("color".to_string(), "#ff0000".to_string()),
                ("font-size".to_string(), "18px".to_string())
            ]
        );
        let img_hints = hints_of(&tree, img);
        assert!(img_hints.contains(&("width".into(), "50%".into())));
        assert!(img_hints.contains(&("float".into(), "right".into())));
    }
}
