//! Keyword-valued properties.
//!
//! Each enum parses from its CSS keyword (ASCII case-insensitive) and
//! prints back as that keyword, so HTML export can write it unchanged.

use std::str::FromStr;

use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Parse a keyword enum from raw declaration text.
#[must_use]
pub fn parse_keyword<T: FromStr>(text: &str) -> Option<T> {
    text.trim().parse().ok()
}

/// [§ 2 'display'](https://www.w3.org/TR/css-display-3/#the-display-properties)
///
/// The box kinds this engine lays out. Header and footer groups lay out as
/// plain row groups, captions as blocks, and columns generate no box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DisplayKind {
    /// `block`
    Block,
    /// `inline`
    #[default]
    Inline,
    /// `inline-block`
    InlineBlock,
    /// `list-item`
    ListItem,
    /// `table` (also `inline-table`)
    #[strum(to_string = "table", serialize = "inline-table")]
    Table,
    /// `table-row-group`, `table-header-group`, `table-footer-group`
    #[strum(
        to_string = "table-row-group",
        serialize = "table-header-group",
        serialize = "table-footer-group"
    )]
    TableRowGroup,
    /// `table-row`
    TableRow,
    /// `table-cell`
    TableCell,
    /// `none` (also `table-column` and `table-column-group`)
    #[strum(
        to_string = "none",
        serialize = "table-column",
        serialize = "table-column-group"
    )]
    None,
}

impl DisplayKind {
    /// Parse `display`, mapping `table-caption` to a block.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if text.trim().eq_ignore_ascii_case("table-caption") {
            return Some(Self::Block);
        }
        parse_keyword(text)
    }

    /// [§ 9.2.1 Block-level elements](https://www.w3.org/TR/CSS2/visuren.html#block-boxes)
    #[must_use]
    pub const fn is_block_level(self) -> bool {
        matches!(
            self,
            Self::Block
                | Self::ListItem
                | Self::Table
                | Self::TableRowGroup
                | Self::TableRow
                | Self::TableCell
        )
    }
}

/// [§ 9.5.1 'float'](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Float {
    /// Not floated.
    #[default]
    None,
    /// Floated to the left edge.
    Left,
    /// Floated to the right edge.
    Right,
}

/// [§ 9.5.2 'clear'](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Clear {
    /// No clearance.
    #[default]
    None,
    /// Clear left floats.
    Left,
    /// Clear right floats.
    Right,
    /// Clear all floats.
    Both,
}

/// [§ 9.3.1 'position'](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Position {
    /// Normal flow.
    #[default]
    Static,
    /// Offset after normal-flow layout.
    Relative,
    /// Out of flow, against the nearest positioned ancestor.
    Absolute,
    /// Out of flow, against the viewport.
    Fixed,
}

impl Position {
    /// Absolute or fixed.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }

    /// Anything but static.
    #[must_use]
    pub const fn is_positioned(self) -> bool {
        !matches!(self, Self::Static)
    }
}

/// [§ 16.2 'text-align'](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TextAlign {
    /// Flush left.
    #[strum(to_string = "left", serialize = "start")]
    Left,
    /// Flush right.
    #[strum(to_string = "right", serialize = "end")]
    Right,
    /// Centered.
    Center,
    /// Both edges flush, except the last line.
    Justify,
}

/// [§ 16.6 'white-space'](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WhiteSpace {
    /// Collapse and wrap.
    #[default]
    Normal,
    /// Preserve, never wrap.
    Pre,
    /// Collapse, never wrap.
    Nowrap,
    /// Preserve and wrap.
    PreWrap,
    /// Collapse spaces, keep newlines, wrap.
    PreLine,
}

impl WhiteSpace {
    /// Whether runs of spaces collapse to one.
    #[must_use]
    pub const fn collapses_spaces(self) -> bool {
        matches!(self, Self::Normal | Self::Nowrap | Self::PreLine)
    }

    /// Whether newlines in the source force a break.
    #[must_use]
    pub const fn preserves_newlines(self) -> bool {
        matches!(self, Self::Pre | Self::PreWrap | Self::PreLine)
    }

    /// Whether lines may wrap at soft break opportunities.
    #[must_use]
    pub const fn wraps(self) -> bool {
        matches!(self, Self::Normal | Self::PreWrap | Self::PreLine)
    }
}

/// [§ 5.2 'word-break'](https://www.w3.org/TR/css-text-3/#word-break-property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WordBreak {
    /// Break only between words.
    #[default]
    Normal,
    /// Break anywhere.
    BreakAll,
    /// Break a word only when it cannot fit on an empty line.
    BreakWord,
}

/// [§ 2.1 'direction'](https://www.w3.org/TR/css-writing-modes-3/#direction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Direction {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

/// [§ 12.5.1 'list-style-type'](https://www.w3.org/TR/CSS2/generate.html#list-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ListStyleType {
    /// A filled circle.
    #[default]
    Disc,
    /// A hollow circle.
    Circle,
    /// A filled square.
    Square,
    /// 1, 2, 3, ...
    Decimal,
    /// a, b, c, ...
    #[strum(to_string = "lower-alpha", serialize = "lower-latin")]
    LowerAlpha,
    /// A, B, C, ...
    #[strum(to_string = "upper-alpha", serialize = "upper-latin")]
    UpperAlpha,
    /// i, ii, iii, ...
    LowerRoman,
    /// I, II, III, ...
    UpperRoman,
    /// No marker.
    None,
}

/// [§ 11.2 'visibility'](https://www.w3.org/TR/CSS2/visufx.html#visibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Visibility {
    /// Painted.
    #[default]
    Visible,
    /// Takes space but paints nothing.
    #[strum(to_string = "hidden", serialize = "collapse")]
    Hidden,
}

/// [§ 11.1.1 'overflow'](https://www.w3.org/TR/CSS2/visufx.html#overflow)
///
/// There is no scrolling inside documents, so `scroll` and `auto` clip
/// like `hidden`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Overflow {
    /// Content may paint outside the box.
    #[default]
    Visible,
    /// Content is clipped to the padding box.
    #[strum(to_string = "hidden", serialize = "scroll", serialize = "auto")]
    Hidden,
}

/// [§ 4.2 'border-style'](https://www.w3.org/TR/css-backgrounds-3/#border-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BorderStyle {
    /// No border; the used width is zero.
    #[default]
    None,
    /// Like none, but wins border conflicts in tables.
    Hidden,
    /// A single solid line.
    Solid,
    /// A series of dashes.
    Dashed,
    /// A series of dots.
    Dotted,
    /// Two parallel lines.
    Double,
    /// Looks embedded.
    Inset,
    /// Looks raised.
    Outset,
    /// Carved; painted as inset.
    Groove,
    /// Extruded; painted as outset.
    Ridge,
}

impl BorderStyle {
    /// Whether a border with this style has zero used width.
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None | Self::Hidden)
    }
}

/// [§ 3.4 'background-repeat'](https://www.w3.org/TR/css-backgrounds-3/#background-repeat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum BackgroundRepeat {
    /// Tile both ways.
    #[default]
    Repeat,
    /// Tile horizontally.
    RepeatX,
    /// Tile vertically.
    RepeatY,
    /// One copy.
    NoRepeat,
}

/// [§ 10.8.1 'vertical-align'](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum VerticalAlign {
    /// Align baselines.
    #[default]
    Baseline,
    /// Lower the baseline to subscript position.
    Sub,
    /// Raise the baseline to superscript position.
    Super,
    /// Align the top with the line box top.
    Top,
    /// Align the bottom with the line box bottom.
    Bottom,
    /// Center on the parent's baseline plus half the x-height.
    Middle,
    /// Align the top with the parent's text top.
    TextTop,
    /// Align the bottom with the parent's text bottom.
    TextBottom,
}

/// [§ 3.3 'font-style'](https://www.w3.org/TR/css-fonts-4/#font-style-prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic face.
    Italic,
    /// Slanted face; rendered as italic.
    Oblique,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_parse_and_print_canonically() {
        assert_eq!(DisplayKind::parse("TABLE-HEADER-GROUP"), Some(DisplayKind::TableRowGroup));
        assert_eq!(DisplayKind::TableRowGroup.to_string(), "table-row-group");
        assert_eq!(DisplayKind::parse("table-caption"), Some(DisplayKind::Block));
        assert_eq!(parse_keyword::<Overflow>("auto"), Some(Overflow::Hidden));
        assert_eq!(WhiteSpace::PreWrap.to_string(), "pre-wrap");
        assert_eq!(parse_keyword::<ListStyleType>("upper-roman"), Some(ListStyleType::UpperRoman));
    }

    #[test]
    fn test_unknown_keyword_is_none() {
        assert_eq!(parse_keyword::<Float>("middle"), None);
    }
}
