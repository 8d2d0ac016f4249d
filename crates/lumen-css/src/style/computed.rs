//! CSS Computed Style
//!
//! [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)
//! "The computed value is the result of resolving the specified value..."
//!
//! Every property holds a concrete value. Inherited properties start from
//! the parent's computed value, the rest from their initial value; see
//! [`ComputedStyle::inherit_from`].

use lumen_common::WarningLog;
use serde::Serialize;

use crate::layout::font::FontSpec;
use crate::parser::{ComponentValue, Declaration, parse_component_values};

use super::values::{
    AutoLength, BackgroundRepeat, BorderSide, BorderStyle, Clear, ColorValue, CornerRadii,
    DEFAULT_FONT_SIZE_PX, Direction, DisplayKind, Float, FontStyle, LengthContext, LengthParse,
    LengthValue, LineHeight, ListStyleType, MEDIUM_BORDER_PX, Overflow, Position, Sides,
    THICK_BORDER_PX, THIN_BORDER_PX, TextAlign, TextDecoration, VerticalAlign, Visibility,
    WhiteSpace, WordBreak, absolute_font_size, format_number, parse_font_family,
    parse_font_weight, parse_keyword, parse_length, parse_single_color,
};

/// Computed styles for an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedStyle {
    // Inherited properties.
    /// [§ 3.1 'color'](https://www.w3.org/TR/css-color-4/#the-color-property)
    pub color: ColorValue,
    /// [§ 3.1 'font-family'](https://www.w3.org/TR/css-fonts-4/#font-family-prop)
    /// in preference order.
    pub font_family: Vec<String>,
    /// [§ 3.5 'font-size'](https://www.w3.org/TR/css-fonts-4/#font-size-prop),
    /// resolved to pixels during the cascade.
    pub font_size: f32,
    /// [§ 3.2 'font-weight'](https://www.w3.org/TR/css-fonts-4/#font-weight-prop)
    pub font_weight: u16,
    /// [§ 3.3 'font-style'](https://www.w3.org/TR/css-fonts-4/#font-style-prop)
    pub font_style: FontStyle,
    /// [§ 4.2 'line-height'](https://www.w3.org/TR/css-inline-3/#line-height-property)
    pub line_height: LineHeight,
    /// [§ 16.2 'text-align'](https://www.w3.org/TR/CSS2/text.html#alignment-prop)
    ///
    /// `None` is the initial value, which depends on `direction`.
    pub text_align: Option<TextAlign>,
    /// [§ 16.1 'text-indent'](https://www.w3.org/TR/CSS2/text.html#indentation-prop)
    pub text_indent: LengthValue,
    /// [§ 16.6 'white-space'](https://www.w3.org/TR/CSS2/text.html#white-space-prop)
    pub white_space: WhiteSpace,
    /// [§ 5.2 'word-break'](https://www.w3.org/TR/css-text-3/#word-break-property)
    pub word_break: WordBreak,
    /// [§ 2.1 'direction'](https://www.w3.org/TR/css-writing-modes-3/#direction)
    pub direction: Direction,
    /// [§ 12.5.1 'list-style-type'](https://www.w3.org/TR/CSS2/generate.html#list-style)
    pub list_style_type: ListStyleType,
    /// [§ 11.2 'visibility'](https://www.w3.org/TR/CSS2/visufx.html#visibility)
    pub visibility: Visibility,
    /// [§ 17.6.1 'border-spacing'](https://www.w3.org/TR/CSS2/tables.html#separated-borders)
    /// (horizontal, vertical).
    pub border_spacing: (LengthValue, LengthValue),
    /// [§ 16.3.1 'text-decoration'](https://www.w3.org/TR/CSS2/text.html#lining-striking-props)
    ///
    /// Propagated to descendants like an inherited property.
    pub text_decoration: TextDecoration,

    // Non-inherited properties.
    /// [§ 2 'display'](https://www.w3.org/TR/css-display-3/#the-display-properties)
    pub display: DisplayKind,
    /// [§ 9.5.1 'float'](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    pub float: Float,
    /// [§ 9.5.2 'clear'](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    pub clear: Clear,
    /// [§ 9.3.1 'position'](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
    pub position: Position,
    /// [§ 9.3.2 Box offsets](https://www.w3.org/TR/CSS2/visuren.html#position-props)
    /// 'top', 'right', 'bottom', 'left'.
    pub offsets: Sides<AutoLength>,
    /// [§ 10.2 'width'](https://www.w3.org/TR/CSS2/visudet.html#the-width-property)
    pub width: AutoLength,
    /// [§ 10.5 'height'](https://www.w3.org/TR/CSS2/visudet.html#the-height-property)
    pub height: AutoLength,
    /// [§ 10.4 'min-width'](https://www.w3.org/TR/CSS2/visudet.html#min-max-widths)
    pub min_width: LengthValue,
    /// 'max-width'; `None` is `none`.
    pub max_width: Option<LengthValue>,
    /// [§ 10.7 'min-height'](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
    pub min_height: LengthValue,
    /// 'max-height'; `None` is `none`.
    pub max_height: Option<LengthValue>,
    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    pub margin: Sides<AutoLength>,
    /// [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
    pub padding: Sides<LengthValue>,
    /// [§ 8.5 Border properties](https://www.w3.org/TR/CSS2/box.html#border-properties)
    pub border: Sides<BorderSide>,
    /// [§ 5 'border-radius'](https://www.w3.org/TR/css-backgrounds-3/#border-radius)
    pub border_radius: CornerRadii,
    /// [§ 3.2 'background-color'](https://www.w3.org/TR/css-backgrounds-3/#background-color)
    pub background_color: ColorValue,
    /// [§ 3.3 'background-image'](https://www.w3.org/TR/css-backgrounds-3/#background-image),
    /// the `url()` source.
    pub background_image: Option<String>,
    /// [§ 3.4 'background-repeat'](https://www.w3.org/TR/css-backgrounds-3/#background-repeat)
    pub background_repeat: BackgroundRepeat,
    /// [§ 3.6 'background-position'](https://www.w3.org/TR/css-backgrounds-3/#background-position)
    /// (x, y); percentages align the image's point with the box's point.
    pub background_position: (LengthValue, LengthValue),
    /// [§ 10.8.1 'vertical-align'](https://www.w3.org/TR/CSS2/visudet.html#propdef-vertical-align)
    pub vertical_align: VerticalAlign,
    /// [§ 11.1.1 'overflow'](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    pub overflow: Overflow,
    /// [§ 3.2 'opacity'](https://www.w3.org/TR/css-color-4/#transparency), 0 to 1.
    pub opacity: f32,
    /// [§ 4.4 'box-sizing'](https://www.w3.org/TR/css-sizing-3/#box-sizing)
    /// `true` for `border-box`.
    pub box_sizing_border_box: bool,
}

impl Default for ComputedStyle {
    /// Initial values of every property.
    fn default() -> Self {
        Self {
            color: ColorValue::BLACK,
            font_family: vec!["sans-serif".to_string()],
            font_size: DEFAULT_FONT_SIZE_PX,
            font_weight: 400,
            font_style: FontStyle::Normal,
            line_height: LineHeight::Normal,
            text_align: None,
            text_indent: LengthValue::ZERO,
            white_space: WhiteSpace::Normal,
            word_break: WordBreak::Normal,
            direction: Direction::Ltr,
            list_style_type: ListStyleType::Disc,
            visibility: Visibility::Visible,
            border_spacing: (LengthValue::ZERO, LengthValue::ZERO),
            text_decoration: TextDecoration::default(),
            display: DisplayKind::Inline,
            float: Float::None,
            clear: Clear::None,
            position: Position::Static,
            offsets: Sides::all(AutoLength::Auto),
            width: AutoLength::Auto,
            height: AutoLength::Auto,
            min_width: LengthValue::ZERO,
            max_width: None,
            min_height: LengthValue::ZERO,
            max_height: None,
            margin: Sides::all(AutoLength::ZERO),
            padding: Sides::all(LengthValue::ZERO),
            border: Sides::all(BorderSide::default()),
            border_radius: CornerRadii::default(),
            background_color: ColorValue::TRANSPARENT,
            background_image: None,
            background_repeat: BackgroundRepeat::Repeat,
            background_position: (LengthValue::Percent(0.0), LengthValue::Percent(0.0)),
            vertical_align: VerticalAlign::Baseline,
            overflow: Overflow::Visible,
            opacity: 1.0,
            box_sizing_border_box: false,
        }
    }
}

/// What a declaration is applied against.
#[derive(Debug, Clone, Copy)]
pub struct CascadeContext<'a> {
    /// The parent's computed style; `None` for the root element.
    pub parent: Option<&'a ComputedStyle>,
    /// Font size of the root element, for `rem`.
    pub root_font_size: f32,
    /// Sink for unknown units and unsupported properties.
    pub warnings: &'a WarningLog,
}

impl CascadeContext<'_> {
    fn parent_font_size(&self) -> f32 {
        self.parent.map_or(self.root_font_size, |p| p.font_size)
    }

    fn warn(&self, message: &str) {
        let _ = self.warnings.warn_once("CSS", message);
    }

    /// Parse one length, warning about unknown units.
    fn length(&self, v: &ComponentValue) -> Option<LengthValue> {
        match parse_length(v) {
            LengthParse::Length(len) => Some(len.absolutize()),
            LengthParse::UnknownUnit(unit) => {
                self.warn(&format!("unsupported unit '{unit}'"));
                None
            }
            LengthParse::NotALength => None,
        }
    }

    fn auto_length(&self, v: &ComponentValue) -> Option<AutoLength> {
        if v.is_ident("auto") {
            return Some(AutoLength::Auto);
        }
        self.length(v).map(AutoLength::Length)
    }

    /// [§ 4.3 'border-width'](https://www.w3.org/TR/css-backgrounds-3/#border-width)
    /// "<line-width> = <length [0,∞]> | thin | medium | thick"
    fn border_width(&self, v: &ComponentValue) -> Option<LengthValue> {
        match v.as_ident().map(str::to_ascii_lowercase).as_deref() {
            Some("thin") => Some(LengthValue::Px(THIN_BORDER_PX)),
            Some("medium") => Some(LengthValue::Px(MEDIUM_BORDER_PX)),
            Some("thick") => Some(LengthValue::Px(THICK_BORDER_PX)),
            Some(_) => None,
            None => self.length(v).filter(|len| !len.is_percent()),
        }
    }
}

impl ComputedStyle {
    /// [§ 7.2 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting)
    ///
    /// Start a child's style: inherited properties take the parent's
    /// computed values, everything else its initial value.
    #[must_use]
    pub fn inherit_from(parent: &Self) -> Self {
        Self {
            color: parent.color,
            font_family: parent.font_family.clone(),
            font_size: parent.font_size,
            font_weight: parent.font_weight,
            font_style: parent.font_style,
            line_height: parent.line_height,
            text_align: parent.text_align,
            text_indent: parent.text_indent,
            white_space: parent.white_space,
            word_break: parent.word_break,
            direction: parent.direction,
            list_style_type: parent.list_style_type,
            visibility: parent.visibility,
            border_spacing: parent.border_spacing,
            text_decoration: parent.text_decoration,
            ..Self::default()
        }
    }

    /// [§ 6.4 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
    ///
    /// Apply one declaration. Invalid values are ignored, leaving the
    /// previous value in place.
    pub fn apply_declaration(&mut self, decl: &Declaration, ctx: &CascadeContext<'_>) {
        let keyword = decl.value.trim().to_ascii_lowercase();
        // [§ 7.3 Explicit Defaulting](https://www.w3.org/TR/css-cascade-4/#defaulting-keywords)
        match keyword.as_str() {
            "inherit" => {
                let initial = Self::default();
                self.copy_property(&decl.name, ctx.parent.unwrap_or(&initial));
                return;
            }
            "initial" => {
                self.copy_property(&decl.name, &Self::default());
                return;
            }
            _ => {}
        }

        let values = parse_component_values(&decl.value);
        let first = values.first();
        let name = decl.name.as_str();
        match name {
            "display" => set(&mut self.display, DisplayKind::parse(&keyword)),
            "color" => set(&mut self.color, first.and_then(parse_single_color)),
            "background-color" => set(&mut self.background_color, first.and_then(parse_single_color)),
            "font-family" => set(&mut self.font_family, parse_font_family(&decl.value)),
            "font-size" => {
                if let Some(size) = first.and_then(|v| Self::resolve_font_size(v, ctx)) {
                    self.font_size = size;
                }
            }
            "font-weight" => {
                let parent = ctx.parent.map_or(400, |p| p.font_weight);
                set(&mut self.font_weight, first.and_then(|v| parse_font_weight(v, parent)));
            }
            "font-style" => set(&mut self.font_style, parse_keyword(&keyword)),
            "font" => self.apply_font_shorthand(&values, ctx),
            "line-height" => {
                let line_height = first.and_then(|v| Self::parse_line_height(v, ctx));
                set(&mut self.line_height, line_height);
            }
            "text-align" => set(&mut self.text_align, parse_keyword(&keyword).map(Some)),
            "text-indent" => set(&mut self.text_indent, first.and_then(|v| ctx.length(v))),
            "text-decoration" | "text-decoration-line" => {
                set(&mut self.text_decoration, TextDecoration::parse(&values));
            }
            "white-space" => set(&mut self.white_space, parse_keyword(&keyword)),
            "word-break" => set(&mut self.word_break, parse_keyword(&keyword)),
            "overflow-wrap" | "word-wrap" => {
                if keyword == "break-word" || keyword == "anywhere" {
                    self.word_break = WordBreak::BreakWord;
                }
            }
            "direction" => set(&mut self.direction, parse_keyword(&keyword)),
            "list-style-type" => set(&mut self.list_style_type, parse_keyword(&keyword)),
            "list-style" => set(
                &mut self.list_style_type,
                values.iter().find_map(|v| v.as_ident().and_then(parse_keyword)),
            ),
            "visibility" => set(&mut self.visibility, parse_keyword(&keyword)),
            "border-spacing" => {
                let lengths: Vec<LengthValue> = values.iter().filter_map(|v| ctx.length(v)).collect();
                match lengths.as_slice() {
                    [both] => self.border_spacing = (*both, *both),
                    [h, v] => self.border_spacing = (*h, *v),
                    _ => {}
                }
            }
            "float" => set(&mut self.float, parse_keyword(&keyword)),
            "clear" => set(&mut self.clear, parse_keyword(&keyword)),
            "position" => set(&mut self.position, parse_keyword(&keyword)),
            "top" | "right" | "bottom" | "left" => {
                if let Some(value) = first.and_then(|v| ctx.auto_length(v))
                    && let Some(side) = self.offsets.side_mut(name)
                {
                    *side = value;
                }
            }
            "width" => set(&mut self.width, first.and_then(|v| ctx.auto_length(v))),
            "height" => set(&mut self.height, first.and_then(|v| ctx.auto_length(v))),
            "min-width" => set(&mut self.min_width, first.and_then(|v| ctx.length(v))),
            "min-height" => set(&mut self.min_height, first.and_then(|v| ctx.length(v))),
            "max-width" => set_max_length(&mut self.max_width, first, ctx),
            "max-height" => set_max_length(&mut self.max_height, first, ctx),
            "margin" => {
                let parsed: Option<Vec<AutoLength>> = values.iter().map(|v| ctx.auto_length(v)).collect();
                set(&mut self.margin, parsed.as_deref().and_then(Sides::from_shorthand));
            }
            "padding" => {
                let parsed: Option<Vec<LengthValue>> = values.iter().map(|v| ctx.length(v)).collect();
                set(&mut self.padding, parsed.as_deref().and_then(Sides::from_shorthand));
            }
            "border" => {
                if let Some(side) = Self::parse_border_side(&values, ctx) {
                    self.border = Sides::all(side);
                }
            }
            "border-width" => {
                let parsed: Option<Vec<LengthValue>> = values.iter().map(|v| ctx.border_width(v)).collect();
                if let Some(widths) = parsed.as_deref().and_then(Sides::from_shorthand) {
                    self.border.top.width = widths.top;
                    self.border.right.width = widths.right;
                    self.border.bottom.width = widths.bottom;
                    self.border.left.width = widths.left;
                }
            }
            "border-style" => {
                let parsed: Option<Vec<BorderStyle>> =
                    values.iter().map(|v| v.as_ident().and_then(parse_keyword)).collect();
                if let Some(styles) = parsed.as_deref().and_then(Sides::from_shorthand) {
                    self.border.top.style = styles.top;
                    self.border.right.style = styles.right;
                    self.border.bottom.style = styles.bottom;
                    self.border.left.style = styles.left;
                }
            }
            "border-color" => {
                let parsed: Option<Vec<ColorValue>> = values.iter().map(parse_single_color).collect();
                if let Some(colors) = parsed.as_deref().and_then(Sides::from_shorthand) {
                    self.border.top.color = Some(colors.top);
                    self.border.right.color = Some(colors.right);
                    self.border.bottom.color = Some(colors.bottom);
                    self.border.left.color = Some(colors.left);
                }
            }
            "border-radius" => {
                // Elliptical radii after '/' are not supported; the
                // horizontal radii are used for both axes.
                let horizontal: Vec<LengthValue> = values
                    .iter()
                    .take_while(|v| **v != ComponentValue::Delim('/'))
                    .filter_map(|v| ctx.length(v))
                    .collect();
                set(&mut self.border_radius, CornerRadii::from_shorthand(&horizontal));
            }
            "background" => self.apply_background_shorthand(&values, ctx),
            "background-image" => {
                if keyword == "none" {
                    self.background_image = None;
                } else {
                    set(&mut self.background_image, first.and_then(url_of).map(Some));
                }
            }
            "background-repeat" => set(&mut self.background_repeat, parse_keyword(&keyword)),
            "background-position" => set(&mut self.background_position, parse_position(&values, ctx)),
            "vertical-align" => set(&mut self.vertical_align, parse_keyword(&keyword)),
            "overflow" | "overflow-x" | "overflow-y" => set(&mut self.overflow, parse_keyword(&keyword)),
            "opacity" => {
                if let Some(ComponentValue::Number(alpha)) = first {
                    self.opacity = alpha.clamp(0.0, 1.0);
                }
            }
            "box-sizing" => match keyword.as_str() {
                "border-box" => self.box_sizing_border_box = true,
                "content-box" => self.box_sizing_border_box = false,
                _ => {}
            },
            _ => {
                if !self.apply_border_longhand(name, &values, ctx)
                    && !self.apply_box_longhand(name, first, ctx)
                {
                    ctx.warn(&format!("unsupported property '{name}'"));
                }
            }
        }
    }

    /// `margin-top`, `padding-left` and friends.
    fn apply_box_longhand(&mut self, name: &str, first: Option<&ComponentValue>, ctx: &CascadeContext<'_>) -> bool {
        if let Some(side) = name.strip_prefix("margin-") {
            if let Some(value) = first.and_then(|v| ctx.auto_length(v))
                && let Some(slot) = self.margin.side_mut(side)
            {
                *slot = value;
            }
            return matches!(side, "top" | "right" | "bottom" | "left");
        }
        if let Some(side) = name.strip_prefix("padding-") {
            if let Some(value) = first.and_then(|v| ctx.length(v))
                && let Some(slot) = self.padding.side_mut(side)
            {
                *slot = value;
            }
            return matches!(side, "top" | "right" | "bottom" | "left");
        }
        false
    }

    /// `border-top`, `border-left-color` and friends.
    fn apply_border_longhand(&mut self, name: &str, values: &[ComponentValue], ctx: &CascadeContext<'_>) -> bool {
        let Some(rest) = name.strip_prefix("border-") else {
            return false;
        };
        let (side_name, part) = rest.split_once('-').unwrap_or((rest, ""));
        let parsed_side = match part {
            "" => Self::parse_border_side(values, ctx),
            _ => None,
        };
        let Some(side) = self.border.side_mut(side_name) else {
            return false;
        };
        let first = values.first();
        match part {
            "" => {
                if let Some(parsed) = parsed_side {
                    *side = parsed;
                }
            }
            "width" => set(&mut side.width, first.and_then(|v| ctx.border_width(v))),
            "style" => set(&mut side.style, first.and_then(|v| v.as_ident().and_then(parse_keyword))),
            "color" => set(&mut side.color, first.and_then(parse_single_color).map(Some)),
            _ => return false,
        }
        true
    }

    /// [§ 4.4 'border' shorthands](https://www.w3.org/TR/css-backgrounds-3/#border-shorthands)
    ///
    /// "Omitted values are set to their initial values."
    fn parse_border_side(values: &[ComponentValue], ctx: &CascadeContext<'_>) -> Option<BorderSide> {
        let mut side = BorderSide::default();
        for value in values {
            if let Some(style) = value.as_ident().and_then(parse_keyword::<BorderStyle>) {
                side.style = style;
            } else if let Some(width) = ctx.border_width(value) {
                side.width = width;
            } else if let Some(color) = parse_single_color(value) {
                side.color = Some(color);
            } else {
                return None;
            }
        }
        (!values.is_empty()).then_some(side)
    }

    /// [§ 3.10 'background'](https://www.w3.org/TR/css-backgrounds-3/#background)
    ///
    /// Color, image, repeat and position in any order; omitted parts reset.
    fn apply_background_shorthand(&mut self, values: &[ComponentValue], ctx: &CascadeContext<'_>) {
        let mut color = ColorValue::TRANSPARENT;
        let mut image = None;
        let mut repeat = BackgroundRepeat::Repeat;
        let mut position = Vec::new();
        for value in values {
            if let Some(url) = url_of(value) {
                image = Some(url);
            } else if let Some(r) = value.as_ident().and_then(parse_keyword::<BackgroundRepeat>) {
                repeat = r;
            } else if value.is_ident("none") {
                image = None;
            } else if is_position_component(value) {
                position.push(value.clone());
            } else if let Some(c) = parse_single_color(value) {
                color = c;
            } else {
                return;
            }
        }
        self.background_color = color;
        self.background_image = image;
        self.background_repeat = repeat;
        self.background_position = parse_position(&position, ctx)
            .unwrap_or((LengthValue::Percent(0.0), LengthValue::Percent(0.0)));
    }

    /// [§ 2.2 'font' shorthand](https://www.w3.org/TR/css-fonts-4/#font-prop)
    ///
    /// "[ <font-style> || <font-weight> ]? <font-size> [ / <line-height> ]?
    /// <font-family>"
    fn apply_font_shorthand(&mut self, values: &[ComponentValue], ctx: &CascadeContext<'_>) {
        let parent_weight = ctx.parent.map_or(400, |p| p.font_weight);
        let mut style = FontStyle::Normal;
        let mut weight = 400;
        let mut index = 0;
        while let Some(value) = values.get(index) {
            if let Some(s) = value.as_ident().and_then(parse_keyword::<FontStyle>) {
                style = s;
            } else if let Some(w) = parse_font_weight(value, parent_weight) {
                // A bare number here is a weight only if a size follows.
                weight = w;
            } else if value.is_ident("small-caps") {
            } else {
                break;
            }
            index += 1;
        }
        let Some(size) = values.get(index).and_then(|v| Self::resolve_font_size(v, ctx)) else {
            return;
        };
        index += 1;
        let mut line_height = LineHeight::Normal;
        if values.get(index) == Some(&ComponentValue::Delim('/')) {
            if let Some(lh) = values.get(index + 1).and_then(|v| Self::parse_line_height(v, ctx)) {
                line_height = lh;
            }
            index += 2;
        }
        let family_text = values[index.min(values.len())..]
            .iter()
            .filter_map(|v| match v {
                ComponentValue::Ident(name) | ComponentValue::String(name) => Some(name.clone()),
                ComponentValue::Comma => Some(",".to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");
        let Some(families) = parse_font_family(&family_text) else {
            return;
        };
        self.font_style = style;
        self.font_weight = weight;
        self.font_size = size;
        self.line_height = line_height;
        self.font_family = families;
    }

    /// [§ 3.5 'font-size'](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
    ///
    /// "<length-percentage [0,∞]>: ... Percentages ... refer to the parent
    /// element's font size." Font-relative units also use the parent's size.
    fn resolve_font_size(value: &ComponentValue, ctx: &CascadeContext<'_>) -> Option<f32> {
        let parent = ctx.parent_font_size();
        if let Some(ident) = value.as_ident() {
            return match ident.to_ascii_lowercase().as_str() {
                // "<relative-size>: [ larger | smaller ]"
                "larger" => Some(parent * 1.2),
                "smaller" => Some(parent / 1.2),
                other => absolute_font_size(other),
            };
        }
        let len = ctx.length(value)?;
        let size = match len {
            LengthValue::Vw(_) | LengthValue::Vh(_) => {
                ctx.warn("viewport units in font-size are ignored");
                return None;
            }
            other => other.to_px(
                parent,
                &LengthContext {
                    font_size: parent,
                    root_font_size: ctx.root_font_size,
                    ..LengthContext::default()
                },
            ),
        };
        (size >= 0.0).then_some(size)
    }

    fn parse_line_height(value: &ComponentValue, ctx: &CascadeContext<'_>) -> Option<LineHeight> {
        if value.is_ident("normal") {
            return Some(LineHeight::Normal);
        }
        if let ComponentValue::Number(factor) = value {
            return Some(LineHeight::Number(*factor));
        }
        ctx.length(value).map(LineHeight::Length)
    }

    /// Resolve font-relative lengths of inherited properties, so children
    /// inherit the computed pixel value rather than re-resolving it.
    ///
    /// [§ 4.2 'line-height'](https://www.w3.org/TR/css-inline-3/#line-height-property)
    /// "Computed value: the keyword normal or a number or an absolute length"
    pub fn finalize(&mut self, root_font_size: f32) {
        let ctx = LengthContext {
            font_size: self.font_size,
            root_font_size,
            ..LengthContext::default()
        };
        let absolute = |len: LengthValue, reference: f32| match len {
            LengthValue::Em(_) | LengthValue::Rem(_) => LengthValue::Px(len.to_px(reference, &ctx)),
            other => other,
        };
        if let LineHeight::Length(len) = self.line_height {
            let resolved = match len {
                LengthValue::Percent(_) => LengthValue::Px(len.to_px(self.font_size, &ctx)),
                other => absolute(other, self.font_size),
            };
            self.line_height = LineHeight::Length(resolved);
        }
        self.text_indent = absolute(self.text_indent, 0.0);
        self.border_spacing = (
            absolute(self.border_spacing.0, 0.0),
            absolute(self.border_spacing.1, 0.0),
        );
    }

    /// Copy one property (or every longhand of a shorthand) from `from`.
    fn copy_property(&mut self, name: &str, from: &Self) {
        match name {
            "color" => self.color = from.color,
            "font-family" => self.font_family.clone_from(&from.font_family),
            "font-size" => self.font_size = from.font_size,
            "font-weight" => self.font_weight = from.font_weight,
            "font-style" => self.font_style = from.font_style,
            "font" => {
                self.font_family.clone_from(&from.font_family);
                self.font_size = from.font_size;
                self.font_weight = from.font_weight;
                self.font_style = from.font_style;
                self.line_height = from.line_height;
            }
            "line-height" => self.line_height = from.line_height,
            "text-align" => self.text_align = from.text_align,
            "text-indent" => self.text_indent = from.text_indent,
            "text-decoration" => self.text_decoration = from.text_decoration,
            "white-space" => self.white_space = from.white_space,
            "word-break" => self.word_break = from.word_break,
            "direction" => self.direction = from.direction,
            "list-style-type" | "list-style" => self.list_style_type = from.list_style_type,
            "visibility" => self.visibility = from.visibility,
            "border-spacing" => self.border_spacing = from.border_spacing,
            "display" => self.display = from.display,
            "float" => self.float = from.float,
            "clear" => self.clear = from.clear,
            "position" => self.position = from.position,
            "width" => self.width = from.width,
            "height" => self.height = from.height,
            "min-width" => self.min_width = from.min_width,
            "min-height" => self.min_height = from.min_height,
            "max-width" => self.max_width = from.max_width,
            "max-height" => self.max_height = from.max_height,
            "margin" => self.margin = from.margin,
            "padding" => self.padding = from.padding,
            "border" => self.border = from.border,
            "border-radius" => self.border_radius = from.border_radius,
            "background" => {
                self.background_color = from.background_color;
                self.background_image.clone_from(&from.background_image);
                self.background_repeat = from.background_repeat;
                self.background_position = from.background_position;
            }
            "background-color" => self.background_color = from.background_color,
            "background-image" => self.background_image.clone_from(&from.background_image),
            "background-repeat" => self.background_repeat = from.background_repeat,
            "background-position" => self.background_position = from.background_position,
            "vertical-align" => self.vertical_align = from.vertical_align,
            "overflow" => self.overflow = from.overflow,
            "opacity" => self.opacity = from.opacity,
            "top" => self.offsets.top = from.offsets.top,
            "right" => self.offsets.right = from.offsets.right,
            "bottom" => self.offsets.bottom = from.offsets.bottom,
            "left" => self.offsets.left = from.offsets.left,
            other => {
                if let Some(side) = other.strip_prefix("margin-")
                    && let (Some(slot), Some(source)) = (self.margin.side_mut(side), from.margin.get(side))
                {
                    *slot = source;
                } else if let Some(side) = other.strip_prefix("padding-")
                    && let (Some(slot), Some(source)) = (self.padding.side_mut(side), from.padding.get(side))
                {
                    *slot = source;
                } else if let Some(side) = other.strip_prefix("border-")
                    && let (Some(slot), Some(source)) = (self.border.side_mut(side), from.border.get(side))
                {
                    *slot = source;
                }
            }
        }
    }

    /// Context for resolving this element's lengths.
    #[must_use]
    pub const fn length_context(&self, root_font_size: f32, viewport: (f32, f32)) -> LengthContext {
        LengthContext {
            font_size: self.font_size,
            root_font_size,
            viewport_width: viewport.0,
            viewport_height: viewport.1,
        }
    }

    /// Font request for text in this style.
    #[must_use]
    pub fn font_spec(&self) -> FontSpec {
        FontSpec {
            family: self
                .font_family
                .first()
                .cloned()
                .unwrap_or_else(|| "sans-serif".to_string()),
            size: self.font_size,
            bold: self.font_weight >= 600,
            italic: self.font_style != FontStyle::Normal,
        }
    }

    /// Effective `text-align`: the initial value follows `direction`.
    #[must_use]
    pub fn used_text_align(&self) -> TextAlign {
        self.text_align.unwrap_or(match self.direction {
            Direction::Ltr => TextAlign::Left,
            Direction::Rtl => TextAlign::Right,
        })
    }

    /// Whether the box is floated.
    #[must_use]
    pub fn is_floated(&self) -> bool {
        self.float != Float::None && !self.position.is_out_of_flow()
    }

    /// The color a border side is painted in.
    #[must_use]
    pub fn border_color(&self, side: &BorderSide) -> ColorValue {
        side.color.unwrap_or(self.color)
    }

    /// Declarations that reproduce this style, for HTML export.
    ///
    /// Inherited properties are listed when they differ from `parent`,
    /// the rest when they differ from their initial value.
    #[must_use]
    pub fn css_declarations(&self, parent: Option<&Self>) -> Vec<(String, String)> {
        let initial = Self::default();
        let base = parent.unwrap_or(&initial);
        let mut out: Vec<(String, String)> = Vec::new();
        let mut push = |name: &str, value: String| out.push((name.to_string(), value));

        if self.color != base.color {
            push("color", self.color.to_hex_string());
        }
        if self.font_family != base.font_family {
            push("font-family", self.font_family.join(", "));
        }
        if (self.font_size - base.font_size).abs() > 0.01 {
            push("font-size", format!("{}px", format_number(self.font_size)));
        }
        if self.font_weight != base.font_weight {
            push(
                "font-weight",
                match self.font_weight {
                    400 => "normal".to_string(),
                    700 => "bold".to_string(),
                    other => other.to_string(),
                },
            );
        }
        if self.font_style != base.font_style {
            push("font-style", self.font_style.to_string());
        }
        if self.line_height != base.line_height {
            push(
                "line-height",
                match self.line_height {
                    LineHeight::Normal => "normal".to_string(),
                    LineHeight::Number(n) => format_number(n),
                    LineHeight::Length(len) => len.to_css_string(),
                },
            );
        }
        if self.text_align != base.text_align
            && let Some(align) = self.text_align
        {
            push("text-align", align.to_string());
        }
        if self.text_indent != base.text_indent {
            push("text-indent", self.text_indent.to_css_string());
        }
        if self.text_decoration != base.text_decoration {
            push("text-decoration", self.text_decoration.to_css_string());
        }
        if self.white_space != base.white_space {
            push("white-space", self.white_space.to_string());
        }
        if self.word_break != base.word_break {
            push("word-break", self.word_break.to_string());
        }
        if self.direction != base.direction {
            push("direction", self.direction.to_string());
        }
        if self.list_style_type != base.list_style_type {
            push("list-style-type", self.list_style_type.to_string());
        }
        if self.visibility != base.visibility {
            push("visibility", self.visibility.to_string());
        }
        if self.border_spacing != base.border_spacing {
            push(
                "border-spacing",
                format!(
                    "{} {}",
                    self.border_spacing.0.to_css_string(),
                    self.border_spacing.1.to_css_string()
                ),
            );
        }

        if self.display != initial.display {
            push("display", self.display.to_string());
        }
        if self.float != initial.float {
            push("float", self.float.to_string());
        }
        if self.clear != initial.clear {
            push("clear", self.clear.to_string());
        }
        if self.position != initial.position {
            push("position", self.position.to_string());
        }
        for (name, value) in [
            ("top", self.offsets.top),
            ("right", self.offsets.right),
            ("bottom", self.offsets.bottom),
            ("left", self.offsets.left),
            ("width", self.width),
            ("height", self.height),
        ] {
            if !value.is_auto() {
                push(name, value.to_css_string());
            }
        }
        for (name, value) in [
            ("margin-top", self.margin.top),
            ("margin-right", self.margin.right),
            ("margin-bottom", self.margin.bottom),
            ("margin-left", self.margin.left),
        ] {
            if value != AutoLength::ZERO {
                push(name, value.to_css_string());
            }
        }
        for (name, value) in [
            ("padding-top", self.padding.top),
            ("padding-right", self.padding.right),
            ("padding-bottom", self.padding.bottom),
            ("padding-left", self.padding.left),
        ] {
            if value != LengthValue::ZERO {
                push(name, value.to_css_string());
            }
        }
        for (name, side) in [
            ("border-top", self.border.top),
            ("border-right", self.border.right),
            ("border-bottom", self.border.bottom),
            ("border-left", self.border.left),
        ] {
            if !side.style.is_none() {
                push(
                    name,
                    format!(
                        "{} {} {}",
                        side.width.to_css_string(),
                        side.style,
                        self.border_color(&side).to_hex_string()
                    ),
                );
            }
        }
        if self.min_width != LengthValue::ZERO {
            push("min-width", self.min_width.to_css_string());
        }
        if let Some(max) = self.max_width {
            push("max-width", max.to_css_string());
        }
        if self.min_height != LengthValue::ZERO {
            push("min-height", self.min_height.to_css_string());
        }
        if let Some(max) = self.max_height {
            push("max-height", max.to_css_string());
        }
        if !self.border_radius.is_zero() {
            let r = &self.border_radius;
            push(
                "border-radius",
                [r.top_left, r.top_right, r.bottom_right, r.bottom_left]
                    .iter()
                    .map(LengthValue::to_css_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        if !self.background_color.is_transparent() {
            push("background-color", self.background_color.to_hex_string());
        }
        if let Some(image) = &self.background_image {
            push("background-image", format!("url('{image}')"));
            push("background-repeat", self.background_repeat.to_string());
        }
        if self.vertical_align != initial.vertical_align {
            push("vertical-align", self.vertical_align.to_string());
        }
        if self.overflow != initial.overflow {
            push("overflow", self.overflow.to_string());
        }
        if self.opacity < 1.0 {
            push("opacity", format_number(self.opacity));
        }
        out
    }
}

/// Store `value` when parsing succeeded.
fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// `max-width` / `max-height`: `none` clears the limit, a length sets it.
fn set_max_length(slot: &mut Option<LengthValue>, value: Option<&ComponentValue>, ctx: &CascadeContext<'_>) {
    let Some(v) = value else {
        return;
    };
    if v.is_ident("none") {
        *slot = None;
    } else if let Some(len) = ctx.length(v) {
        *slot = Some(len);
    }
}

fn url_of(value: &ComponentValue) -> Option<String> {
    match value {
        ComponentValue::Function { name, args } if name == "url" => match args.first() {
            Some(ComponentValue::String(url)) if !url.is_empty() => Some(url.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn is_position_component(value: &ComponentValue) -> bool {
    matches!(
        value,
        ComponentValue::Dimension { .. } | ComponentValue::Percentage(_) | ComponentValue::Number(_)
    ) || ["left", "right", "top", "bottom", "center"]
        .iter()
        .any(|k| value.is_ident(k))
}

/// [§ 3.6 'background-position'](https://www.w3.org/TR/css-backgrounds-3/#background-position)
///
/// "If only one value is specified, the second value is assumed to be
/// 'center'." Keywords become percentages; `top`/`bottom` given first are
/// vertical.
fn parse_position(values: &[ComponentValue], ctx: &CascadeContext<'_>) -> Option<(LengthValue, LengthValue)> {
    let component = |v: &ComponentValue| -> Option<(LengthValue, Option<bool>)> {
        match v.as_ident().map(str::to_ascii_lowercase).as_deref() {
            Some("left") => Some((LengthValue::Percent(0.0), Some(true))),
            Some("right") => Some((LengthValue::Percent(100.0), Some(true))),
            Some("top") => Some((LengthValue::Percent(0.0), Some(false))),
            Some("bottom") => Some((LengthValue::Percent(100.0), Some(false))),
            Some("center") => Some((LengthValue::Percent(50.0), None)),
            Some(_) => None,
            None => ctx.length(v).map(|len| (len, None)),
        }
    };
    let center = LengthValue::Percent(50.0);
    match values {
        [only] => {
            let (value, horizontal) = component(only)?;
            Some(if horizontal == Some(false) {
                (center, value)
            } else {
                (value, center)
            })
        }
        [a, b] => {
            let (first, first_h) = component(a)?;
            let (second, second_h) = component(b)?;
            Some(if first_h == Some(false) || second_h == Some(true) {
                (second, first)
            } else {
                (first, second)
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, value: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            value: value.to_string(),
            important: false,
        }
    }

    fn apply(style: &mut ComputedStyle, parent: Option<&ComputedStyle>, name: &str, value: &str) {
        let warnings = WarningLog::new();
        let ctx = CascadeContext {
            parent,
            root_font_size: 16.0,
            warnings: &warnings,
        };
        style.apply_declaration(&decl(name, value), &ctx);
    }

    #[test]
    fn test_font_size_uses_parent() {
        let parent = ComputedStyle {
            font_size: 20.0,
            ..ComputedStyle::default()
        };
        let mut style = ComputedStyle::inherit_from(&parent);
        apply(&mut style, Some(&parent), "font-size", "2em");
        assert!((style.font_size - 40.0).abs() < 1e-4);
        apply(&mut style, Some(&parent), "font-size", "50%");
        assert!((style.font_size - 10.0).abs() < 1e-4);
        apply(&mut style, Some(&parent), "font-size", "2rem");
        assert!((style.font_size - 32.0).abs() < 1e-4);
        apply(&mut style, Some(&parent), "font-size", "10vw");
        assert!((style.font_size - 32.0).abs() < 1e-4);
    }

    #[test]
    fn test_margin_shorthand_and_longhand() {
        let mut style = ComputedStyle::default();
        apply(&mut style, None, "margin", "1px auto");
        assert_eq!(style.margin.left, AutoLength::Auto);
        assert_eq!(style.margin.top, AutoLength::Length(LengthValue::Px(1.0)));
        apply(&mut style, None, "margin-left", "2em");
        assert_eq!(style.margin.left, AutoLength::Length(LengthValue::Em(2.0)));
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let mut style = ComputedStyle::default();
        apply(&mut style, None, "width", "10px");
        apply(&mut style, None, "width", "banana");
        assert_eq!(style.width, AutoLength::Length(LengthValue::Px(10.0)));
        apply(&mut style, None, "color", "#zzzzzz");
        assert_eq!(style.color, ColorValue::BLACK);
    }

    #[test]
    fn test_inherit_keyword_copies_parent() {
        let parent = ComputedStyle {
            padding: Sides::all(LengthValue::Px(7.0)),
            ..ComputedStyle::default()
        };
        let mut style = ComputedStyle::inherit_from(&parent);
        assert_eq!(style.padding.top, LengthValue::ZERO);
        apply(&mut style, Some(&parent), "padding-top", "inherit");
        assert_eq!(style.padding.top, LengthValue::Px(7.0));
    }

    #[test]
    fn test_border_shorthand() {
        let mut style = ComputedStyle::default();
        apply(&mut style, None, "border", "2px dashed red");
        assert_eq!(style.border.left.style, BorderStyle::Dashed);
        assert_eq!(style.border.left.width, LengthValue::Px(2.0));
        assert_eq!(style.border.left.color, Some(ColorValue::rgb(255, 0, 0)));
        apply(&mut style, None, "border-top-style", "none");
        assert_eq!(style.border.top.style, BorderStyle::None);
    }

    #[test]
    fn test_background_shorthand() {
        let mut style = ComputedStyle::default();
        apply(&mut style, None, "background", "#fff url(bg.png) no-repeat right top");
        assert_eq!(style.background_color, ColorValue::WHITE);
        assert_eq!(style.background_image.as_deref(), Some("bg.png"));
        assert_eq!(style.background_repeat, BackgroundRepeat::NoRepeat);
        assert_eq!(
            style.background_position,
            (LengthValue::Percent(100.0), LengthValue::Percent(0.0))
        );
    }

    #[test]
    fn test_font_shorthand() {
        let mut style = ComputedStyle::default();
        apply(&mut style, None, "font", "italic bold 12px/1.5 'Helvetica Neue', Arial");
        assert_eq!(style.font_style, FontStyle::Italic);
        assert_eq!(style.font_weight, 700);
        assert!((style.font_size - 12.0).abs() < 1e-4);
        assert_eq!(style.line_height, LineHeight::Number(1.5));
        assert_eq!(style.font_family, vec!["Helvetica Neue", "Arial"]);
    }

    #[test]
    fn test_finalize_resolves_inherited_em() {
        let mut style = ComputedStyle {
            font_size: 10.0,
            line_height: LineHeight::Length(LengthValue::Em(2.0)),
            text_indent: LengthValue::Em(1.0),
            ..ComputedStyle::default()
        };
        style.finalize(16.0);
        assert_eq!(style.line_height, LineHeight::Length(LengthValue::Px(20.0)));
        assert_eq!(style.text_indent, LengthValue::Px(10.0));
    }

    #[test]
    fn test_export_bold() {
        let parent = ComputedStyle::default();
        let mut child = ComputedStyle::inherit_from(&parent);
        child.font_weight = 700;
        let decls = child.css_declarations(Some(&parent));
        assert_eq!(decls, vec![("font-weight".to_string(), "bold".to_string())]);
    }
}
