//! CSS Value types and parsing
//!
//! - [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)
//! - [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)
//! - [CSS Backgrounds and Borders Level 3](https://www.w3.org/TR/css-backgrounds-3/)
//! - [CSS Fonts Module Level 4](https://www.w3.org/TR/css-fonts-4/)

mod border;
mod color;
mod font;
mod keywords;
mod length;

pub use border::{
    BorderSide, CornerRadii, MEDIUM_BORDER_PX, Sides, THICK_BORDER_PX, THIN_BORDER_PX,
};
pub use color::{ColorValue, parse_color_value, parse_single_color};
pub use font::{
    LineHeight, TextDecoration, absolute_font_size, legacy_font_size, parse_font_family,
    parse_font_weight,
};
pub use keywords::{
    BackgroundRepeat, BorderStyle, Clear, Direction, DisplayKind, Float, FontStyle,
    ListStyleType, Overflow, Position, TextAlign, VerticalAlign, Visibility, WhiteSpace,
    WordBreak, parse_keyword,
};
pub use length::{
    AutoLength, DEFAULT_FONT_SIZE_PX, LengthContext, LengthParse, LengthValue, parse_length,
    parse_length_str, parse_single_auto_length, parse_single_length,
};
pub(crate) use length::format_number;
