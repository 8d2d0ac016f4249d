//! Component values of a declaration.
//!
//! [§ 5.3.4 Parse a list of component values](https://www.w3.org/TR/css-syntax-3/#parse-list-of-component-values)
//!
//! Declarations are stored as raw text; property parsers lex that text on
//! demand into the small set of component values they understand.
//! Whitespace separates values and is not kept.

/// A single component value.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// An identifier such as `bold` or `sans-serif`.
    Ident(String),
    /// A unitless number.
    Number(f32),
    /// A number followed by a unit, e.g. `12px`. The unit is lowercased.
    Dimension {
        /// Numeric part.
        value: f32,
        /// Lowercased unit.
        unit: String,
    },
    /// A number followed by `%`.
    Percentage(f32),
    /// `#` followed by a name, e.g. a hex color.
    Hash(String),
    /// A quoted string with the quotes removed.
    String(String),
    /// `name(...)`; `url(...)` keeps its raw argument as a single string.
    Function {
        /// Lowercased function name.
        name: String,
        /// Arguments.
        args: Vec<ComponentValue>,
    },
    /// `,`
    Comma,
    /// Any other single character, e.g. `/`.
    Delim(char),
}

impl ComponentValue {
    /// The identifier, if this is one.
    #[must_use]
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Whether this is the identifier `keyword` (ASCII case-insensitive).
    #[must_use]
    pub fn is_ident(&self, keyword: &str) -> bool {
        self.as_ident()
            .is_some_and(|ident| ident.eq_ignore_ascii_case(keyword))
    }
}

/// Lex `input` into component values.
#[must_use]
pub fn parse_component_values(input: &str) -> Vec<ComponentValue> {
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    parse_until(&chars, &mut pos, None)
}

fn parse_until(chars: &[char], pos: &mut usize, close: Option<char>) -> Vec<ComponentValue> {
    let mut values = Vec::new();
    while *pos < chars.len() {
        let c = chars[*pos];
        if Some(c) == close {
            *pos += 1;
            return values;
        }
        if c.is_whitespace() {
            *pos += 1;
            continue;
        }
        match c {
            ',' => {
                values.push(ComponentValue::Comma);
                *pos += 1;
            }
            '"' | '\'' => values.push(ComponentValue::String(consume_string(chars, pos, c))),
            '#' => {
                *pos += 1;
                let name = consume_name(chars, pos);
                values.push(if name.is_empty() {
                    ComponentValue::Delim('#')
                } else {
                    ComponentValue::Hash(name)
                });
            }
            '(' => {
                // A bare parenthesised group; keep its contents inline.
                *pos += 1;
                values.extend(parse_until(chars, pos, Some(')')));
            }
            _ if starts_number(chars, *pos) => values.push(consume_numeric(chars, pos)),
            _ if is_name_start(c) || (c == '-' && chars.get(*pos + 1).is_some_and(|&n| is_name_start(n) || n == '-')) => {
                let name = consume_name(chars, pos);
                if chars.get(*pos) == Some(&'(') {
                    *pos += 1;
                    let lower = name.to_ascii_lowercase();
                    let args = if lower == "url" {
                        vec![ComponentValue::String(consume_url(chars, pos))]
                    } else {
                        parse_until(chars, pos, Some(')'))
                    };
                    values.push(ComponentValue::Function { name: lower, args });
                } else {
                    values.push(ComponentValue::Ident(name));
                }
            }
            _ => {
                values.push(ComponentValue::Delim(c));
                *pos += 1;
            }
        }
    }
    values
}

const fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

const fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}

fn starts_number(chars: &[char], pos: usize) -> bool {
    let digit_at = |i: usize| chars.get(i).is_some_and(char::is_ascii_digit);
    match chars.get(pos) {
        Some('+' | '-') => digit_at(pos + 1) || (chars.get(pos + 1) == Some(&'.') && digit_at(pos + 2)),
        Some('.') => digit_at(pos + 1),
        Some(c) => c.is_ascii_digit(),
        None => false,
    }
}

fn consume_name(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && is_name_char(chars[*pos]) {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn consume_string(chars: &[char], pos: &mut usize, quote: char) -> String {
    *pos += 1;
    let mut out = String::new();
    while *pos < chars.len() {
        let c = chars[*pos];
        *pos += 1;
        match c {
            _ if c == quote => return out,
            '\\' if *pos < chars.len() => {
                out.push(chars[*pos]);
                *pos += 1;
            }
            _ => out.push(c),
        }
    }
    out
}

fn consume_url(chars: &[char], pos: &mut usize) -> String {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
    if let Some(&quote @ ('"' | '\'')) = chars.get(*pos) {
        let url = consume_string(chars, pos, quote);
        while *pos < chars.len() && chars[*pos] != ')' {
            *pos += 1;
        }
        *pos = (*pos + 1).min(chars.len());
        return url;
    }
    let start = *pos;
    while *pos < chars.len() && chars[*pos] != ')' {
        *pos += 1;
    }
    let url: String = chars[start..*pos].iter().collect();
    *pos = (*pos + 1).min(chars.len());
    url.trim().to_string()
}

fn consume_numeric(chars: &[char], pos: &mut usize) -> ComponentValue {
    let start = *pos;
    if matches!(chars[*pos], '+' | '-') {
        *pos += 1;
    }
    while *pos < chars.len() && (chars[*pos].is_ascii_digit() || chars[*pos] == '.') {
        *pos += 1;
    }
    let text: String = chars[start..*pos].iter().collect();
    let value = text.parse::<f32>().unwrap_or(0.0);

    if chars.get(*pos) == Some(&'%') {
        *pos += 1;
        return ComponentValue::Percentage(value);
    }
    let unit = consume_name(chars, pos);
    if unit.is_empty() {
        ComponentValue::Number(value)
    } else {
        ComponentValue::Dimension {
            value,
            unit: unit.to_ascii_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_and_idents() {
        let values = parse_component_values("1px solid #ccc");
        assert_eq!(
            values,
            vec![
                ComponentValue::Dimension {
                    value: 1.0,
                    unit: "px".into()
                },
                ComponentValue::Ident("solid".into()),
                ComponentValue::Hash("ccc".into()),
            ]
        );
    }

    #[test]
    fn test_functions_and_urls() {
        let values = parse_component_values("rgba(0, 0, 0, .5) url( 'a b.png' )");
        let ComponentValue::Function { name, args } = &values[0] else {
            panic!("expected function, got {values:?}");
        };
        assert_eq!(name, "rgba");
        assert_eq!(args.len(), 7);
        assert_eq!(args[6], ComponentValue::Number(0.5));
        assert_eq!(
            values[1],
            ComponentValue::Function {
                name: "url".into(),
                args: vec![ComponentValue::String("a b.png".into())]
            }
        );
    }

    #[test]
    fn test_negative_and_percentage() {
        let values = parse_component_values("-2.5em 50%");
        assert_eq!(
            values,
            vec![
                ComponentValue::Dimension {
                    value: -2.5,
                    unit: "em".into()
                },
                ComponentValue::Percentage(50.0),
            ]
        );
    }
}
