//! Stylesheet text to rules.
//!
//! [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
//!
//! Rule blocks are found by brace matching and declarations are kept as raw
//! strings. Recovery follows three rules: comments run to their end or to
//! the end of input, at-rules other than `@media` are skipped whole, and an
//! unmatched `{` ends parsing while keeping every complete rule before it.

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub name: String,
    /// Raw value text with `!important` removed.
    pub value: String,
    /// "If the last two non-whitespace tokens in the declaration's value are
    /// a `<delim-token>` with the value "!" followed by an `<ident-token>`
    /// with a value that is an ASCII case-insensitive match for "important",
    /// remove them from the declaration's value and set the declaration's
    /// important flag to true."
    pub important: bool,
}

/// A qualified rule: the selector text before `{` and its declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule {
    /// Selector list text, e.g. `"h1, h2 .x"`.
    pub prelude: String,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
}

/// Result of parsing a stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSheet {
    /// Complete rules, in source order, with applicable `@media` contents
    /// inlined.
    pub rules: Vec<RawRule>,
    /// Recovered problems, for the warning log.
    pub problems: Vec<String>,
}

/// Parse stylesheet text, keeping `@media` blocks that apply to
/// `media_type`.
#[must_use]
pub fn parse_stylesheet(source: &str, media_type: &str) -> ParsedSheet {
    let mut sheet = ParsedSheet::default();
    let text = strip_comments(source, &mut sheet.problems);
    let _ = parse_rules(&text, media_type, &mut sheet);
    sheet
}

/// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comment)
///
/// "If the next two input code point are U+002F SOLIDUS (/) followed by a
/// U+002A ASTERISK (*), consume them and all following code points up to
/// and including the first U+002A ASTERISK (*) followed by a U+002F SOLIDUS
/// (/), or up to an EOF code point."
fn strip_comments(source: &str, problems: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        if let Some(end) = rest[start + 2..].find("*/") {
            rest = &rest[start + 2 + end + 2..];
        } else {
            problems.push("unterminated comment runs to end of stylesheet".to_string());
            return out;
        }
    }
    out.push_str(rest);
    out
}

/// Index of the `}` matching the `{` at `open`, counting nesting depth.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a run of rules. Returns `false` when an unmatched `{` stopped
/// parsing, in which case no caller should continue either.
fn parse_rules(text: &str, media_type: &str, sheet: &mut ParsedSheet) -> bool {
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        pos += rest.len() - trimmed.len();

        // A stray closing brace carries no rule.
        if trimmed.starts_with('}') || trimmed.starts_with(';') {
            pos += 1;
            continue;
        }

        let Some(brace) = trimmed.find('{') else {
            if trimmed.starts_with('@') {
                // "@import url(x);" with no block anywhere after it.
                if let Some(semi) = trimmed.find(';') {
                    pos += semi + 1;
                    continue;
                }
            }
            sheet
                .problems
                .push(format!("ignoring trailing text without a block: '{}'", trimmed.trim()));
            break;
        };

        if let Some(at_rule) = trimmed.strip_prefix('@') {
            // [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
            // "; ends a statement at-rule; { starts its block."
            if let Some(semi) = trimmed.find(';')
                && semi < brace
            {
                pos += semi + 1;
                continue;
            }
            let Some(close) = matching_brace(trimmed, brace) else {
                sheet.problems.push("unmatched '{' in at-rule".to_string());
                return false;
            };
            let name_end = at_rule
                .find(|c: char| c.is_whitespace() || c == '{')
                .unwrap_or(at_rule.len());
            let name = at_rule[..name_end].to_ascii_lowercase();
            if name == "media" {
                let media_list = &at_rule[name_end..brace - 1];
                if media_applies(media_list, media_type)
                    && !parse_rules(&trimmed[brace + 1..close], media_type, sheet)
                {
                    return false;
                }
            } else {
                sheet.problems.push(format!("skipping unsupported at-rule @{name}"));
            }
            pos += close + 1;
            continue;
        }

        let Some(close) = matching_brace(trimmed, brace) else {
            sheet
                .problems
                .push(format!("unmatched '{{' after '{}'", trimmed[..brace].trim()));
            return false;
        };
        sheet.rules.push(RawRule {
            prelude: trimmed[..brace].trim().to_string(),
            declarations: parse_declarations(&trimmed[brace + 1..close]),
        });
        pos += close + 1;
    }
    true
}

/// [Media Queries Level 4](https://www.w3.org/TR/mediaqueries-4/)
///
/// A list applies when it is empty or any query's media type is `all` or
/// `media_type`. Media features are not evaluated.
fn media_applies(list: &str, media_type: &str) -> bool {
    let list = list.trim();
    list.is_empty()
        || list.split(',').any(|query| {
            let mut words = query.split_whitespace().map(str::to_ascii_lowercase);
            let first = words.next().unwrap_or_default();
            let kind = if first == "only" {
                words.next().unwrap_or_default()
            } else {
                first
            };
            kind == "all" || kind.eq_ignore_ascii_case(media_type) || kind.starts_with('(')
        })
}

/// [§ 5.3.8 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
///
/// Splits on `;` outside quotes and parentheses (so `url(data:...;base64,...)`
/// stays whole). Entries without a name or value are dropped.
#[must_use]
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                declarations.extend(parse_declaration(&body[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    declarations.extend(parse_declaration(&body[start..]));
    declarations
}

fn parse_declaration(text: &str) -> Option<Declaration> {
    let (name, value) = text.split_once(':')?;
    let name = name.trim().to_ascii_lowercase();
    let mut value = value.trim();
    let mut important = false;
    if let Some(bang) = value.rfind('!')
        && value[bang + 1..].trim().eq_ignore_ascii_case("important")
    {
        important = true;
        value = value[..bang].trim_end();
    }
    if name.is_empty() || value.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(Declaration {
        name,
        value: value.to_string(),
        important,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_rules() {
        let sheet = parse_stylesheet("p { color: red; MARGIN : 0 } h1,h2{font-weight:bold}", "screen");
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].declarations[1].name, "margin");
        assert_eq!(sheet.rules[1].prelude, "h1,h2");
        assert!(sheet.problems.is_empty());
    }

    #[test]
    fn test_important_is_recorded() {
        let decls = parse_declarations("color: red ! IMPORTANT; width: 1px");
        assert!(decls[0].important);
        assert_eq!(decls[0].value, "red");
        assert!(!decls[1].important);
    }

    #[test]
    fn test_data_url_keeps_semicolon() {
        let decls = parse_declarations("background-image: url(data:image/png;base64,AAAA); color: red");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].value, "url(data:image/png;base64,AAAA)");
    }

    #[test]
    fn test_media_filtering() {
        let css = "@media print { p { color: red } } @media screen, print { b { color: blue } } \
                   @media { i { color: green } } @font-face { font-family: x } @import 'a.css'; u { x: y }";
        let sheet = parse_stylesheet(css, "screen");
        let preludes: Vec<_> = sheet.rules.iter().map(|r| r.prelude.as_str()).collect();
        assert_eq!(preludes, ["b", "i", "u"]);
    }

    #[test]
    fn test_unterminated_comment() {
        let sheet = parse_stylesheet("p { color: red } /* never closed h1 { color: blue }", "screen");
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.problems.len(), 1);
    }
}
