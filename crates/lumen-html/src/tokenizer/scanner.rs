//! Forgiving HTML scanner.
//!
//! The scanner walks the source once, emitting [`Token`]s. It recognises
//! tags, comments, and doctypes; everything else is text. When a construct
//! runs into the end of input it stops consuming instead of failing: an
//! unterminated comment swallows the rest of the input, and an unterminated
//! tag is emitted as literal text.

use strum_macros::Display;

use super::character_reference::decode_character_references;
use super::token::{Attribute, Token};
use crate::parser::{IssueKind, ParseIssue};

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "title", "textarea", "xmp"];

/// What the scanner is currently consuming.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
enum ScanMode {
    /// Ordinary markup.
    Data,
    /// Inside a raw text element; the payload is its tag name.
    RawText(String),
}

/// Scanner converting HTML source into tokens.
pub struct HTMLTokenizer {
    input: String,
    pos: usize,
    mode: ScanMode,
    tokens: Vec<Token>,
    issues: Vec<ParseIssue>,
}

impl HTMLTokenizer {
    /// Create a scanner over `input`.
    #[must_use]
    pub const fn new(input: String) -> Self {
        Self {
            input,
            pos: 0,
            mode: ScanMode::Data,
            tokens: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Consume the scanner, returning the tokens produced by [`Self::run`].
    #[must_use]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Tokens produced so far.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Take the problems recovered from while scanning.
    pub fn take_issues(&mut self) -> Vec<ParseIssue> {
        std::mem::take(&mut self.issues)
    }

    /// Scan the whole input. Always ends with [`Token::EndOfFile`].
    pub fn run(&mut self) {
        while self.pos < self.input.len() {
            match self.mode.clone() {
                ScanMode::Data => self.scan_data(),
                ScanMode::RawText(tag) => self.scan_raw_text(&tag),
            }
        }
        self.tokens.push(Token::EndOfFile);
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn issue(&mut self, kind: IssueKind, message: String) {
        log::debug!("html scan: {kind}: {message}");
        self.issues.push(ParseIssue { kind, message });
    }

    fn emit_text(&mut self, raw: &str, decode: bool) {
        if raw.is_empty() {
            return;
        }
        let data = if decode {
            decode_character_references(raw)
        } else {
            raw.to_string()
        };
        // Merge with a preceding text token so the builder sees whole runs.
        if let Some(Token::Text { data: previous }) = self.tokens.last_mut() {
            previous.push_str(&data);
        } else {
            self.tokens.push(Token::Text { data });
        }
    }

    fn scan_data(&mut self) {
        let Some(lt) = self.rest().find('<') else {
            let text = self.rest().to_string();
            self.emit_text(&text, true);
            self.pos = self.input.len();
            return;
        };

        let text = self.rest()[..lt].to_string();
        self.emit_text(&text, true);
        self.pos += lt;

        let rest = self.rest();
        if rest.starts_with("<!--") {
            self.scan_comment();
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            self.scan_declaration();
        } else if rest.starts_with("</")
            && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic())
        {
            self.scan_end_tag();
        } else if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            self.scan_start_tag();
        } else {
            // A lone '<' is text.
            self.emit_text("<", false);
            self.pos += 1;
        }
    }

    fn scan_comment(&mut self) {
        let body_start = self.pos + 4;
        if let Some(end) = self.input[body_start..].find("-->") {
            let data = self.input[body_start..body_start + end].to_string();
            self.tokens.push(Token::Comment { data });
            self.pos = body_start + end + 3;
        } else {
            let data = self.input[body_start..].to_string();
            self.issue(IssueKind::UnterminatedComment, "comment runs to end of input".into());
            self.tokens.push(Token::Comment { data });
            self.pos = self.input.len();
        }
    }

    fn scan_declaration(&mut self) {
        let body_start = self.pos + 2;
        let end = self.input[body_start..]
            .find('>')
            .map_or(self.input.len(), |i| body_start + i);
        let body = self.input[body_start..end].trim().to_string();
        self.pos = (end + 1).min(self.input.len());

        let lower = body.to_ascii_lowercase();
        if let Some(name) = lower.strip_prefix("doctype") {
            self.tokens.push(Token::Doctype {
                name: name.trim().to_string(),
            });
        } else {
            self.tokens.push(Token::Comment { data: body });
        }
    }

    /// Read a tag name starting at `start`; returns the lowercased name and
    /// the byte offset just past it.
    fn read_name(&self, start: usize) -> (String, usize) {
        let len = self.input[start..]
            .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
            .unwrap_or(self.input.len() - start);
        (
            self.input[start..start + len].to_ascii_lowercase(),
            start + len,
        )
    }

    fn scan_end_tag(&mut self) {
        let (name, after_name) = self.read_name(self.pos + 2);
        let Some(close) = self.input[after_name..].find('>') else {
            self.unterminated_tag(&name);
            return;
        };
        self.pos = after_name + close + 1;
        self.tokens.push(Token::EndTag { name });
    }

    fn unterminated_tag(&mut self, name: &str) {
        self.issue(
            IssueKind::UnterminatedTag,
            format!("tag <{name}> runs to end of input"),
        );
        let text = self.rest().to_string();
        self.emit_text(&text, true);
        self.pos = self.input.len();
    }

    fn scan_start_tag(&mut self) {
        let (name, mut cursor) = self.read_name(self.pos + 1);
        let mut attributes: Vec<Attribute> = Vec::new();
        let bytes = self.input.as_bytes();
        let mut self_closing = false;

        loop {
            while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
                cursor += 1;
            }
            if cursor >= bytes.len() {
                self.unterminated_tag(&name);
                return;
            }
            match bytes[cursor] {
                b'>' => {
                    cursor += 1;
                    break;
                }
                b'/' => {
                    cursor += 1;
                    if bytes.get(cursor) == Some(&b'>') {
                        self_closing = true;
                        cursor += 1;
                        break;
                    }
                }
                _ => {
                    let Some((attribute, next)) = self.read_attribute(cursor) else {
                        self.unterminated_tag(&name);
                        return;
                    };
                    if !attributes.iter().any(|a| a.name == attribute.name) {
                        attributes.push(attribute);
                    }
                    cursor = next;
                }
            }
        }

        self.pos = cursor;
        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing {
            self.mode = ScanMode::RawText(name.clone());
        }
        self.tokens.push(Token::StartTag {
            name,
            self_closing,
            attributes,
        });
    }

    /// Read one attribute starting at `start`. Returns `None` if the input
    /// ends inside it.
    fn read_attribute(&self, start: usize) -> Option<(Attribute, usize)> {
        let bytes = self.input.as_bytes();
        let name_len = self.input[start..]
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(self.input.len() - start)
            .max(1);
        let name = self.input[start..start + name_len].to_ascii_lowercase();
        let mut cursor = start + name_len;

        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if bytes.get(cursor) != Some(&b'=') {
            return (cursor < bytes.len()).then(|| (Attribute::new(name, String::new()), cursor));
        }
        cursor += 1;
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }

        let (raw, next) = match bytes.get(cursor)? {
            quote @ (b'"' | b'\'') => {
                let close = self.input[cursor + 1..].find(char::from(*quote))?;
                (
                    &self.input[cursor + 1..cursor + 1 + close],
                    cursor + close + 2,
                )
            }
            _ => {
                let len = self.input[cursor..]
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(self.input.len() - cursor);
                (&self.input[cursor..cursor + len], cursor + len)
            }
        };
        Some((
            Attribute::new(name, decode_character_references(raw)),
            next,
        ))
    }

    fn scan_raw_text(&mut self, tag: &str) {
        let closing = format!("</{tag}");
        let lower_rest = self.rest().to_ascii_lowercase();
        let end = lower_rest.find(&closing).unwrap_or(lower_rest.len());
        let text = self.rest()[..end].to_string();
        // Titles and textareas decode references; scripts and styles do not.
        let decode = matches!(tag, "title" | "textarea");
        self.emit_text(&text, decode);
        self.pos += end;
        self.mode = ScanMode::Data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(html: &str) -> Vec<Token> {
        let mut tokenizer = HTMLTokenizer::new(html.to_string());
        tokenizer.run();
        tokenizer.into_tokens()
    }

    #[test]
    fn test_attribute_quoting_styles() {
        let tokens = tokenize(r#"<td colspan=2 class='a b' title="x &amp; y" nowrap>"#);
        let Token::StartTag { attributes, .. } = &tokens[0] else {
            panic!("expected start tag, got {:?}", tokens[0]);
        };
        let pairs: Vec<(&str, &str)> = attributes
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("colspan", "2"),
                ("class", "a b"),
                ("title", "x & y"),
                ("nowrap", "")
            ]
        );
    }

    #[test]
    fn test_style_body_is_raw() {
        let tokens = tokenize("<style>p > b { color: red }</style>x");
        assert_eq!(
            tokens[1],
            Token::Text {
                data: "p > b { color: red }".into()
            }
        );
        assert_eq!(tokens[2], Token::EndTag { name: "style".into() });
    }

    #[test]
    fn test_unterminated_tag_becomes_text() {
        let mut tokenizer = HTMLTokenizer::new("ok <b class=\"x".to_string());
        tokenizer.run();
        assert_eq!(tokenizer.take_issues().len(), 1);
        assert_eq!(
            tokenizer.tokens()[0],
            Token::Text {
                data: "ok <b class=\"x".into()
            }
        );
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let tokens = tokenize("1 < 2");
        assert_eq!(tokens[0], Token::Text { data: "1 < 2".into() });
        assert_eq!(tokens[1], Token::EndOfFile);
    }
}
