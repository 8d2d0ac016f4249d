//! Character reference decoding.
//!
//! [§ 13.5 Named character references](https://html.spec.whatwg.org/multipage/named-characters.html)
//!
//! Only the references that commonly appear in hand-written documents are
//! known by name; numeric references cover everything else. An unknown or
//! unterminated reference is left in the text as written.

/// Named references recognised by the decoder.
const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '©'),
    ("reg", '®'),
    ("trade", '™'),
    ("hellip", '…'),
    ("mdash", '—'),
    ("ndash", '–'),
    ("lsquo", '‘'),
    ("rsquo", '’'),
    ("ldquo", '“'),
    ("rdquo", '”'),
    ("bull", '•'),
    ("middot", '·'),
    ("laquo", '«'),
    ("raquo", '»'),
    ("times", '×'),
    ("divide", '÷'),
    ("deg", '°'),
    ("plusmn", '±'),
    ("para", '¶'),
    ("sect", '§'),
    ("euro", '€'),
    ("pound", '£'),
    ("yen", '¥'),
    ("cent", '¢'),
    ("larr", '←'),
    ("rarr", '→'),
    ("uarr", '↑'),
    ("darr", '↓'),
];

/// Longest reference name worth scanning for.
const MAX_REFERENCE_LEN: usize = 10;

/// Decode every character reference in `input`.
#[must_use]
pub fn decode_character_references(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match decode_one(after) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode a reference body (the text after `&`). Returns the character and
/// the number of bytes consumed, including the terminating `;`.
fn decode_one(after: &str) -> Option<(char, usize)> {
    let end = after
        .char_indices()
        .take(MAX_REFERENCE_LEN + 2)
        .find(|&(_, c)| c == ';')
        .map(|(i, _)| i)?;
    let body = &after[..end];

    let ch = if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        // [§ 13.2.5.80](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
        // "If the number is 0x00 ... or a surrogate, set it to U+FFFD."
        char::from_u32(code)
            .filter(|&c| c != '\0')
            .unwrap_or('\u{fffd}')
    } else {
        NAMED_REFERENCES
            .iter()
            .find(|(name, _)| *name == body)
            .map(|&(_, c)| c)?
    };
    Some((ch, end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_numeric() {
        assert_eq!(
            decode_character_references("a &amp; b &lt;c&gt; &#65;&#x42;"),
            "a & b <c> AB"
        );
    }

    #[test]
    fn test_unknown_reference_is_kept() {
        assert_eq!(decode_character_references("&bogus; & &amp"), "&bogus; & &amp");
    }

    #[test]
    fn test_invalid_code_point_is_replaced() {
        assert_eq!(decode_character_references("&#xD800;"), "\u{fffd}");
    }
}
