//! User-Agent Stylesheet
//!
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html)
//!
//! "User agents are expected to have a default style sheet that presents elements
//! of HTML documents in ways consistent with general user expectations."
//!
//! The engine configuration can replace this text; see
//! `EngineConfig::base_stylesheet`.

use lumen_common::WarningLog;

use crate::stylesheet::{CssData, Origin};

/// [WHATWG HTML § 15.3](https://html.spec.whatwg.org/multipage/rendering.html#the-css-user-agent-style-sheet-and-presentational-hints)
///
/// Default rules for the elements this engine lays out.
pub const UA_CSS: &str = r"
/* [§ 15.3.1 Hidden elements] */
area, base, basefont, datalist, head, link, meta, noembed,
noframes, param, rp, script, style, template, title {
    display: none;
}

/* [§ 15.3.3 Flow content] */
address, article, aside, blockquote, body, center, dd, details,
dialog, dir, div, dl, dt, fieldset, figcaption, figure, footer,
form, h1, h2, h3, h4, h5, h6, header, hgroup, hr, html, legend,
listing, main, menu, nav, ol, p, plaintext, pre, section, summary, ul, xmp {
    display: block;
}

li { display: list-item; }

/* [§ 15.3.4 The page] */
body { margin: 8px; }

/* [§ 15.3.6 Sections and headings] */
h1 { font-size: 2em; font-weight: bold; margin: 0.67em 0; }
h2 { font-size: 1.5em; font-weight: bold; margin: 0.83em 0; }
h3 { font-size: 1.17em; font-weight: bold; margin: 1em 0; }
h4 { font-weight: bold; margin: 1.33em 0; }
h5 { font-size: 0.83em; font-weight: bold; margin: 1.67em 0; }
h6 { font-size: 0.67em; font-weight: bold; margin: 2.33em 0; }

/* [§ 15.3.5 Grouping content] */
p, blockquote, figure, listing, plaintext, pre, xmp, dl { margin: 1em 0; }
blockquote, figure { margin-left: 40px; margin-right: 40px; }
dd { margin-left: 40px; }
center { text-align: center; }
pre, listing, plaintext, xmp { white-space: pre; font-family: monospace; }
hr {
    border: 1px inset;
    margin: 0.5em auto;
}

/* [§ 15.3.7 Lists] */
ol, ul, menu, dir { margin: 1em 0; padding-left: 40px; }
ul, menu, dir { list-style-type: disc; }
ol { list-style-type: decimal; }
ul ul, ol ul { list-style-type: circle; margin-top: 0; margin-bottom: 0; }
ol ol, ul ol { margin-top: 0; margin-bottom: 0; }

/* [§ 15.3.8 Text-level semantics] */
b, strong, th { font-weight: bolder; }
em, i, cite, dfn, var, address { font-style: italic; }
u, ins { text-decoration: underline; }
s, strike, del { text-decoration: line-through; }
code, kbd, samp, tt { font-family: monospace; }
big { font-size: larger; }
small { font-size: smaller; }
sub { vertical-align: sub; font-size: smaller; }
sup { vertical-align: super; font-size: smaller; }
nobr { white-space: nowrap; }
a:link { color: blue; text-decoration: underline; }

/* [§ 15.3.10 Tables] */
table { display: table; border-spacing: 2px; }
caption { display: table-caption; text-align: center; }
thead, tbody, tfoot { display: table-row-group; vertical-align: middle; }
tr { display: table-row; vertical-align: inherit; }
td, th { display: table-cell; padding: 1px; vertical-align: middle; }
th { text-align: center; }
col, colgroup { display: table-column; }

/* [§ 15.4 Replaced elements] */
img { display: inline; }
";

/// Parse the user-agent stylesheet, or `replacement` when given, for
/// `media_type`. Each container keeps its own copy.
#[must_use]
pub fn default_stylesheet(replacement: Option<&str>, media_type: &str, warnings: &WarningLog) -> CssData {
    CssData::parse(replacement.unwrap_or(UA_CSS), Origin::UserAgent, media_type, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ua_stylesheet_parses_cleanly() {
        let warnings = WarningLog::new();
        let css = CssData::parse(UA_CSS, Origin::UserAgent, "screen", &warnings);
        assert!(warnings.is_empty(), "{:?}", warnings.warnings());
        assert!(!css.blocks_for("body").is_empty());
        assert!(!css.blocks_for("a").is_empty());
    }

    #[test]
    fn test_replacement_stylesheet() {
        let warnings = WarningLog::new();
        let css = default_stylesheet(Some("p { color: red; }"), "screen", &warnings);
        assert!(!css.blocks_for("p").is_empty());
        assert!(css.blocks_for("body").is_empty());
    }
}
