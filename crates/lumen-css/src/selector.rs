//! CSS Selector parsing and matching
//!
//! This module implements the subset of
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/) the engine
//! supports: type, class, ID and universal selectors, the `:hover`,
//! `:link` and `:first-child` pseudo-classes, and the descendant and child
//! combinators. Anything else makes [`parse_selector`] return `None`, and
//! the rule is skipped.

use lumen_dom::{DomTree, ElementData, NodeId};

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    /// "A type selector is the name of a document language element type,
    /// and represents an instance of that element type in the document tree."
    Type(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    /// "The class selector is given as a full stop (. U+002E) immediately
    /// followed by an identifier."
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    /// "An ID selector is a hash (#, U+0023) immediately followed by the
    /// ID value, which is an identifier."
    Id(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    PseudoClass(PseudoClass),
}

/// The supported pseudo-classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// [§ 9.2 :hover](https://www.w3.org/TR/selectors-4/#the-hover-pseudo)
    /// "The :hover pseudo-class applies while the user designates an element
    /// with a pointing device". Here that is the hover target and its
    /// ancestors.
    Hover,
    /// [§ 8.2 :link](https://www.w3.org/TR/selectors-4/#link)
    /// An `<a>` with an `href`.
    Link,
    /// [§ 14.3.1 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    /// "an element that is first among its inclusive siblings."
    FirstChild,
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    /// The simple selectors that must all match one element.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
    /// "A selector of the form 'A B' represents an element B that is an
    /// arbitrary descendant of some ancestor element A."
    Descendant,

    /// [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
    /// "A selector of the form 'A > B' represents an element B that is a
    /// direct child of element A."
    Child,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Example: `div.container > ul li` is stored as
/// ```text
/// subject: [li]
/// combinators: [(Descendant, [ul]), (Child, [div.container])]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector (the subject of the selector).
    pub subject: CompoundSelector,
    /// Chain of (combinator, compound) pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
/// "Specificities are compared by comparing the three components in order."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

/// A parsed CSS selector ready for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// Source text, whitespace-normalised; blocks merge on this.
    pub text: String,
    /// The complex selector (compound selectors with combinators).
    pub complex: ComplexSelector,
    /// The specificity of this selector.
    pub specificity: Specificity,
}

impl ParsedSelector {
    /// The key the stylesheet indexes this selector under: the subject's
    /// ID, else its first class, else its tag, else `*`.
    #[must_use]
    pub fn key(&self) -> String {
        let simples = &self.complex.subject.simple_selectors;
        let find = |pick: fn(&SimpleSelector) -> Option<String>| simples.iter().find_map(pick);
        find(|s| match s {
            SimpleSelector::Id(id) => Some(format!("#{id}")),
            _ => None,
        })
        .or_else(|| {
            find(|s| match s {
                SimpleSelector::Class(class) => Some(format!(".{class}")),
                _ => None,
            })
        })
        .or_else(|| {
            find(|s| match s {
                SimpleSelector::Type(tag) => Some(tag.clone()),
                _ => None,
            })
        })
        .unwrap_or_else(|| "*".to_string())
    }

    /// Whether any compound in the chain uses `:hover`.
    #[must_use]
    pub fn uses_hover(&self) -> bool {
        std::iter::once(&self.complex.subject)
            .chain(self.complex.combinators.iter().map(|(_, c)| c))
            .any(|c| {
                c.simple_selectors
                    .contains(&SimpleSelector::PseudoClass(PseudoClass::Hover))
            })
    }

    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// `hovered` is the current hover target; `:hover` matches it and its
    /// ancestors.
    #[must_use]
    pub fn matches_in_tree(&self, tree: &DomTree, node_id: NodeId, hovered: Option<NodeId>) -> bool {
        let ctx = MatchContext { tree, hovered };
        ctx.compound_matches(&self.complex.subject, node_id)
            && ctx.chain_matches(&self.complex.combinators, node_id)
    }
}

struct MatchContext<'a> {
    tree: &'a DomTree,
    hovered: Option<NodeId>,
}

impl MatchContext<'_> {
    /// Match the combinator chain leftwards from `current`, which already
    /// matched the compound to the right.
    ///
    /// A descendant combinator tries every matching ancestor before giving
    /// up, so `div > p span` still matches when the nearest `p` is not a
    /// child of a `div` but a farther one is.
    fn chain_matches(&self, chain: &[(Combinator, CompoundSelector)], current: NodeId) -> bool {
        let Some(((combinator, compound), rest)) = chain.split_first() else {
            return true;
        };
        match combinator {
            Combinator::Child => self.tree.parent(current).is_some_and(|parent| {
                self.compound_matches(compound, parent) && self.chain_matches(rest, parent)
            }),
            Combinator::Descendant => self.tree.ancestors(current).any(|ancestor| {
                self.compound_matches(compound, ancestor) && self.chain_matches(rest, ancestor)
            }),
        }
    }

    fn compound_matches(&self, compound: &CompoundSelector, node_id: NodeId) -> bool {
        let Some(element) = self.tree.as_element(node_id) else {
            return false;
        };
        compound.simple_selectors.iter().all(|simple| match simple {
            SimpleSelector::PseudoClass(pc) => self.pseudo_class_matches(*pc, node_id, element),
            _ => simple.matches(element),
        })
    }

    fn pseudo_class_matches(&self, pc: PseudoClass, node_id: NodeId, element: &ElementData) -> bool {
        match pc {
            PseudoClass::Hover => self.hovered.is_some_and(|hovered| {
                hovered == node_id || self.tree.ancestors(hovered).any(|a| a == node_id)
            }),
            PseudoClass::Link => element.tag_name == "a" && element.attr("href").is_some(),
            PseudoClass::FirstChild => self.tree.parent(node_id).is_some_and(|parent| {
                self.tree
                    .children(parent)
                    .iter()
                    .find(|&&child| self.tree.as_element(child).is_some())
                    == Some(&node_id)
            }),
        }
    }
}

impl ComplexSelector {
    /// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
    #[must_use]
    pub fn calculate_specificity(&self) -> Specificity {
        std::iter::once(&self.subject)
            .chain(self.combinators.iter().map(|(_, c)| c))
            .flat_map(|c| &c.simple_selectors)
            .fold(Specificity::default(), |mut spec, simple| {
                match simple {
                    // "count the number of ID selectors in the selector (= A)"
                    SimpleSelector::Id(_) => spec.0 += 1,
                    // "count the number of class selectors, attributes selectors,
                    // and pseudo-classes in the selector (= B)"
                    SimpleSelector::Class(_) | SimpleSelector::PseudoClass(_) => spec.1 += 1,
                    // "count the number of type selectors and pseudo-elements
                    // in the selector (= C)"
                    SimpleSelector::Type(_) => spec.2 += 1,
                    // "ignore the universal selector"
                    SimpleSelector::Universal => {}
                }
                spec
            })
    }
}

impl SimpleSelector {
    /// Check if this simple selector matches the given element.
    ///
    /// Pseudo-classes need tree context and never match here.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
            Self::Class(class_name) => element.has_class(class_name),
            Self::Id(id) => element.id() == Some(id.as_str()),
            Self::Universal => true,
            Self::PseudoClass(_) => false,
        }
    }
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Parse one selector (no commas).
///
/// Returns `None` for anything outside the supported subset, including
/// attribute selectors, sibling combinators and unknown pseudo-classes.
#[must_use]
pub fn parse_selector(raw: &str) -> Option<ParsedSelector> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators_between: Vec<Combinator> = Vec::new();
    let mut current = CompoundSelector::default();
    let mut pending: Option<Combinator> = None;

    let mut chars = trimmed.chars().peekable();
    let take_ident = |chars: &mut std::iter::Peekable<std::str::Chars<'_>>| {
        let mut ident = String::new();
        while let Some(&ch) = chars.peek() {
            if !is_ident_char(ch) {
                break;
            }
            ident.push(ch);
            let _ = chars.next();
        }
        ident
    };

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' | '>' => {
                let _ = chars.next();
                let explicit = c == '>';
                if !current.simple_selectors.is_empty() {
                    compounds.push(std::mem::take(&mut current));
                    pending = Some(Combinator::Descendant);
                }
                if explicit {
                    // "A > B": a child combinator needs a left-hand side.
                    if compounds.is_empty() || pending == Some(Combinator::Child) {
                        return None;
                    }
                    pending = Some(Combinator::Child);
                }
            }
            '.' | '#' => {
                let _ = chars.next();
                let name = take_ident(&mut chars);
                if name.is_empty() {
                    return None;
                }
                flush_pending(&mut pending, &mut combinators_between, &compounds, &current);
                current.simple_selectors.push(if c == '.' {
                    SimpleSelector::Class(name)
                } else {
                    SimpleSelector::Id(name)
                });
            }
            '*' => {
                let _ = chars.next();
                flush_pending(&mut pending, &mut combinators_between, &compounds, &current);
                current.simple_selectors.push(SimpleSelector::Universal);
            }
            ':' => {
                let _ = chars.next();
                let name = take_ident(&mut chars).to_ascii_lowercase();
                let pc = match name.as_str() {
                    "hover" => PseudoClass::Hover,
                    "link" => PseudoClass::Link,
                    "first-child" => PseudoClass::FirstChild,
                    _ => return None,
                };
                flush_pending(&mut pending, &mut combinators_between, &compounds, &current);
                current.simple_selectors.push(SimpleSelector::PseudoClass(pc));
            }
            _ if is_ident_char(c) => {
                let name = take_ident(&mut chars).to_ascii_lowercase();
                // A type selector must come first in its compound.
                if !current.simple_selectors.is_empty() {
                    return None;
                }
                flush_pending(&mut pending, &mut combinators_between, &compounds, &current);
                current.simple_selectors.push(SimpleSelector::Type(name));
            }
            _ => return None,
        }
    }

    if current.simple_selectors.is_empty() {
        // Trailing combinator such as "div >".
        return None;
    }
    compounds.push(current);

    // Reverse so the subject comes first and the chain runs right to left.
    let subject = compounds.pop()?;
    let combinators: Vec<(Combinator, CompoundSelector)> = combinators_between
        .into_iter()
        .rev()
        .zip(compounds.into_iter().rev())
        .collect();

    let complex = ComplexSelector {
        subject,
        combinators,
    };
    let specificity = complex.calculate_specificity();
    Some(ParsedSelector {
        text: trimmed.split_whitespace().collect::<Vec<_>>().join(" "),
        complex,
        specificity,
    })
}

/// A simple selector is about to start a new compound: commit the
/// combinator that separated it from the previous one.
fn flush_pending(
    pending: &mut Option<Combinator>,
    between: &mut Vec<Combinator>,
    compounds: &[CompoundSelector],
    current: &CompoundSelector,
) {
    if current.simple_selectors.is_empty()
        && !compounds.is_empty()
        && let Some(combinator) = pending.take()
    {
        between.push(combinator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain() {
        let sel = parse_selector("div.box > ul  li:first-child").unwrap();
        assert_eq!(sel.complex.combinators.len(), 2);
        assert_eq!(sel.complex.combinators[0].0, Combinator::Descendant);
        assert_eq!(sel.complex.combinators[1].0, Combinator::Child);
        assert_eq!(sel.specificity, Specificity(0, 2, 3));
        assert_eq!(sel.text, "div.box > ul li:first-child");
    }

    #[test]
    fn test_child_without_spaces() {
        let sel = parse_selector("ul>li").unwrap();
        assert_eq!(sel.complex.combinators[0].0, Combinator::Child);
    }

    #[test]
    fn test_unsupported_selectors() {
        assert!(parse_selector("a[href]").is_none());
        assert!(parse_selector("h1 + p").is_none());
        assert!(parse_selector("p::before").is_none());
        assert!(parse_selector("> p").is_none());
        assert!(parse_selector("div >").is_none());
    }

    #[test]
    fn test_keys() {
        assert_eq!(parse_selector("p.intro#main").unwrap().key(), "#main");
        assert_eq!(parse_selector("div p.note").unwrap().key(), ".note");
        assert_eq!(parse_selector("td").unwrap().key(), "td");
        assert_eq!(parse_selector(":hover").unwrap().key(), "*");
    }
}
