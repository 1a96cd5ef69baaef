//! Style rule registry and the collection pass that feeds the exporter.
//!
//! Rules keep their raw source text; the exporter inlines that text
//! verbatim, so nothing here interprets declarations.

use crate::dom::Document;

mod parse;

/// A single rule from a stylesheet.
#[derive(Debug, Clone)]
pub enum StyleRule {
    /// Selector plus the rule's full source text (`.chart{fill:red}`).
    Declaration { selector: String, css_text: String },
    /// Conditional group (`@media`, `@supports`) with nested rules.
    Group {
        condition: String,
        rules: Vec<StyleRule>,
    },
}

impl StyleRule {
    /// Build a declaration rule from a selector and its declaration block.
    pub fn declaration(selector: &str, declarations: &str) -> Self {
        StyleRule::Declaration {
            selector: selector.to_string(),
            css_text: format!("{selector}{{{declarations}}}"),
        }
    }

    /// Build a grouping rule.
    pub fn group(condition: &str, rules: Vec<StyleRule>) -> Self {
        StyleRule::Group {
            condition: condition.to_string(),
            rules,
        }
    }
}

/// An ordered sequence of style rules, as registered on the document.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: Vec<StyleRule>,
}

impl StyleSheet {
    /// Build a stylesheet from pre-constructed rules.
    pub fn new(rules: Vec<StyleRule>) -> Self {
        StyleSheet { rules }
    }

    /// Parse a CSS source string into a stylesheet. Malformed trailing
    /// input is dropped; recognized rules are kept in source order.
    pub fn parse(css: &str) -> Self {
        StyleSheet {
            rules: parse::parse_rules(css),
        }
    }

    /// The top-level rules, in source order.
    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Aggregate the text of every applicable rule in the document's
/// stylesheets.
///
/// Sheets are walked in registration order, rules in source order, and
/// grouping rules are expanded depth-first before the walk continues, so
/// nested rules land in the output exactly where their group sat. A rule
/// applies when its selector contains no child combinator (`>`); any rule
/// with a `>` in its selector text is skipped. Each collected rule is
/// preceded by a newline. A document without stylesheets yields an empty
/// string.
pub fn collect_styles(document: &Document) -> String {
    let mut styles = String::new();
    for sheet in document.stylesheets() {
        collect_rules(sheet.rules(), &mut styles);
    }
    styles
}

fn collect_rules(rules: &[StyleRule], out: &mut String) {
    for rule in rules {
        match rule {
            StyleRule::Group { rules, .. } => collect_rules(rules, out),
            StyleRule::Declaration { selector, css_text } => {
                if !selector.contains('>') {
                    out.push('\n');
                    out.push_str(css_text);
                }
            }
        }
    }
}
