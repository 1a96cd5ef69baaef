//! CSS source text to rule lists.
//!
//! Rules are captured as raw source slices rather than re-serialized, so the
//! text that reaches the exported style block is exactly what the stylesheet
//! author wrote. `@media`/`@supports` blocks recurse into nested rule lists;
//! every other at-rule is consumed and dropped.

use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};

use super::StyleRule;

pub(crate) fn parse_rules(css: &str) -> Vec<StyleRule> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();
    parse_rule_list(&mut parser, &mut rules);
    rules
}

fn parse_rule_list<'i>(input: &mut Parser<'i, '_>, rules: &mut Vec<StyleRule>) {
    loop {
        input.skip_whitespace();
        let start = input.position();
        let token = match input.next() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        match token {
            Token::Semicolon => continue,
            Token::AtKeyword(name) => {
                let grouping =
                    name.eq_ignore_ascii_case("media") || name.eq_ignore_ascii_case("supports");
                consume_prelude(input);
                let condition = input.slice_from(start).trim().to_string();

                match input.next() {
                    Ok(Token::CurlyBracketBlock) => {
                        if grouping {
                            let mut nested = Vec::new();
                            let parsed: Result<(), ParseError<'_, ()>> =
                                input.parse_nested_block(|block| {
                                    parse_rule_list(block, &mut nested);
                                    Ok(())
                                });
                            let _ = parsed;
                            rules.push(StyleRule::Group {
                                condition,
                                rules: nested,
                            });
                        } else {
                            // @font-face, @keyframes and friends: skip the block.
                            let skipped: Result<(), ParseError<'_, ()>> =
                                input.parse_nested_block(|block| {
                                    while block.next().is_ok() {}
                                    Ok(())
                                });
                            let _ = skipped;
                        }
                    }
                    // Blockless at-rule (@import, @charset): the semicolon
                    // was the delimiter, nothing more to consume.
                    _ => {}
                }
            }
            _ => {
                consume_prelude(input);
                let selector = input.slice_from(start).trim().to_string();

                match input.next() {
                    Ok(Token::CurlyBracketBlock) => {
                        let consumed: Result<(), ParseError<'_, ()>> =
                            input.parse_nested_block(|block| {
                                while block.next().is_ok() {}
                                Ok(())
                            });
                        let _ = consumed;
                        let css_text = input.slice_from(start).trim().to_string();
                        if !selector.is_empty() {
                            rules.push(StyleRule::Declaration { selector, css_text });
                        }
                    }
                    // Selector with no block: malformed tail, stop here.
                    _ => break,
                }
            }
        }
    }
}

/// Consume tokens up to (but not including) the next block or semicolon.
fn consume_prelude<'i>(input: &mut Parser<'i, '_>) {
    let consumed: Result<(), ParseError<'_, ()>> = input.parse_until_before(
        Delimiter::CurlyBracketBlock | Delimiter::Semicolon,
        |prelude| {
            while prelude.next().is_ok() {}
            Ok(())
        },
    );
    let _ = consumed;
}

#[cfg(test)]
mod tests {
    use super::super::{StyleRule, StyleSheet};

    fn declarations(sheet: &StyleSheet) -> Vec<(&str, &str)> {
        sheet
            .rules()
            .iter()
            .filter_map(|rule| match rule {
                StyleRule::Declaration { selector, css_text } => {
                    Some((selector.as_str(), css_text.as_str()))
                }
                StyleRule::Group { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_simple_rules() {
        let sheet = StyleSheet::parse(".chart{fill:red} .axis { stroke: black; }");
        assert_eq!(
            declarations(&sheet),
            vec![
                (".chart", ".chart{fill:red}"),
                (".axis", ".axis { stroke: black; }"),
            ]
        );
    }

    #[test]
    fn test_parse_preserves_raw_rule_text() {
        let sheet = StyleSheet::parse(".chart > .bar{fill:blue}");
        assert_eq!(
            declarations(&sheet),
            vec![(".chart > .bar", ".chart > .bar{fill:blue}")]
        );
    }

    #[test]
    fn test_parse_media_group() {
        let sheet = StyleSheet::parse("@media (max-width: 600px) { .a{x:y} .b{u:v} } .c{p:q}");
        assert_eq!(sheet.rules().len(), 2);

        let StyleRule::Group { condition, rules } = &sheet.rules()[0] else {
            panic!("expected a group rule");
        };
        assert_eq!(condition, "@media (max-width: 600px)");
        assert_eq!(rules.len(), 2);
        assert!(
            matches!(&rules[0], StyleRule::Declaration { css_text, .. } if css_text == ".a{x:y}")
        );

        assert!(matches!(
            &sheet.rules()[1],
            StyleRule::Declaration { selector, .. } if selector == ".c"
        ));
    }

    #[test]
    fn test_parse_nested_groups() {
        let sheet = StyleSheet::parse("@media screen { @supports (display: grid) { .g{a:b} } }");
        let StyleRule::Group { rules, .. } = &sheet.rules()[0] else {
            panic!("expected a group rule");
        };
        let StyleRule::Group { condition, rules } = &rules[0] else {
            panic!("expected a nested group rule");
        };
        assert_eq!(condition, "@supports (display: grid)");
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_parse_skips_other_at_rules() {
        let sheet = StyleSheet::parse(
            "@import url(base.css); @font-face { font-family: X; src: url(x.woff); } .k{m:n}",
        );
        assert_eq!(declarations(&sheet), vec![(".k", ".k{m:n}")]);
    }

    #[test]
    fn test_parse_empty_and_garbage_input() {
        assert!(StyleSheet::parse("").is_empty());
        assert!(StyleSheet::parse("   \n\t ").is_empty());
        // A prelude with no block ends the sheet without panicking.
        assert!(StyleSheet::parse(".dangling").is_empty());
    }

    #[test]
    fn test_parse_selector_list_kept_verbatim() {
        let sheet = StyleSheet::parse("h1, .title, svg text { font-weight: bold }");
        assert_eq!(
            declarations(&sheet),
            vec![(
                "h1, .title, svg text",
                "h1, .title, svg text { font-weight: bold }"
            )]
        );
    }
}
