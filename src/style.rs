//! Parse and print stylesheets.
//!
//! This module uses [`lightningcss`] under the hood.

pub mod rewrite;

use lightningcss::{
    rules::CssRule,
    selector::{Component, Selector},
    stylesheet::{ParserOptions, PrinterOptions, StyleSheet},
};
use thiserror::Error;

/// List of errors for this module.
#[derive(Debug, Error)]
pub enum StyleError {
    /// Parser error.
    #[error("{0}")]
    Parser(String),
    /// Printer error.
    #[error("{0}")]
    Printer(String),
}

/// Parse a stylesheet.
///
/// `filename` is only used in error messages.
pub fn parse_style<'i>(
    input: &'i str,
    filename: impl Into<String>,
) -> Result<StyleSheet<'i, 'i>, StyleError> {
    let parser_options = ParserOptions {
        filename: filename.into(),
        ..Default::default()
    };

    StyleSheet::parse(input, parser_options)
        .map_err(|source| StyleError::Parser(source.to_string()))
}

/// Print a stylesheet.
pub fn print_style(style_sheet: &StyleSheet<'_, '_>, minify: bool) -> Result<String, StyleError> {
    let printer_options = PrinterOptions {
        minify,
        ..Default::default()
    };

    let result = style_sheet
        .to_css(printer_options)
        .map_err(|source| StyleError::Printer(source.to_string()))?;

    Ok(result.code)
}

/// Return the rules of a conditional or grouping block.
///
/// `@scope` blocks are not included since their prelude holds selectors.
pub(crate) fn block_rules<'r, 'i>(rule: &'r CssRule<'i>) -> Option<&'r [CssRule<'i>]> {
    match rule {
        CssRule::Media(rule) => Some(&rule.rules.0),
        CssRule::Supports(rule) => Some(&rule.rules.0),
        CssRule::Container(rule) => Some(&rule.rules.0),
        CssRule::LayerBlock(rule) => Some(&rule.rules.0),
        CssRule::StartingStyle(rule) => Some(&rule.rules.0),
        CssRule::MozDocument(rule) => Some(&rule.rules.0),
        _ => None,
    }
}

/// Mutable version of [`block_rules`].
pub(crate) fn block_rules_mut<'r, 'i>(rule: &'r mut CssRule<'i>) -> Option<&'r mut Vec<CssRule<'i>>> {
    match rule {
        CssRule::Media(rule) => Some(&mut rule.rules.0),
        CssRule::Supports(rule) => Some(&mut rule.rules.0),
        CssRule::Container(rule) => Some(&mut rule.rules.0),
        CssRule::LayerBlock(rule) => Some(&mut rule.rules.0),
        CssRule::StartingStyle(rule) => Some(&mut rule.rules.0),
        CssRule::MozDocument(rule) => Some(&mut rule.rules.0),
        _ => None,
    }
}

/// Iterate over the compound selectors of a selector, from left to right.
///
/// Components are stored right to left across combinators, but in source
/// order inside a compound.
pub(crate) fn compounds<'s, 'i>(
    selector: &'s Selector<'i>,
) -> impl Iterator<Item = &'s [Component<'i>]> {
    selector
        .iter_raw_match_order()
        .as_slice()
        .rsplit(|component| component.is_combinator())
}

#[cfg(test)]
mod tests {
    use lightningcss::selector::Component;

    use super::{compounds, parse_style, print_style};

    #[test]
    fn parse_and_print() {
        const INPUT: &str = concat!(
            ".foo {\n",          //
            "  color: black;\n", //
            "}\n"
        );

        let style_sheet = parse_style(INPUT, "style.css").unwrap();
        let result = print_style(&style_sheet, true).unwrap();

        assert!(result.contains(".foo"));
        assert!(result.contains("color:"));
        assert!(!result.contains('\n'));
    }

    #[test]
    fn parse_error() {
        let result = parse_style("..foo { color: red; }", "broken.css");

        assert!(result.is_err());
    }

    #[test]
    fn compounds_in_source_order() {
        let style_sheet = parse_style(".a.b > .c .d { color: red }", "style.css").unwrap();

        let lightningcss::rules::CssRule::Style(rule) = &style_sheet.rules.0[0] else {
            panic!("expected a style rule");
        };

        let classes: Vec<Vec<String>> = compounds(&rule.selectors.0[0])
            .map(|compound| {
                compound
                    .iter()
                    .filter_map(|component| match component {
                        Component::Class(class) => Some(class.0.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .collect();

        assert_eq!(classes, [vec!["a", "b"], vec!["c"], vec!["d"]]);
    }
}
