//! Style sheets and computed widget styles
//!
//! A small Qt-flavoured subset: rules of compound selectors (`*`, `Kind`,
//! `#id`, `.class`, `[prop="value"]`) with a handful of declarations. Rules
//! cascade by specificity then source order; the widget's inline style wins.
//! Tokenizing follows CSS Syntax Level 3 through `cssparser`.

use cssparser::color::{parse_hash_color, parse_named_color};
use cssparser::{Delimiter, ParseError, Parser, ParserInput, SourcePosition, Token};
use thiserror::Error;
use tracing::{debug, warn};

use super::Widget;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StyleError {
    #[error("rule for '{0}' is missing its closing brace")]
    Unclosed(String),

    #[error("selector '{0}' is not followed by a declaration block")]
    MissingBlock(String),

    #[error("declarations without a selector on line {0}")]
    MissingSelector(u32),

    #[error("unsupported selector '{0}'")]
    BadSelector(String),
}

type ValueResult<'i, T> = Result<T, ParseError<'i, ()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a single colour value: `#rrggbb`, `#rgb` or a CSS colour keyword
    pub fn parse(value: &str) -> Option<Self> {
        let mut input = ParserInput::new(value);
        let mut parser = Parser::new(&mut input);
        parser.parse_entirely(parse_color).ok()
    }
}

/// Resolved set of style declarations. Unset fields fall back to the
/// renderer's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub color: Option<Rgb>,
    pub background: Option<Rgb>,
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub height: Option<f32>,
    pub min_height: Option<f32>,
}

impl Style {
    /// Parse a declaration block such as `color: #fff; height: 150px;`.
    /// Unknown properties and bad values are skipped.
    pub fn parse(text: &str) -> Self {
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);
        parse_declarations(&mut parser)
    }

    /// Overlay every field `other` sets
    pub fn merge(&mut self, other: &Style) {
        self.color = other.color.or(self.color);
        self.background = other.background.or(self.background);
        self.font_size = other.font_size.or(self.font_size);
        self.bold = other.bold.or(self.bold);
        self.height = other.height.or(self.height);
        self.min_height = other.min_height.or(self.min_height);
    }
}

/// Read `name: value;` pairs until the block runs out. A bad declaration only
/// costs itself, parsing resumes after its semicolon.
fn parse_declarations(block: &mut Parser<'_, '_>) -> Style {
    let mut style = Style::default();
    while !block.is_exhausted() {
        let start = block.position();
        let result = block.parse_until_after(Delimiter::Semicolon, |declaration| {
            parse_declaration(declaration, &mut style)
        });
        if let Err(err) = result {
            let text = block.slice_from(start).trim_end_matches(';').trim();
            warn!(
                declaration = %text,
                line = err.location.line + 1,
                "ignoring invalid style declaration"
            );
        }
    }
    style
}

fn parse_declaration<'i>(input: &mut Parser<'i, '_>, style: &mut Style) -> ValueResult<'i, ()> {
    if input.is_exhausted() {
        return Ok(());
    }
    let name = input.expect_ident()?.clone();
    input.expect_colon()?;

    match &*name {
        "color" => style.color = Some(parse_color(input)?),
        "background-color" | "background" => style.background = Some(parse_color(input)?),
        "font-size" => style.font_size = Some(parse_length(input)?),
        "font-weight" => style.bold = Some(parse_weight(input)?),
        "height" => style.height = Some(parse_length(input)?),
        "min-height" => style.min_height = Some(parse_length(input)?),
        other => {
            debug!(property = %other, "ignoring unsupported style property");
            while input.next().is_ok() {}
        }
    }
    input.expect_exhausted()?;
    Ok(())
}

fn parse_color<'i>(input: &mut Parser<'i, '_>) -> ValueResult<'i, Rgb> {
    let location = input.current_source_location();
    let token = input.next()?.clone();
    let rgb = match &token {
        Token::Hash(value) | Token::IDHash(value) => {
            parse_hash_color(value.as_bytes()).map(|(r, g, b, _)| Rgb::new(r, g, b))
        }
        Token::Ident(name) => parse_named_color(name).map(|(r, g, b)| Rgb::new(r, g, b)),
        _ => Err(()),
    };
    rgb.map_err(|()| location.new_unexpected_token_error(token))
}

/// Pixels, with or without the unit
fn parse_length<'i>(input: &mut Parser<'i, '_>) -> ValueResult<'i, f32> {
    let location = input.current_source_location();
    match input.next()?.clone() {
        Token::Dimension { value, ref unit, .. } if unit.eq_ignore_ascii_case("px") => Ok(value),
        Token::Number { value, .. } => Ok(value),
        token => Err(location.new_unexpected_token_error(token)),
    }
}

fn parse_weight<'i>(input: &mut Parser<'i, '_>) -> ValueResult<'i, bool> {
    let location = input.current_source_location();
    let token = input.next()?.clone();
    let bold = match &token {
        Token::Ident(keyword) => match &**keyword {
            "bold" | "bolder" => Some(true),
            "normal" | "lighter" => Some(false),
            _ => None,
        },
        Token::Number {
            int_value: Some(weight),
            ..
        } => Some(*weight >= 600),
        _ => None,
    };
    bold.ok_or_else(|| location.new_unexpected_token_error(token))
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Selector {
    kind: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    properties: Vec<(String, String)>,
}

impl Selector {
    fn matches(&self, widget: &Widget) -> bool {
        self.kind.as_deref().is_none_or(|kind| kind == widget.kind())
            && self.id.as_deref().is_none_or(|id| Some(id) == widget.object_name())
            && self.classes.iter().all(|class| Some(class.as_str()) == widget.class())
            && self
                .properties
                .iter()
                .all(|(name, value)| widget.property(name) == Some(value.as_str()))
    }

    /// (ids, classes + properties, kinds), compared lexicographically
    fn specificity(&self) -> (usize, usize, usize) {
        (
            usize::from(self.id.is_some()),
            self.classes.len() + self.properties.len(),
            usize::from(self.kind.is_some()),
        )
    }
}

/// Consume a selector list up to and including the `{` that opens its block
fn parse_selectors(
    parser: &mut Parser<'_, '_>,
    start: SourcePosition,
) -> Result<Vec<Selector>, StyleError> {
    let line = parser.current_source_location().line + 1;
    let mut selectors = Vec::new();
    let mut current = Selector::default();
    // Parts of the compound selector read so far; `*` counts as one
    let mut parts = 0;
    let mut spaced = false;

    loop {
        let text = |parser: &Parser<'_, '_>| prelude_text(parser.slice_from(start));
        let Ok(token) = parser.next_including_whitespace().cloned() else {
            return Err(StyleError::MissingBlock(text(parser)));
        };
        match token {
            Token::WhiteSpace(_) => spaced = parts > 0,
            Token::Comma | Token::CurlyBracketBlock => {
                let opens_block = matches!(token, Token::CurlyBracketBlock);
                if parts == 0 {
                    return Err(if opens_block && selectors.is_empty() {
                        StyleError::MissingSelector(line)
                    } else {
                        StyleError::BadSelector(text(parser))
                    });
                }
                selectors.push(std::mem::take(&mut current));
                parts = 0;
                spaced = false;
                if opens_block {
                    return Ok(selectors);
                }
            }
            // Descendant and child combinators are not supported
            _ if spaced => return Err(StyleError::BadSelector(text(parser))),
            Token::Delim('*') if parts == 0 => parts += 1,
            Token::Ident(kind) if parts == 0 => {
                current.kind = Some(kind.to_string());
                parts += 1;
            }
            Token::IDHash(id) | Token::Hash(id) => {
                current.id = Some(id.to_string());
                parts += 1;
            }
            Token::Delim('.') => {
                let Ok(Token::Ident(class)) = parser.next_including_whitespace().cloned() else {
                    return Err(StyleError::BadSelector(text(parser)));
                };
                current.classes.push(class.to_string());
                parts += 1;
            }
            Token::SquareBracketBlock => {
                let property = parser
                    .parse_nested_block(parse_property_selector)
                    .map_err(|_| StyleError::BadSelector(text(parser)))?;
                current.properties.push(property);
                parts += 1;
            }
            _ => return Err(StyleError::BadSelector(text(parser))),
        }
    }
}

/// Body of `[name="value"]`
fn parse_property_selector<'i>(input: &mut Parser<'i, '_>) -> ValueResult<'i, (String, String)> {
    let name = input.expect_ident()?.to_string();
    input.expect_delim('=')?;
    let value = input.expect_ident_or_string()?.to_string();
    input.expect_exhausted()?;
    Ok((name, value))
}

fn declaration_block<'i>(block: &mut Parser<'i, '_>) -> ValueResult<'i, Style> {
    Ok(parse_declarations(block))
}

fn prelude_text(consumed: &str) -> String {
    consumed.trim_end_matches('{').trim().to_string()
}

#[derive(Debug, Clone)]
struct Rule {
    selectors: Vec<Selector>,
    style: Style,
}

#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    rules: Vec<Rule>,
}

impl StyleSheet {
    pub fn parse(source: &str) -> Result<Self, StyleError> {
        let mut input = ParserInput::new(source);
        let mut parser = Parser::new(&mut input);
        let mut rules = Vec::new();

        loop {
            parser.skip_whitespace();
            if parser.is_exhausted() {
                break;
            }
            let start = parser.position();
            let selectors = parse_selectors(&mut parser, start)?;
            let prelude = prelude_text(parser.slice_from(start));
            let style = parser
                .parse_nested_block(declaration_block)
                .map_err(|_| StyleError::Unclosed(prelude.clone()))?;
            // cssparser closes blocks left open at end of input
            if !parser.slice_from(start).trim_end().ends_with('}') {
                return Err(StyleError::Unclosed(prelude));
            }
            rules.push(Rule { selectors, style });
        }

        debug!(rules = rules.len(), "parsed style sheet");
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Cascade every matching rule, then the widget's inline style
    pub fn compute(&self, widget: &Widget) -> Style {
        let mut matched: Vec<((usize, usize, usize), usize, &Style)> = self
            .rules
            .iter()
            .enumerate()
            .filter_map(|(order, rule)| {
                rule.selectors
                    .iter()
                    .filter(|selector| selector.matches(widget))
                    .map(Selector::specificity)
                    .max()
                    .map(|specificity| (specificity, order, &rule.style))
            })
            .collect();
        matched.sort_by_key(|(specificity, order, _)| (*specificity, *order));

        let mut style = Style::default();
        for (_, _, rule_style) in matched {
            style.merge(rule_style);
        }
        if !widget.inline_style().is_empty() {
            style.merge(&Style::parse(widget.inline_style()));
        }
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colors() {
        assert_eq!(Rgb::parse("#fe8a33"), Some(Rgb::new(0xfe, 0x8a, 0x33)));
        assert_eq!(Rgb::parse("#fff"), Some(Rgb::new(0xff, 0xff, 0xff)));
        assert_eq!(Rgb::parse("red"), Some(Rgb::new(0xff, 0, 0)));
        assert_eq!(Rgb::parse("Teal"), Some(Rgb::new(0, 0x80, 0x80)));
        assert_eq!(Rgb::parse("#12345"), None);
        assert_eq!(Rgb::parse("notacolor"), None);
        assert_eq!(Rgb::parse("#fff #000"), None);
    }

    #[test]
    fn test_parse_inline_style() {
        let style = Style::parse("height:150px; color: #cc006c;font-weight: bold; border: none");
        assert_eq!(style.height, Some(150.0));
        assert_eq!(style.color, Some(Rgb::new(0xcc, 0x00, 0x6c)));
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.background, None);
    }

    #[test]
    fn test_invalid_values_are_skipped() {
        let style = Style::parse("color: notacolor; font-size: big; min-height: 20; font-weight: 700");
        assert_eq!(style.color, None);
        assert_eq!(style.font_size, None);
        assert_eq!(style.min_height, Some(20.0));
        assert_eq!(style.bold, Some(true));

        // A broken declaration does not swallow the one after it
        let style = Style::parse("height: 10em; background: white");
        assert_eq!(style.height, None);
        assert_eq!(style.background, Some(Rgb::new(0xff, 0xff, 0xff)));
    }

    #[test]
    fn test_named_colors_in_sheet() {
        let sheet = StyleSheet::parse("Label.error { color: red; background-color: black; }").unwrap();
        let mut label = Widget::label();
        label.set_class("error");

        let style = sheet.compute(&label);
        assert_eq!(style.color, Some(Rgb::new(0xff, 0, 0)));
        assert_eq!(style.background, Some(Rgb::new(0, 0, 0)));
    }

    #[test]
    fn test_specificity_beats_source_order() {
        let sheet = StyleSheet::parse(
            r#"
            #clock { color: #00ff00; }
            Label { color: #ff0000; font-size: 12px; }
            "#,
        )
        .unwrap();
        let mut widget = Widget::label();
        widget.set_object_name("clock");

        let style = sheet.compute(&widget);
        assert_eq!(style.color, Some(Rgb::new(0, 0xff, 0)));
        assert_eq!(style.font_size, Some(12.0));
    }

    #[test]
    fn test_later_rule_wins_on_equal_specificity() {
        let sheet = StyleSheet::parse("Label { color: #111111; } Label { color: #222222; }").unwrap();
        assert_eq!(sheet.compute(&Widget::label()).color, Some(Rgb::new(0x22, 0x22, 0x22)));
    }

    #[test]
    fn test_property_and_class_selectors() {
        let sheet = StyleSheet::parse(
            r#"
            /* toggled lights */
            Button[light-on="true"] { background-color: #ffbf00; }
            .temperature, GroupBox { font-size: 18px; }
            Panel#top-level.main { color: #010203; }
            "#,
        )
        .unwrap();
        assert_eq!(sheet.len(), 3);

        let mut button = Widget::button();
        assert_eq!(sheet.compute(&button).background, None);
        button.set_property("light-on", "true");
        assert_eq!(sheet.compute(&button).background, Some(Rgb::new(0xff, 0xbf, 0x00)));

        let mut label = Widget::label();
        label.set_class("temperature");
        assert_eq!(sheet.compute(&label).font_size, Some(18.0));
        assert_eq!(sheet.compute(&Widget::group_box()).font_size, Some(18.0));

        let mut panel = Widget::panel();
        panel.set_object_name("top-level");
        assert_eq!(sheet.compute(&panel).color, None);
        panel.set_class("main");
        assert_eq!(sheet.compute(&panel).color, Some(Rgb::new(1, 2, 3)));
    }

    #[test]
    fn test_inline_style_overrides_sheet() {
        let sheet = StyleSheet::parse("* { color: #ffffff; height: 10px; }").unwrap();
        let mut widget = Widget::label();
        widget.set_inline_style("color: #000000;");

        let style = sheet.compute(&widget);
        assert_eq!(style.color, Some(Rgb::new(0, 0, 0)));
        assert_eq!(style.height, Some(10.0));
    }

    #[test]
    fn test_sheet_errors() {
        assert_eq!(
            StyleSheet::parse("Label { color: #fff;").unwrap_err(),
            StyleError::Unclosed("Label".to_string())
        );
        assert_eq!(
            StyleSheet::parse("Label { color: #fff; } Button").unwrap_err(),
            StyleError::MissingBlock("Button".to_string())
        );
        assert!(matches!(
            StyleSheet::parse("GroupBox Label { color: #fff; }"),
            Err(StyleError::BadSelector(_))
        ));
        assert!(matches!(
            StyleSheet::parse("Label, { color: #fff; }"),
            Err(StyleError::BadSelector(_))
        ));
        assert_eq!(
            StyleSheet::parse("\n{ color: #fff; }").unwrap_err(),
            StyleError::MissingSelector(2)
        );
    }
}
