//! CSS handling for the static DOM: stylesheet parsing with `cssparser`,
//! media query evaluation, specificity, shorthand expansion and
//! browser-style value normalisation.

use crate::Viewport;
use cssparser::{Delimiter, ParseError, Parser, ParserInput, SourcePosition, Token};

/// (ids, classes/attributes/pseudo-classes, types)
pub type Specificity = (u32, u32, u32);

/// One `property: value` pair and its `!important` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// A style rule with a single (non-list) selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub specificity: Specificity,
    /// Source order, used to break specificity ties
    pub order: usize,
    pub declarations: Vec<Declaration>,
}

/// Properties whose computed value falls back to the parent's.
pub const INHERITED: &[&str] = &[
    "color",
    "font-size",
    "font-family",
    "text-shadow",
    "visibility",
    "text-align",
];

const BORDER_STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

type Parsed<'i, T> = Result<T, ParseError<'i, ()>>;

/// Parse a stylesheet into rules. Selector lists are split into one rule per
/// selector. `@media` blocks are kept when their query matches `viewport`;
/// other at-rules are skipped.
pub fn parse_stylesheet(css: &str, first_order: usize, viewport: Viewport) -> Vec<Rule> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();
    let mut order = first_order;
    parse_rule_list(&mut parser, viewport, &mut order, &mut rules);
    rules
}

fn parse_rule_list<'i>(
    parser: &mut Parser<'i, '_>,
    viewport: Viewport,
    order: &mut usize,
    rules: &mut Vec<Rule>,
) {
    loop {
        parser.skip_whitespace();
        let start = parser.position();
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::AtKeyword(name) => {
                let matched = if name.eq_ignore_ascii_case("media") {
                    media_query_matches(parser, viewport)
                } else {
                    skip_at_rule_prelude(parser);
                    None
                };
                if matched == Some(true) {
                    let _ = parser.parse_nested_block(|p| -> Parsed<'i, ()> {
                        parse_rule_list(p, viewport, order, rules);
                        Ok(())
                    });
                }
            }
            Token::CurlyBracketBlock => {}
            first => {
                if opens_block(&first) {
                    skip_block(parser);
                }
                let Some(prelude_end) = find_block(parser) else {
                    break;
                };
                let prelude = parser.slice(start..prelude_end).trim().to_string();
                let declarations = parser
                    .parse_nested_block(|p| -> Parsed<'i, Vec<Declaration>> {
                        Ok(parse_declaration_list(p))
                    })
                    .unwrap_or_default();
                for selector in split_selector_list(&prelude) {
                    rules.push(Rule {
                        specificity: specificity(&selector),
                        selector,
                        order: *order,
                        declarations: declarations.clone(),
                    });
                    *order += 1;
                }
            }
        }
    }
}

/// Consume a qualified rule's prelude and its opening `{`; returns where the
/// prelude ends.
fn find_block(parser: &mut Parser) -> Option<SourcePosition> {
    loop {
        let before = parser.position();
        match parser.next().cloned() {
            Ok(Token::CurlyBracketBlock) => return Some(before),
            Ok(token) if opens_block(&token) => skip_block(parser),
            Ok(_) => {}
            Err(_) => return None,
        }
    }
}

fn opens_block(token: &Token) -> bool {
    matches!(
        token,
        Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock
    )
}

/// Step over the contents of the block the parser just opened, so that
/// `position()` lands after its closing token.
fn skip_block<'i>(parser: &mut Parser<'i, '_>) {
    let _ = parser.parse_nested_block(|p| -> Parsed<'i, ()> {
        while p.next_including_whitespace_and_comments().is_ok() {}
        Ok(())
    });
}

fn skip_at_rule_prelude(parser: &mut Parser) {
    while let Ok(token) = parser.next().cloned() {
        if matches!(token, Token::CurlyBracketBlock | Token::Semicolon) {
            break;
        }
    }
}

/// Evaluate a `@media` prelude, consuming it up to its block. `None` when
/// the rule has no block.
fn media_query_matches(parser: &mut Parser, viewport: Viewport) -> Option<bool> {
    let mut any = false;
    let mut current = true;
    let mut negate = false;
    loop {
        let token = parser.next().cloned().ok()?;
        match token {
            Token::Comma => {
                any |= current != negate;
                current = true;
                negate = false;
            }
            Token::Ident(word) => match word.to_ascii_lowercase().as_str() {
                "not" => negate = true,
                "only" | "and" | "all" | "screen" => {}
                _ => current = false,
            },
            Token::ParenthesisBlock => {
                let holds = parser
                    .parse_nested_block(|p| media_feature(p, viewport))
                    .unwrap_or(false);
                current &= holds;
            }
            Token::CurlyBracketBlock => return Some(any || current != negate),
            Token::Semicolon => return None,
            _ => current = false,
        }
    }
}

fn media_feature<'i>(parser: &mut Parser<'i, '_>, viewport: Viewport) -> Parsed<'i, bool> {
    let name = parser.expect_ident()?.to_ascii_lowercase();
    if parser.is_exhausted() {
        return Ok(matches!(name.as_str(), "color" | "hover" | "pointer"));
    }
    parser.expect_colon()?;
    let width = viewport.width as f64;
    let height = viewport.height as f64;
    if name == "orientation" {
        let wanted = parser.expect_ident()?.to_ascii_lowercase();
        return Ok((wanted == "landscape") == (width >= height));
    }
    let px = match parser.next()?.clone() {
        Token::Dimension { value, unit, .. } => match unit.to_ascii_lowercase().as_str() {
            "px" => value as f64,
            "em" | "rem" => value as f64 * 16.0,
            _ => return Ok(false),
        },
        Token::Number { value, .. } if value == 0.0 => 0.0,
        _ => return Ok(false),
    };
    Ok(match name.as_str() {
        "min-width" => width >= px,
        "max-width" => width <= px,
        "width" => width == px,
        "min-height" => height >= px,
        "max-height" => height <= px,
        "height" => height == px,
        _ => false,
    })
}

/// Parse `prop: value; ...` (a rule body or a `style` attribute).
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(body);
    let mut parser = Parser::new(&mut input);
    parse_declaration_list(&mut parser)
}

fn parse_declaration_list(parser: &mut Parser) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    while !parser.is_exhausted() {
        if let Ok(declaration) = parser.parse_until_after(Delimiter::Semicolon, parse_declaration) {
            declarations.push(declaration);
        }
    }
    declarations
}

fn parse_declaration<'i>(parser: &mut Parser<'i, '_>) -> Parsed<'i, Declaration> {
    let property = parser.expect_ident()?.to_ascii_lowercase();
    parser.expect_colon()?;
    parser.skip_whitespace();
    let start = parser.position();
    let mut end = start;
    let mut important = false;
    loop {
        let before = parser.position();
        match parser.next().cloned() {
            Ok(Token::Delim('!')) => {
                if parser
                    .try_parse(|p| p.expect_ident_matching("important"))
                    .is_ok()
                {
                    important = true;
                    end = before;
                    break;
                }
                end = parser.position();
            }
            Ok(token) => {
                if opens_block(&token) {
                    skip_block(parser);
                }
                end = parser.position();
            }
            Err(_) => break,
        }
    }
    let value = parser.slice(start..end).trim().to_string();
    if value.is_empty() {
        return Err(parser.new_custom_error(()));
    }
    Ok(Declaration {
        property,
        value,
        important,
    })
}

/// Split a selector list on its top-level commas.
fn split_selector_list(prelude: &str) -> Vec<String> {
    let mut input = ParserInput::new(prelude);
    let mut parser = Parser::new(&mut input);
    let mut parts = Vec::new();
    let mut start = parser.position();
    loop {
        let before = parser.position();
        match parser.next_including_whitespace_and_comments().cloned() {
            Ok(Token::Comma) => {
                parts.push(parser.slice(start..before).trim().to_string());
                start = parser.position();
            }
            Ok(token) if opens_block(&token) => skip_block(&mut parser),
            Ok(_) => {}
            Err(_) => {
                parts.push(parser.slice_from(start).trim().to_string());
                break;
            }
        }
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Specificity of a selector; for a list, the highest of its members.
pub fn specificity(selector: &str) -> Specificity {
    let mut input = ParserInput::new(selector);
    let mut parser = Parser::new(&mut input);
    list_specificity(&mut parser)
}

#[derive(Clone, Copy, PartialEq)]
enum Prev {
    Start,
    Dot,
    Colon,
    DoubleColon,
    Other,
}

fn list_specificity<'i>(parser: &mut Parser<'i, '_>) -> Specificity {
    let mut best = (0, 0, 0);
    let mut current = (0, 0, 0);
    let mut prev = Prev::Start;
    while let Ok(token) = parser.next_including_whitespace().cloned() {
        prev = match token {
            Token::Comma => {
                best = best.max(current);
                current = (0, 0, 0);
                Prev::Start
            }
            Token::IDHash(_) => {
                current.0 += 1;
                Prev::Other
            }
            Token::Delim('.') => Prev::Dot,
            Token::Colon if prev == Prev::Colon => Prev::DoubleColon,
            Token::Colon => Prev::Colon,
            Token::Ident(_) => {
                match prev {
                    Prev::Dot | Prev::Colon => current.1 += 1,
                    _ => current.2 += 1,
                }
                Prev::Other
            }
            Token::SquareBracketBlock => {
                current.1 += 1;
                Prev::Other
            }
            Token::Function(name) => {
                // `:is()`/`:not()` count their most specific argument, `:where()` nothing
                let inner = parser
                    .parse_nested_block(|p| -> Parsed<'i, Specificity> { Ok(list_specificity(p)) })
                    .unwrap_or_default();
                match (prev, name.to_ascii_lowercase().as_str()) {
                    (Prev::Colon, "where") => {}
                    (Prev::Colon, "is" | "not" | "has" | "matches") => {
                        current = (current.0 + inner.0, current.1 + inner.1, current.2 + inner.2)
                    }
                    (Prev::Colon, _) => current.1 += 1,
                    (Prev::DoubleColon, _) => current.2 += 1,
                    _ => {}
                }
                Prev::Other
            }
            _ => Prev::Other,
        };
    }
    best.max(current)
}

/// Split on `sep` outside parentheses, trimming and dropping empty pieces.
pub fn split_top_level(s: &str, sep: impl Fn(char) -> bool) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && sep(c) {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn tokens(value: &str) -> Vec<String> {
    split_top_level(value, char::is_whitespace)
}

/// Pixel value of a length (`5px`, `0`, `thin`/`medium`/`thick`).
pub fn parse_px(value: &str) -> Option<f64> {
    let v = value.trim().to_ascii_lowercase();
    match v.as_str() {
        "0" => return Some(0.0),
        "thin" => return Some(1.0),
        "medium" => return Some(3.0),
        "thick" => return Some(5.0),
        _ => {}
    }
    v.strip_suffix("px")?.trim().parse::<f64>().ok()
}

pub fn format_px(px: f64) -> String {
    format!("{}px", (px * 100.0).round() / 100.0)
}

/// Normalise a colour to `rgb(r, g, b)` / `rgba(r, g, b, a)`.
pub fn normalize_color(value: &str) -> Option<String> {
    let color = csscolorparser::parse(value.trim()).ok()?;
    let [r, g, b, a] = color.to_rgba8();
    if a == 255 {
        Some(format!("rgb({}, {}, {})", r, g, b))
    } else {
        let alpha = (a as f64 / 255.0 * 100.0).round() / 100.0;
        Some(format!("rgba({}, {}, {}, {})", r, g, b, alpha))
    }
}

fn is_color(token: &str) -> bool {
    token.eq_ignore_ascii_case("currentcolor") || normalize_color(token).is_some()
}

/// Expand a declaration into the longhands the cascade stores.
pub fn expand(prop: &str, value: &str) -> Vec<(String, String)> {
    match prop {
        "border" => {
            let mut width = "medium".to_string();
            let mut style = "none".to_string();
            let mut color = "currentcolor".to_string();
            for token in tokens(value) {
                let lower = token.to_ascii_lowercase();
                if BORDER_STYLES.contains(&lower.as_str()) {
                    style = lower;
                } else if parse_px(&token).is_some() {
                    width = token;
                } else {
                    color = token;
                }
            }
            vec![
                ("border-width".into(), width),
                ("border-style".into(), style),
                ("border-color".into(), color),
            ]
        }
        "background" => tokens(value)
            .into_iter()
            .find(|t| is_color(t))
            .map(|c| vec![("background-color".to_string(), c)])
            .unwrap_or_default(),
        _ => vec![(prop.to_string(), value.to_string())],
    }
}

/// Normalise a `text-shadow` value; missing colours take `current_color`.
pub fn normalize_text_shadow(value: &str, current_color: &str) -> String {
    if value.trim().eq_ignore_ascii_case("none") {
        return "none".to_string();
    }
    split_top_level(value, |c| c == ',')
        .iter()
        .map(|shadow| {
            let mut color = None;
            let mut lengths = Vec::new();
            for token in tokens(shadow) {
                match parse_px(&token) {
                    Some(px) => lengths.push(format_px(px)),
                    None => color = Some(token),
                }
            }
            while lengths.len() < 3 {
                lengths.push("0px".to_string());
            }
            let color = color
                .and_then(|c| normalize_color(&c))
                .unwrap_or_else(|| current_color.to_string());
            format!("{} {}", color, lengths.join(" "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve a `font-size` against the parent's computed pixel size.
pub fn resolve_font_size(value: &str, parent_px: f64) -> Option<f64> {
    let v = value.trim().to_ascii_lowercase();
    let keyword = match v.as_str() {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        _ => None,
    };
    if keyword.is_some() {
        return keyword;
    }
    if let Some(em) = v.strip_suffix("rem") {
        return em.trim().parse::<f64>().ok().map(|n| n * 16.0);
    }
    if let Some(em) = v.strip_suffix("em") {
        return em.trim().parse::<f64>().ok().map(|n| n * parent_px);
    }
    if let Some(pct) = v.strip_suffix('%') {
        return pct.trim().parse::<f64>().ok().map(|n| n / 100.0 * parent_px);
    }
    parse_px(&v)
}
