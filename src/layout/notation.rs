//! Line-level grammar of the layout notation
//!
//! ```text
//! Kind#identifier.class(key=value, key=value) literal text
//! ```
//!
//! Every token after the kind is optional. Nesting comes from indentation in
//! units of [`INDENT_WIDTH`] columns. `stretch` alone on a line is a directive.

use super::LayoutError;

pub const INDENT_WIDTH: usize = 4;
pub const COMMENT_MARKER: &str = "//";
pub const STRETCH: &str = "stretch";

/// A non-blank, non-comment line with its measured depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number in the unfiltered notation text
    pub number: usize,
    pub depth: usize,
    /// Line content without indentation or trailing whitespace
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeDecl {
    pub kind: String,
    pub id: Option<String>,
    pub class: Option<String>,
    /// Attributes in source order
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
}

impl NodeDecl {
    /// Last value given for `key`
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Stretch,
    Node(NodeDecl),
}

/// Leading whitespace in columns; a tab counts as one indentation unit
pub fn indent_columns(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { INDENT_WIDTH } else { 1 })
        .sum()
}

/// Drop blank lines and comments, then measure the depth of what remains.
/// Comments are removed first so they never affect nesting.
pub fn significant_lines(source: &str) -> Result<Vec<SourceLine<'_>>, LayoutError> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with(COMMENT_MARKER)
        })
        .map(|(index, line)| {
            let number = index + 1;
            let columns = indent_columns(line);
            if columns % INDENT_WIDTH != 0 {
                return Err(LayoutError::BadIndent {
                    line: number,
                    columns,
                    width: INDENT_WIDTH,
                });
            }
            Ok(SourceLine {
                number,
                depth: columns / INDENT_WIDTH,
                text: line.trim(),
            })
        })
        .collect()
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_ident(c: char) -> bool {
    is_word(c) || c == '-'
}

fn split_while(text: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = text.find(|c: char| !pred(c)).unwrap_or(text.len());
    text.split_at(end)
}

/// Parse one line into a declaration
pub fn parse_declaration(line: &SourceLine<'_>) -> Result<Declaration, LayoutError> {
    let number = line.number;
    let unexpected = |rest: &str| LayoutError::UnexpectedCharacter {
        line: number,
        found: rest.chars().next().unwrap_or(' '),
    };

    let (kind, mut rest) = split_while(line.text, is_word);
    if kind.is_empty() {
        return Err(unexpected(rest));
    }
    if kind == STRETCH {
        if !rest.trim().is_empty() {
            return Err(LayoutError::StretchArguments { line: number });
        }
        return Ok(Declaration::Stretch);
    }

    let mut decl = NodeDecl {
        kind: kind.to_string(),
        ..NodeDecl::default()
    };

    if let Some(after) = rest.strip_prefix('#') {
        let (id, after) = split_while(after, is_ident);
        if id.is_empty() {
            return Err(LayoutError::EmptyIdentifier { line: number });
        }
        decl.id = Some(id.to_string());
        rest = after;
    }

    if let Some(after) = rest.strip_prefix('.') {
        let (class, after) = split_while(after, is_ident);
        // A bare '.' is accepted and tags nothing
        if !class.is_empty() {
            decl.class = Some(class.to_string());
        }
        rest = after;
    }

    if let Some(after) = rest.strip_prefix('(') {
        // The list runs to the last ')' so values may contain parentheses
        let close = after
            .rfind(')')
            .ok_or(LayoutError::UnclosedAttributes { line: number })?;
        decl.attributes = parse_attributes(&after[..close], number)?;
        rest = &after[close + 1..];
    }

    if !rest.is_empty() {
        if !rest.starts_with(char::is_whitespace) {
            return Err(unexpected(rest));
        }
        let text = rest.trim();
        if let Some(found) = text.chars().find(|&c| !is_ident(c) && c != ' ') {
            return Err(LayoutError::UnexpectedCharacter { line: number, found });
        }
        if !text.is_empty() {
            decl.text = Some(text.to_string());
        }
    }

    Ok(Declaration::Node(decl))
}

fn parse_attributes(body: &str, line: usize) -> Result<Vec<(String, String)>, LayoutError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    body.split(',')
        .map(|entry| {
            let entry = entry.trim();
            entry
                .split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| LayoutError::MalformedAttribute {
                    line,
                    entry: entry.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> SourceLine<'_> {
        SourceLine { number: 1, depth: 0, text }
    }

    fn node(text: &str) -> NodeDecl {
        match parse_declaration(&line(text)).unwrap() {
            Declaration::Node(decl) => decl,
            Declaration::Stretch => panic!("expected a node"),
        }
    }

    #[test]
    fn test_full_declaration() {
        let decl = node("Button#forecast-day-0-details.day(expanding=true, style=height:150px;) Details");
        assert_eq!(decl.kind, "Button");
        assert_eq!(decl.id.as_deref(), Some("forecast-day-0-details"));
        assert_eq!(decl.class.as_deref(), Some("day"));
        assert_eq!(
            decl.attributes,
            vec![
                ("expanding".to_string(), "true".to_string()),
                ("style".to_string(), "height:150px;".to_string()),
            ]
        );
        assert_eq!(decl.text.as_deref(), Some("Details"));
    }

    #[test]
    fn test_kind_only() {
        assert_eq!(
            node("VBoxLayout"),
            NodeDecl {
                kind: "VBoxLayout".to_string(),
                ..NodeDecl::default()
            }
        );
    }

    #[test]
    fn test_class_without_id_and_text() {
        let decl = node("Label.temperature -");
        assert_eq!(decl.id, None);
        assert_eq!(decl.class.as_deref(), Some("temperature"));
        assert_eq!(decl.text.as_deref(), Some("-"));
    }

    #[test]
    fn test_empty_class_tags_nothing() {
        assert_eq!(node("Label#a.").class, None);
    }

    #[test]
    fn test_empty_attribute_list() {
        assert!(node("GroupBox()").attributes.is_empty());
    }

    #[test]
    fn test_last_attribute_value_wins() {
        let decl = node("Label(align=left, align=right)");
        assert_eq!(decl.attribute("align"), Some("right"));
        assert_eq!(decl.attribute("style"), None);
    }

    #[test]
    fn test_stretch_directive() {
        assert_eq!(parse_declaration(&line("stretch")).unwrap(), Declaration::Stretch);
        assert!(matches!(
            parse_declaration(&line("stretch#gap")),
            Err(LayoutError::StretchArguments { line: 1 })
        ));
    }

    #[test]
    fn test_malformed_attribute() {
        let err = parse_declaration(&line("Label(align)")).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::MalformedAttribute { line: 1, ref entry } if entry == "align"
        ));
    }

    #[test]
    fn test_unclosed_attributes() {
        assert!(matches!(
            parse_declaration(&line("Label(align=left")),
            Err(LayoutError::UnclosedAttributes { line: 1 })
        ));
    }

    #[test]
    fn test_unexpected_characters() {
        assert!(matches!(
            parse_declaration(&line("Label Lights: on")),
            Err(LayoutError::UnexpectedCharacter { found: ':', .. })
        ));
        assert!(matches!(
            parse_declaration(&line("Label!")),
            Err(LayoutError::UnexpectedCharacter { found: '!', .. })
        ));
        assert!(matches!(
            parse_declaration(&line("#orphan")),
            Err(LayoutError::UnexpectedCharacter { found: '#', .. })
        ));
        assert!(matches!(
            parse_declaration(&line("Label#")),
            Err(LayoutError::EmptyIdentifier { .. })
        ));
    }

    #[test]
    fn test_significant_lines_skip_comments_and_blanks() {
        let source = "VBoxLayout\n\n        // comment at any depth\n    Label#a\n   \n    Label#b";
        let lines = significant_lines(source).unwrap();
        let summary: Vec<_> = lines.iter().map(|l| (l.number, l.depth, l.text)).collect();
        assert_eq!(
            summary,
            vec![(1, 0, "VBoxLayout"), (4, 1, "Label#a"), (6, 1, "Label#b")]
        );
    }

    #[test]
    fn test_tabs_count_as_one_level() {
        let lines = significant_lines("VBoxLayout\n\tLabel").unwrap();
        assert_eq!(lines[1].depth, 1);
    }

    #[test]
    fn test_misaligned_indent() {
        assert!(matches!(
            significant_lines("VBoxLayout\n  Label"),
            Err(LayoutError::BadIndent { line: 2, columns: 2, width: 4 })
        ));
    }
}
