use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong building or addressing a layout.
///
/// Parse-time variants carry the 1-based line number in the notation source.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("line {line}: unknown widget kind '{kind}'")]
    UnknownKind { line: usize, kind: String },

    #[error("line {line}: kind '{kind}' does not match the arrangement naming convention")]
    KindMismatch { line: usize, kind: String },

    #[error("line {line}: malformed attribute '{entry}' (expected key=value)")]
    MalformedAttribute { line: usize, entry: String },

    #[error("line {line}: attribute list is missing its closing ')'")]
    UnclosedAttributes { line: usize },

    #[error("line {line}: unknown alignment '{value}'")]
    UnknownAlignment { line: usize, value: String },

    #[error("line {line}: indentation of {columns} columns is not a multiple of {width}")]
    BadIndent { line: usize, columns: usize, width: usize },

    #[error("line {line}: indentation jumps from depth {from} to {to}")]
    IndentJump { line: usize, from: usize, to: usize },

    #[error("line {line}: indented line has no declaration to nest under")]
    OrphanIndent { line: usize },

    #[error("line {line}: '{kind}' cannot have children")]
    ChildrenOfLeaf { line: usize, kind: String },

    #[error("line {line}: '{parent}' has no layout to hold '{kind}'")]
    NoLayout { line: usize, parent: String, kind: String },

    #[error("line {line}: identifier '{id}' was already declared on line {first}")]
    DuplicateId { line: usize, id: String, first: usize },

    #[error("line {line}: empty identifier after '#'")]
    EmptyIdentifier { line: usize },

    #[error("line {line}: unexpected character '{found}'")]
    UnexpectedCharacter { line: usize, found: char },

    #[error("line {line}: 'stretch' takes no identifier, class, attributes or text")]
    StretchArguments { line: usize },

    #[error("line {line}: '{kind}' cannot carry text")]
    NoCaption { line: usize, kind: String },

    #[error("no widget registered with id '{0}'")]
    NotFound(String),

    #[error("widget '{id}' ({kind}) does not support {operation}")]
    Unsupported {
        id: String,
        kind: String,
        operation: &'static str,
    },

    #[error("failed to load icon {}: {source}", path.display())]
    Icon {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
