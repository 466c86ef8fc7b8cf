use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use thiserror::Error;

use berth::domain::entities::{ValidationIssue, ValidationLevel};

#[derive(Error, Debug, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(berth::descriptor::invalid))]
pub struct DescriptorError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("{field}")]
    pub span: SourceSpan,

    pub field: String,
}

#[derive(Error, Debug, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(berth::descriptor::lint), severity(Warning))]
pub struct DescriptorWarning {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("{field}")]
    pub span: SourceSpan,

    pub field: String,
}

/// Points at the key an issue refers to. `runtime.force-unbuffered-output`
/// looks up `force-unbuffered-output`; `system-packages[2]` looks up
/// `system-packages`. Fields left at their defaults have no span.
pub fn locate(text: &str, field: &str) -> SourceSpan {
    let key = field.rsplit('.').next().unwrap_or(field);
    let key = key.split('[').next().unwrap_or(key);

    match find_key(text, key) {
        Some(offset) => SourceSpan::new(offset.into(), key.len()),
        None => SourceSpan::new(SourceOffset::from(0), 0),
    }
}

/// First occurrence of `key` that starts a line (TOML/YAML) or is quoted (JSON).
fn find_key(text: &str, key: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        if trimmed.starts_with(key) {
            return Some(offset + indent);
        }
        if let Some(pos) = trimmed.find(&format!("\"{}\"", key)) {
            return Some(offset + indent + pos + 1);
        }
        offset += line.len();
    }
    None
}

pub fn report_issue(file_path: &str, text: &str, issue: &ValidationIssue) {
    let src = NamedSource::new(file_path, text.to_string());
    let span = locate(text, &issue.field);

    let report = match issue.level {
        ValidationLevel::Error => miette::Report::new(DescriptorError {
            message: issue.message.clone(),
            src,
            span,
            field: issue.field.clone(),
        }),
        _ => miette::Report::new(DescriptorWarning {
            message: issue.message.clone(),
            src,
            span,
            field: issue.field.clone(),
        }),
    };

    eprintln!("{:?}", report);
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = "base = \"python:latest\"\nexpose = 9000\n\n[runtime]\nforce-unbuffered-output = false\n";

    #[test]
    fn test_locates_top_level_key() {
        let span = locate(TOML, "expose");
        assert_eq!(span.offset(), TOML.find("expose").unwrap());
        assert_eq!(span.len(), "expose".len());
    }

    #[test]
    fn test_locates_nested_key() {
        let span = locate(TOML, "runtime.force-unbuffered-output");
        assert_eq!(span.offset(), TOML.find("force-unbuffered-output").unwrap());
    }

    #[test]
    fn test_locates_quoted_json_key() {
        let json = "{\n  \"base\": \"python:3.10-slim\",\n  \"expose\": 9000\n}\n";
        let span = locate(json, "expose");
        assert_eq!(&json[span.offset()..span.offset() + span.len()], "expose");
    }

    #[test]
    fn test_default_field_has_empty_span() {
        let span = locate(TOML, "system-packages[0]");
        assert_eq!(span.len(), 0);
    }
}
