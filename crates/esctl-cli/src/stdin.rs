// crates/esctl-cli/src/stdin.rs - Centralized STDIN handling utility
//
// Request bodies (index configurations, raw call payloads) come either from
// a file or from a pipe. Follows Unix conventions: when no file is given and
// stdin is not a terminal, the body is read from stdin.

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

/// Read a JSON document from `path`, or from piped stdin when `path` is None
///
/// Returns `None` when there is nothing to read: no path and an interactive
/// terminal, or blank input.
///
/// UNIX PATTERN:
/// ```bash
/// esctl index create logs --configuration logs.json
/// cat logs.json | esctl index create logs
/// ```
pub fn read_document(path: Option<&Path>) -> Result<Option<Value>> {
    let content = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?,
        None if io::stdin().is_terminal() => return Ok(None),
        None => read_stdin()?,
    };

    parse_document(&content)
}

/// Body given on the command line, "-" meaning stdin
pub fn read_body_arg(arg: Option<&str>) -> Result<Option<Value>> {
    match arg {
        None => Ok(None),
        Some("-") => {
            if io::stdin().is_terminal() {
                return Err(anyhow!(
                    "No input provided. Pipe the request body or pass it directly.\n\nExamples:\n  esctl raw -X PUT -d '{{\"index\": {{}}}}' /logs\n  cat body.json | esctl raw -X PUT -d - /logs"
                ));
            }
            parse_document(&read_stdin()?)
        }
        Some(body) => parse_document(body),
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn parse_document(content: &str) -> Result<Option<Value>> {
    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(content)
        .map(Some)
        .context("Request body is not a valid JSON document")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_document_from_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"settings": {"number_of_shards": 1}}"#).unwrap();

        let document = read_document(Some(file.path())).unwrap();
        assert_eq!(document, Some(json!({"settings": {"number_of_shards": 1}})));
    }

    #[test]
    fn test_blank_and_invalid_documents() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "  \n").unwrap();
        assert_eq!(read_document(Some(file.path())).unwrap(), None);

        fs::write(file.path(), "{nope").unwrap();
        assert!(read_document(Some(file.path())).is_err());
    }

    #[test]
    fn test_inline_body() {
        assert_eq!(read_body_arg(None).unwrap(), None);
        assert_eq!(read_body_arg(Some(r#"{"a": 1}"#)).unwrap(), Some(json!({"a": 1})));
        assert!(read_body_arg(Some("a=1")).is_err());
    }
}
