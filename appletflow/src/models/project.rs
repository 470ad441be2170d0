use crate::constants::DEFAULT_PREVIEW_PATH;
use crate::errors::{AppletflowError, ParseTarget};
use crate::models::diff::WorkflowDiff;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Candidate `{` positions tried before brace extraction gives up.
const MAX_OBJECT_CANDIDATES: usize = 16;

const PROSE_PREFIXES: [&str; 4] = ["here's", "here is", "i'll", "the "];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub name: String,
    pub content: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl ProjectFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        ProjectFile {
            name: name.into(),
            content: content.into(),
            content_type: None,
        }
    }

    pub fn resolved_content_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| content_type_for(&self.name).to_string())
    }

    /// Lenient conversion of one `{name, content, type?}` entry.
    /// Entries without a string name or without a `content` key are dropped. Non-string content is stringified.
    pub fn from_value(value: &Value) -> Option<ProjectFile> {
        let name = value.get("name")?.as_str()?.to_string();
        let content = match value.get("content")? {
            Value::String(content) => content.clone(),
            other => other.to_string(),
        };
        let content_type = value.get("type").and_then(Value::as_str).map(str::to_string);

        Some(ProjectFile {
            name,
            content,
            content_type,
        })
    }
}

/// Last generation result, persisted under `LAST_PROJECT_KEY`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub generation_id: String,
    pub created_at: DateTime<Utc>,
    pub primary_file: String,
    pub files: Vec<ProjectFile>,
    pub preview_id: String,
    pub preview_url: Option<String>,
    pub summary: Option<String>,
}

impl ProjectMetadata {
    pub fn summary_of(diff: Option<&WorkflowDiff>) -> Option<String> {
        diff.map(|d| d.summary.clone())
    }
}

pub fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();

    if lower.ends_with(".html") {
        "text/html; charset=utf-8"
    } else if lower.ends_with(".css") {
        "text/css; charset=utf-8"
    } else if lower.ends_with(".js") {
        "text/javascript; charset=utf-8"
    } else if lower.ends_with(".json") {
        "application/json; charset=utf-8"
    } else if lower.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "text/plain; charset=utf-8"
    }
}

/// First `index.html`, else the first `.html`, else the first file.
pub fn primary_document(files: &[ProjectFile]) -> Option<&ProjectFile> {
    files
        .iter()
        .find(|f| f.name == DEFAULT_PREVIEW_PATH)
        .or_else(|| files.iter().find(|f| f.name.to_ascii_lowercase().ends_with(".html")))
        .or_else(|| files.first())
}

/// Files from an AI response that is either a project JSON or a single HTML document.
pub fn parse_generated_files(content: &str) -> Result<Vec<ProjectFile>, AppletflowError> {
    match parse_project_from_response(content) {
        Ok(files) => Ok(files),
        Err(files_err) => {
            let lower = content.to_ascii_lowercase();
            if !lower.contains("<html") && !lower.contains("<!doctype") {
                return Err(files_err);
            }

            let html = parse_html_from_response(content)?;

            Ok(vec![ProjectFile::new(DEFAULT_PREVIEW_PATH, html)])
        }
    }
}

/// Best-effort extraction of `{"files": [...]}` from LLM output.
///
/// Strict parse of the raw text first, then of the fence-stripped text, then the first balanced
/// `{...}` that parses, looked up in the fenced body and then in the raw text.
/// Brace matching skips string literals but is a heuristic, not a JSON parser.
pub fn parse_project_from_response(content: &str) -> Result<Vec<ProjectFile>, AppletflowError> {
    let raw = content.trim();
    if raw.is_empty() {
        return Err(parse_files_error("empty response"));
    }

    // file contents may carry their own fenced blocks, so the untouched text goes first
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return files_from_value(&value);
    }

    let cleaned = strip_code_fence(raw).trim();
    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        return files_from_value(&value);
    }

    let mut found_object = false;

    let candidates = balanced_objects(cleaned)
        .take(MAX_OBJECT_CANDIDATES)
        .chain(balanced_objects(raw).take(MAX_OBJECT_CANDIDATES));

    for candidate in candidates {
        found_object = true;

        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            if value.get("files").is_some() {
                return files_from_value(&value);
            }
        }
    }

    if found_object {
        Err(parse_files_error("failed to parse project structure response"))
    } else {
        Err(parse_files_error("invalid project structure response format"))
    }
}

fn files_from_value(value: &Value) -> Result<Vec<ProjectFile>, AppletflowError> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(_) => value
            .get("files")
            .and_then(Value::as_array)
            .ok_or_else(|| parse_files_error("invalid project structure: missing files array"))?,
        _ => return Err(parse_files_error("invalid project structure: missing files array")),
    };

    let files: Vec<ProjectFile> = entries.iter().filter_map(ProjectFile::from_value).collect();

    if files.is_empty() {
        return Err(parse_files_error("invalid project structure: files array has no usable files"));
    }

    Ok(files)
}

fn parse_files_error(message: &str) -> AppletflowError {
    AppletflowError::ParseError(ParseTarget::Files, message.to_string())
}

/// Inner text of the first fenced code block, or the whole text when there is none.
fn strip_code_fence(content: &str) -> &str {
    let Some(open) = content.find("```") else {
        return content;
    };

    let after_open = &content[open + 3..];
    // the info string (`json`, `html`) runs to the end of the opening line
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];

    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

/// Balanced `{...}` slices in order of their opening brace.
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices('{')
        .filter_map(move |(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
}

/// Byte length of the balanced object at the start of `text`, if it closes.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// One complete HTML document from an AI response. Bare fragments are wrapped in a minimal page.
pub fn parse_html_from_response(content: &str) -> Result<String, AppletflowError> {
    let cleaned = strip_code_fence(content).trim();
    if cleaned.is_empty() {
        return Err(AppletflowError::ParseError(
            ParseTarget::Html,
            "empty response".to_string(),
        ));
    }

    let lower = cleaned.to_ascii_lowercase();
    let end = lower.rfind("</html>").map(|i| i + "</html>".len());

    if let (Some(start), Some(end)) = (lower.find("<!doctype"), end) {
        if start < end {
            return Ok(cleaned[start..end].to_string());
        }
    }

    if let (Some(start), Some(end)) = (lower.find("<html"), end) {
        if start < end {
            return Ok(format!("<!DOCTYPE html>\n{}", &cleaned[start..end]));
        }
    }

    let fragment = strip_prose_prefix(cleaned);
    if fragment.is_empty() {
        return Err(AppletflowError::ParseError(
            ParseTarget::Html,
            "response contains no markup".to_string(),
        ));
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Generated App</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body>
{}
</body>
</html>"#,
        fragment
    ))
}

/// Drops a leading "Here's your app:" style line.
fn strip_prose_prefix(text: &str) -> &str {
    let first_line_end = text.find('\n').unwrap_or(text.len());
    let first_line = text[..first_line_end].trim().to_ascii_lowercase();

    if first_line.ends_with(':') && PROSE_PREFIXES.iter().any(|p| first_line.starts_with(p)) {
        text[first_line_end..].trim()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_files() -> Value {
        json!({
            "files": [
                {"name": "index.html", "content": "<!DOCTYPE html><html><body>{ hi }</body></html>"},
                {"name": "app.js", "content": "function f() { return { a: 1 }; }", "type": "text/javascript"}
            ]
        })
    }

    fn expected_files() -> Vec<ProjectFile> {
        vec![
            ProjectFile::new("index.html", "<!DOCTYPE html><html><body>{ hi }</body></html>"),
            ProjectFile {
                name: "app.js".to_string(),
                content: "function f() { return { a: 1 }; }".to_string(),
                content_type: Some("text/javascript".to_string()),
            },
        ]
    }

    #[test]
    fn parses_plain_json() {
        let files = parse_project_from_response(&sample_files().to_string()).unwrap();

        assert_eq!(files, expected_files());
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let response = format!(
            "Sure! Here is your project {{as requested}}:\n{}\nLet me know if you need {{anything}} else.",
            sample_files()
        );

        assert_eq!(parse_project_from_response(&response).unwrap(), expected_files());
    }

    #[test]
    fn parses_json_in_fenced_block() {
        let response = format!("```json\n{}\n```\nEnjoy!", serde_json::to_string_pretty(&sample_files()).unwrap());

        assert_eq!(parse_project_from_response(&response).unwrap(), expected_files());
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_object() {
        let response = format!(
            "prefix {}",
            json!({"files": [{"name": "a.js", "content": "const s = \"}}}\"; // \\\" {"}]})
        );

        let files = parse_project_from_response(&response).unwrap();

        assert_eq!(files[0].content, "const s = \"}}}\"; // \\\" {");
    }

    #[test]
    fn fenced_blocks_inside_file_content_survive() {
        let readme = "Run:\n```bash\nnpx serve .\n```\n";
        let response = json!({"files": [
            {"name": "index.html", "content": "<!DOCTYPE html><html><body>hi</body></html>"},
            {"name": "README.md", "content": readme}
        ]})
        .to_string();

        let files = parse_project_from_response(&response).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].content, readme);

        let wrapped = format!("Here you go:\n{}\nDone.", response);
        assert_eq!(parse_generated_files(&wrapped).unwrap()[1].content, readme);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = parse_project_from_response("Here: {\"files\": [{\"name\": \"index.html\", \"content\": }");

        assert!(matches!(result, Err(AppletflowError::ParseError(ParseTarget::Files, _))));
    }

    #[test]
    fn missing_files_array_is_a_parse_error() {
        let result = parse_project_from_response("{\"pages\": []}");

        match result {
            Err(AppletflowError::ParseError(ParseTarget::Files, message)) => {
                assert!(message.contains("missing files array"))
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_raw_array_and_drops_unnamed_entries() {
        let response = json!([
            {"name": "index.html", "content": 42},
            {"name": "empty.txt", "content": null},
            {"name": "missing.txt"},
            {"content": "orphan"}
        ])
        .to_string();

        let files = parse_project_from_response(&response).unwrap();

        assert_eq!(
            files,
            vec![ProjectFile::new("index.html", "42"), ProjectFile::new("empty.txt", "null")]
        );
    }

    #[test]
    fn generated_files_fall_back_to_single_html_document() {
        let response = "Here's the app:\n```html\n<!DOCTYPE html>\n<html><body>hi</body></html>\n```";

        let files = parse_generated_files(response).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "index.html");
        assert_eq!(files[0].content, "<!DOCTYPE html>\n<html><body>hi</body></html>");
    }

    #[test]
    fn generated_files_without_json_or_html_fail() {
        assert!(matches!(
            parse_generated_files("I could not build that."),
            Err(AppletflowError::ParseError(ParseTarget::Files, _))
        ));
    }

    #[test]
    fn html_tag_without_doctype_gets_one() {
        let html = parse_html_from_response("<html><body>x</body></html> trailing").unwrap();

        assert_eq!(html, "<!DOCTYPE html>\n<html><body>x</body></html>");
    }

    #[test]
    fn html_fragment_is_wrapped() {
        let html = parse_html_from_response("Here's your page:\n<h1>Hello</h1>").unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<body>\n<h1>Hello</h1>\n</body>"));
        assert!(!html.contains("Here's"));
    }

    #[test]
    fn empty_html_response_is_a_parse_error() {
        assert!(matches!(
            parse_html_from_response("  "),
            Err(AppletflowError::ParseError(ParseTarget::Html, _))
        ));
    }

    #[test]
    fn primary_document_prefers_index_then_html() {
        let files = vec![
            ProjectFile::new("style.css", ""),
            ProjectFile::new("about.html", ""),
            ProjectFile::new("index.html", ""),
        ];
        assert_eq!(primary_document(&files).unwrap().name, "index.html");
        assert_eq!(primary_document(&files[..2]).unwrap().name, "about.html");
        assert_eq!(primary_document(&files[..1]).unwrap().name, "style.css");
        assert!(primary_document(&[]).is_none());
    }

    #[test]
    fn guesses_content_types() {
        assert_eq!(content_type_for("INDEX.HTML"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("app.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type_for("logo.svg"), "image/svg+xml");
        assert_eq!(content_type_for("notes"), "text/plain; charset=utf-8");
    }
}
