//! Human-readable rendering of validation issues, one line per issue

use crate::schema::{
    ValidationIssue, HTTPS_URL_FORMAT, HTTP_URL_FORMAT, MAX_FILE_SIZE_KEYWORD,
    RELATIVE_PATH_FORMAT,
};
use serde_json::Value;

pub fn format_issue(issue: &ValidationIssue) -> String {
    let location = if issue.instance_path.is_empty() {
        "(root)"
    } else {
        issue.instance_path.as_str()
    };
    let value = display_instance(&issue.instance);

    let detail = match (issue.keyword.as_str(), issue.format.as_deref()) {
        (_, Some(RELATIVE_PATH_FORMAT)) => {
            format!("must be a relative path to an existing file, got {}", value)
        }
        (_, Some(HTTPS_URL_FORMAT)) => format!("must be an https:// URL, got {}", value),
        (_, Some(HTTP_URL_FORMAT)) => {
            format!("must be an http:// or https:// URL, got {}", value)
        }
        (MAX_FILE_SIZE_KEYWORD, _) => format!("{}, got {}", issue.message, value),
        ("anyOf", _) => format!(
            "must be an https:// URL or a relative path to an existing file within the size limit, got {}",
            value
        ),
        _ => issue.message.clone(),
    };

    format!("\"{}\" {}", location, detail)
}

pub fn format_issues(issues: &[ValidationIssue]) -> Vec<String> {
    issues.iter().map(format_issue).collect()
}

fn display_instance(instance: &Value) -> String {
    match instance {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}
