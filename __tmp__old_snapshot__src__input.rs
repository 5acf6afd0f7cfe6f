//! Task-set file parsing (spec.md section 6): one task per line,
//! comma-separated `O,C,D,T`, no header. Task identity is the zero-based
//! line index.

use crate::task::{Task, TaskSet};

use thiserror::Error;

use std::fs;
use std::path::Path;

/// Errors that can occur while loading a task-set file.
///
/// Per spec.md section 7, an input error is reported and the process
/// terminates without ever emitting a schedulability exit code.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not read {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("line {line}: expected 4 comma-separated integers (O,C,D,T), got {text:?}")]
    MalformedLine { line: usize, text: String },
    #[error("line {line}: field {field} must be positive, got {value}")]
    NonPositiveField { line: usize, field: &'static str, value: i64 },
    #[error("the task file is empty")]
    Empty,
}

fn parse_field(line: usize, field: &'static str, text: &str) -> Result<i64, InputError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| InputError::MalformedLine { line, text: text.to_string() })
}

fn parse_line(line: usize, task_id: usize, text: &str) -> Result<Task, InputError> {
    let fields: Vec<&str> = text.split(',').collect();
    let [o, c, d, t] = fields.as_slice() else {
        return Err(InputError::MalformedLine { line, text: text.to_string() });
    };

    let offset = parse_field(line, "O", o)?;
    let computation_time = parse_field(line, "C", c)?;
    let deadline = parse_field(line, "D", d)?;
    let period = parse_field(line, "T", t)?;

    if offset < 0 {
        return Err(InputError::NonPositiveField { line, field: "O", value: offset });
    }
    if computation_time <= 0 {
        return Err(InputError::NonPositiveField { line, field: "C", value: computation_time });
    }
    if deadline <= 0 {
        return Err(InputError::NonPositiveField { line, field: "D", value: deadline });
    }
    if period <= 0 {
        return Err(InputError::NonPositiveField { line, field: "T", value: period });
    }

    Ok(Task::new(task_id, offset as u64, computation_time as u64, deadline as u64, period as u64))
}

/// Loads a task set from `path`.
///
/// Each non-blank line is `O,C,D,T`; the zero-based line index (counting
/// only non-blank lines) becomes the task's `task_id` and display name
/// `Task_<id>`.
pub fn load(path: impl AsRef<Path>) -> Result<TaskSet, InputError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|source| InputError::Io { path: path.display().to_string(), source })?;

    let mut tasks = Vec::new();
    for (line_no, text) in contents.lines().enumerate() {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        tasks.push(parse_line(line_no + 1, tasks.len(), text)?);
    }

    if tasks.is_empty() {
        return Err(InputError::Empty);
    }

    Ok(TaskSet::new(tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parses_a_well_formed_file() {
        let f = write_temp("0,1,4,4\n0,2,6,6\n");
        let ts = load(f.path()).unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.tasks()[0].name(), "Task_0");
        assert_eq!(ts.tasks()[1].period, 6);
    }

    #[test]
    fn skips_trailing_blank_lines() {
        let f = write_temp("0,1,4,4\n\n");
        let ts = load(f.path()).unwrap();
        assert_eq!(ts.len(), 1);
    }

    #[test]
    fn rejects_a_non_positive_computation_time() {
        let f = write_temp("0,0,4,4\n");
        let err = load(f.path()).unwrap_err();
        assert!(matches!(err, InputError::NonPositiveField { field: "C", .. }));
    }

    #[test]
    fn rejects_a_malformed_line() {
        let f = write_temp("0,1,4\n");
        let err = load(f.path()).unwrap_err();
        assert!(matches!(err, InputError::MalformedLine { .. }));
    }

    #[test]
    fn rejects_a_missing_file() {
        let err = load("/no/such/path/rtsched-test.csv").unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }

    #[test]
    fn rejects_an_empty_file() {
        let f = write_temp("");
        let err = load(f.path()).unwrap_err();
        assert!(matches!(err, InputError::Empty));
    }
}


