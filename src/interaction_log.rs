//! Append-only CSV log of handled messages
//!
//! One row per interaction: timestamp, user id, username, question,
//! response. The file is opened per append; concurrent appenders interleave
//! at OS granularity, which is acceptable for single-line rows.

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One handled message. Identity fields are optional; messages from chats
/// without a sender still get logged.
#[derive(Debug, Clone)]
pub struct InteractionRecord<'a> {
    pub user_id: Option<i64>,
    pub username: Option<&'a str>,
    pub question: &'a str,
    pub response: &'a str,
}

pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one record. Rows never get rewritten or deleted.
    pub fn append(&self, record: &InteractionRecord) -> Result<(), LogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);

        let mut fields = vec![Utc::now().to_rfc3339()];
        if let Some(id) = record.user_id {
            fields.push(id.to_string());
        }
        if let Some(name) = record.username {
            fields.push(csv_escape(name));
        }
        fields.push(csv_escape(record.question));
        fields.push(csv_escape(record.response));

        writeln!(writer, "{}", fields.join(","))?;
        writer.flush()?;
        Ok(())
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_read_back() {
        let dir = TempDir::new().unwrap();
        let log = InteractionLog::new(dir.path().join("log.csv"));

        log.append(&InteractionRecord {
            user_id: Some(42),
            username: Some("jdevries"),
            question: "motorA 12",
            response: "Module: MotorA",
        })
        .unwrap();
        log.append(&InteractionRecord {
            user_id: Some(42),
            username: Some("jdevries"),
            question: "hoe reset ik",
            response: "Resetknop.",
        })
        .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("motorA 12"));
        assert!(lines[1].contains("hoe reset ik"));
    }

    #[test]
    fn test_optional_identity_fields_are_omitted() {
        let dir = TempDir::new().unwrap();
        let log = InteractionLog::new(dir.path().join("log.csv"));

        log.append(&InteractionRecord {
            user_id: None,
            username: None,
            question: "vraag",
            response: "antwoord",
        })
        .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let fields: Vec<&str> = content.trim_end().split(',').collect();
        // timestamp, question, response
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], "vraag");
        assert_eq!(fields[2], "antwoord");
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("zei \"stop\""), "\"zei \"\"stop\"\"\"");
        assert_eq!(csv_escape("twee\nregels"), "\"twee\nregels\"");
    }

    #[test]
    fn test_append_to_unwritable_path_errors() {
        let log = InteractionLog::new(PathBuf::from("/nonexistent-dir/log.csv"));
        let result = log.append(&InteractionRecord {
            user_id: None,
            username: None,
            question: "q",
            response: "r",
        });
        assert!(result.is_err());
    }
}
