use crate::core::message::{ConversationEntry, Role};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Optional plain-text copy of the transcript, appended as entries land.
pub struct LoggingState {
    file_path: Option<String>,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = &log_file {
            // Test if we can create/write to the file
            Self::test_file_access(path)?;
        }

        Ok(LoggingState {
            file_path: log_file,
        })
    }

    pub fn disabled() -> Self {
        LoggingState { file_path: None }
    }

    pub fn log_session_start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        self.log_message(&format!("## Session started {stamp}"))
    }

    pub fn log_entry(&self, entry: &ConversationEntry) -> Result<(), Box<dyn std::error::Error>> {
        match entry.role() {
            Role::User => self.log_message(&format!("You: {}", entry.text())),
            Role::Assistant => self.log_message(entry.text()),
        }
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref() else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        let mut writer = BufWriter::new(file);

        // Write each line of content, preserving the exact formatting
        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }

        // Add an empty line after each message for spacing (matching screen display)
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }

    pub fn get_status_string(&self) -> String {
        match &self.file_path {
            None => "disabled".to_string(),
            Some(path) => format!(
                "active ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
        }
    }

    fn test_file_access(path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn disabled_logger_writes_nothing() {
        let logging = LoggingState::disabled();
        logging
            .log_entry(&ConversationEntry::user("hi"))
            .expect("no-op");
        assert_eq!(logging.get_status_string(), "disabled");
    }

    #[test]
    fn entries_are_appended_with_spacing() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("transcript.log");
        let logging =
            LoggingState::new(Some(path.to_string_lossy().into_owned())).expect("logger");

        logging
            .log_entry(&ConversationEntry::user("leaf.png"))
            .expect("user");
        logging
            .log_entry(&ConversationEntry::assistant("{\n  \"a\": 1\n}"))
            .expect("assistant");

        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "You: leaf.png\n\n{\n  \"a\": 1\n}\n\n");
        assert_eq!(logging.get_status_string(), "active (transcript.log)");
    }

    #[test]
    fn session_header_is_prefixed() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("t.log");
        let logging =
            LoggingState::new(Some(path.to_string_lossy().into_owned())).expect("logger");
        logging.log_session_start().expect("header");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.starts_with("## Session started "));
    }

    #[test]
    fn unwritable_path_is_rejected_up_front() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("missing-dir").join("t.log");
        assert!(LoggingState::new(Some(path.to_string_lossy().into_owned())).is_err());
    }
}
