//! Pending user input and its packaged, outbound form.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::data::path_display;

/// An image picked by the user, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum AttachmentError {
    /// The path does not name a PNG or JPEG file.
    UnsupportedType { path: PathBuf },
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::UnsupportedType { path } => write!(
                f,
                "Only PNG and JPEG images can be attached: {}",
                path_display(path)
            ),
            AttachmentError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for AttachmentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AttachmentError::UnsupportedType { .. } => None,
            AttachmentError::Read { source, .. } => Some(source),
        }
    }
}

/// Mirrors the `image/png, image/jpeg` filter of the file picker.
pub fn accepted_image_mime(path: &Path) -> Option<&'static str> {
    let guess = mime_guess::from_path(path).first()?;
    if guess == mime_guess::mime::IMAGE_PNG {
        Some("image/png")
    } else if guess == mime_guess::mime::IMAGE_JPEG {
        Some("image/jpeg")
    } else {
        None
    }
}

impl Attachment {
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let mime_type =
            accepted_image_mime(path).ok_or_else(|| AttachmentError::UnsupportedType {
                path: path.to_path_buf(),
            })?;
        let bytes = fs::read(path).map_err(|source| AttachmentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }
}

/// Whatever the user has typed or picked since the last submit.
#[derive(Debug, Default, Clone)]
pub struct PendingSubmission {
    pub question: String,
    pub attachment: Option<Attachment>,
}

impl PendingSubmission {
    /// Moves the pending state out, leaving both fields empty.
    pub fn take(&mut self) -> PendingSubmission {
        std::mem::take(self)
    }

    pub fn has_question(&self) -> bool {
        !self.question.trim().is_empty()
    }
}

/// A packaged submission, ready to be turned into multipart requests.
#[derive(Debug, Clone)]
pub struct SubmissionPayload {
    pub request_id: u64,
    /// `None` when the typed question was blank.
    pub question: Option<String>,
    pub attachment: Option<Attachment>,
    display: String,
}

impl SubmissionPayload {
    pub fn from_pending(request_id: u64, pending: PendingSubmission) -> Self {
        let question = if pending.has_question() {
            Some(pending.question.clone())
        } else {
            None
        };
        let display = match &pending.attachment {
            Some(attachment) if pending.question.is_empty() => attachment.file_name.clone(),
            _ => pending.question,
        };
        Self {
            request_id,
            question,
            attachment: pending.attachment,
            display,
        }
    }

    /// Text echoed into the transcript for this submission: the question
    /// exactly as typed, or the file name when nothing was typed.
    pub fn display_text(&self) -> &str {
        &self.display
    }
}
