//! The chat panel's state: pending input, the transcript, and which
//! submissions are still waiting on the network.
//!
//! A submission moves through two steps. [`ChatPanel::submit`] runs
//! synchronously on the UI task: it packages and clears the pending input,
//! echoes the user entry, and hands back a payload for the caller to send.
//! [`ChatPanel::complete`] runs when that payload's outcome arrives and
//! appends the assistant entry. Outcomes are applied in arrival order.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::config::EndpointMode;
use crate::core::conversation::ConversationLog;
use crate::core::format::FAILURE_MESSAGE;
use crate::core::inference_service::InferenceOutcome;
use crate::core::message::ConversationEntry;
use crate::core::submission::{
    Attachment, AttachmentError, PendingSubmission, SubmissionPayload,
};
use crate::utils::logging::LoggingState;

pub struct ChatPanel {
    mode: EndpointMode,
    pending: PendingSubmission,
    log: ConversationLog,
    in_flight: BTreeSet<u64>,
    next_request_id: u64,
    transcript: LoggingState,
}

impl ChatPanel {
    pub fn new(mode: EndpointMode) -> Self {
        Self::with_transcript(mode, LoggingState::disabled())
    }

    pub fn with_transcript(mode: EndpointMode, transcript: LoggingState) -> Self {
        Self {
            mode,
            pending: PendingSubmission::default(),
            log: ConversationLog::new(),
            in_flight: BTreeSet::new(),
            next_request_id: 1,
            transcript,
        }
    }

    pub fn mode(&self) -> EndpointMode {
        self.mode
    }

    /// Replaces any previously selected file.
    pub fn select_file(&mut self, attachment: Attachment) -> &Attachment {
        debug!(file = %attachment.file_name, bytes = attachment.bytes.len(), "File selected");
        self.pending.attachment.insert(attachment)
    }

    /// Reads and selects the image at `path`. On error the previous
    /// selection is kept.
    pub fn select_file_at(&mut self, path: &Path) -> Result<&Attachment, AttachmentError> {
        let attachment = Attachment::from_path(path)?;
        Ok(self.select_file(attachment))
    }

    pub fn set_question(&mut self, text: impl Into<String>) {
        if !self.mode.accepts_question() {
            return;
        }
        self.pending.question = text.into();
    }

    pub fn question(&self) -> &str {
        &self.pending.question
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.pending.attachment.as_ref()
    }

    /// Packages the pending input and echoes it into the transcript.
    /// Returns `None`, leaving everything untouched, when there is nothing
    /// to send or the mode needs a file and none is selected.
    pub fn submit(&mut self) -> Option<SubmissionPayload> {
        if self.mode.requires_attachment() && self.pending.attachment.is_none() {
            debug!("Submit ignored: no file selected");
            return None;
        }
        if !self.pending.has_question() && self.pending.attachment.is_none() {
            debug!("Submit ignored: nothing to send");
            return None;
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let payload = SubmissionPayload::from_pending(request_id, self.pending.take());
        self.append(ConversationEntry::user(payload.display_text()));
        self.in_flight.insert(request_id);
        Some(payload)
    }

    /// Applies the outcome of a submission returned by [`ChatPanel::submit`].
    pub fn complete(&mut self, request_id: u64, outcome: InferenceOutcome) {
        if !self.in_flight.remove(&request_id) {
            warn!(request_id, "Outcome for unknown request ignored");
            return;
        }

        let text = match outcome {
            InferenceOutcome::Reply(text) => text,
            InferenceOutcome::Failed => FAILURE_MESSAGE.to_string(),
        };
        self.append(ConversationEntry::assistant(text));
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn transcript_status(&self) -> String {
        self.transcript.get_status_string()
    }

    fn append(&mut self, entry: ConversationEntry) {
        if let Err(err) = self.transcript.log_entry(&entry) {
            warn!(error = %err, "Failed to write transcript log");
        }
        debug!(role = entry.role().as_str(), "Appending conversation entry");
        self.log.push(entry);
    }
}
