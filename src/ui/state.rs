//! Interactive state for the chat screen: the two input fields, focus,
//! transcript scroll, and the one-line status message.

use std::path::Path;
use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::style::Style;
use ratatui::text::Line;
use tracing::debug;
use tui_textarea::{Input as TAInput, TextArea};

use crate::core::config::EndpointMode;
use crate::core::panel::ChatPanel;
use crate::core::submission::SubmissionPayload;
use crate::ui::theme::Theme;
use crate::utils::scroll::{build_transcript_lines, max_offset, ScrollState};

const WHEEL_LINES: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    File,
    Question,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub kind: StatusKind,
}

struct LineCache {
    revision: u64,
    width: u16,
    lines: Vec<Line<'static>>,
}

pub struct ChatView {
    pub panel: ChatPanel,
    pub theme: Theme,
    file_input: TextArea<'static>,
    question_input: TextArea<'static>,
    focus: Focus,
    pub scroll: ScrollState,
    status: Option<Status>,
    viewport: (u16, u16),
    line_cache: Option<LineCache>,
    seen_revision: u64,
    pub pulse_start: Instant,
    pub exit_requested: bool,
}

impl ChatView {
    pub fn new(panel: ChatPanel, theme: Theme) -> Self {
        let file_input = new_field(&theme, file_placeholder(panel.mode()));
        let question_input = new_field(&theme, "Ask a question about the image");
        Self {
            panel,
            theme,
            file_input,
            question_input,
            focus: Focus::File,
            scroll: ScrollState::default(),
            status: None,
            viewport: (0, 0),
            line_cache: None,
            seen_revision: 0,
            pulse_start: Instant::now(),
            exit_requested: false,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn file_input(&self) -> &TextArea<'static> {
        &self.file_input
    }

    pub fn question_input(&self) -> &TextArea<'static> {
        &self.question_input
    }

    pub fn file_text(&self) -> String {
        field_text(&self.file_input)
    }

    pub fn question_text(&self) -> String {
        field_text(&self.question_input)
    }

    /// Handles one key press. Returns a payload when the key submitted.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<SubmissionPayload> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.exit_requested = true;
                None
            }
            KeyCode::Char('c') if ctrl => {
                self.exit_requested = true;
                None
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.toggle_focus();
                None
            }
            KeyCode::Enter => self.handle_enter(),
            KeyCode::Up => {
                self.scroll.scroll_up(1);
                None
            }
            KeyCode::Down => {
                let max = self.max_scroll();
                self.scroll.scroll_down(1, max);
                None
            }
            KeyCode::PageUp => {
                self.scroll.scroll_up(self.page_size());
                None
            }
            KeyCode::PageDown => {
                let max = self.max_scroll();
                self.scroll.scroll_down(self.page_size(), max);
                None
            }
            KeyCode::Home if ctrl => {
                self.scroll.scroll_to_top();
                None
            }
            KeyCode::End if ctrl => {
                let max = self.max_scroll();
                self.scroll.scroll_to_bottom(max);
                None
            }
            _ => {
                self.edit_focused(key);
                None
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll.scroll_up(WHEEL_LINES),
            MouseEventKind::ScrollDown => {
                let max = self.max_scroll();
                self.scroll.scroll_down(WHEEL_LINES, max);
            }
            _ => {}
        }
    }

    /// Both fields are single line, so pasted newlines become spaces.
    pub fn handle_paste(&mut self, text: &str) {
        let flattened = text.replace("\r\n", " ").replace(['\r', '\n'], " ");
        match self.focus {
            Focus::File => {
                self.file_input.insert_str(flattened);
            }
            Focus::Question => {
                self.question_input.insert_str(flattened);
                self.sync_question();
            }
        }
    }

    /// Records the transcript area so scrolling can be bounded between frames.
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport = (width, height);
    }

    /// Laid-out transcript for the current viewport width, rebuilt only when
    /// the log or the width changes.
    pub fn transcript_lines(&mut self) -> &[Line<'static>] {
        let width = self.viewport.0;
        let revision = self.panel.log().revision();
        let stale = self
            .line_cache
            .as_ref()
            .is_none_or(|cache| cache.revision != revision || cache.width != width);
        if stale {
            let lines = build_transcript_lines(self.panel.log(), &self.theme, width);
            self.line_cache = Some(LineCache {
                revision,
                width,
                lines,
            });
        }
        self.line_cache
            .as_ref()
            .map(|cache| cache.lines.as_slice())
            .unwrap_or_default()
    }

    pub fn max_scroll(&mut self) -> u16 {
        let height = self.viewport.1;
        let total = self.transcript_lines().len();
        max_offset(total, height)
    }

    /// Advances the scroll animation one frame and returns the rows to draw.
    /// A change in the log pulls the view back to the newest entry.
    pub fn visible_transcript(&mut self) -> Vec<Line<'static>> {
        let revision = self.panel.log().revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.scroll.follow_newest();
        }

        let max = self.max_scroll();
        self.scroll.step(max);

        let start = self.scroll.offset() as usize;
        let height = self.viewport.1 as usize;
        self.transcript_lines()
            .iter()
            .skip(start)
            .take(height)
            .cloned()
            .collect()
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            kind,
        });
    }

    fn page_size(&self) -> u16 {
        self.viewport.1.saturating_sub(1).max(1)
    }

    fn toggle_focus(&mut self) {
        if !self.panel.mode().accepts_question() {
            return;
        }
        self.focus = match self.focus {
            Focus::File => Focus::Question,
            Focus::Question => Focus::File,
        };
    }

    fn handle_enter(&mut self) -> Option<SubmissionPayload> {
        if self.focus == Focus::File {
            let typed = self.file_text();
            let path = typed.trim().trim_matches(['"', '\'']);
            if !path.is_empty() {
                self.select_typed_file(path.to_string());
                return None;
            }
        }
        self.submit()
    }

    fn select_typed_file(&mut self, path: String) {
        match self.panel.select_file_at(Path::new(&path)) {
            Ok(attachment) => {
                let name = attachment.file_name.clone();
                self.file_input = new_field(&self.theme, file_placeholder(self.panel.mode()));
                self.set_status(
                    StatusKind::Info,
                    format!("Selected {name}. Press Enter to send."),
                );
            }
            Err(err) => {
                debug!(path = %path, error = %err, "File selection rejected");
                self.set_status(StatusKind::Error, err.to_string());
            }
        }
    }

    /// A rejected submit changes nothing on screen.
    fn submit(&mut self) -> Option<SubmissionPayload> {
        let payload = self.panel.submit()?;
        self.question_input = new_field(&self.theme, "Ask a question about the image");
        self.status = None;
        self.scroll.follow_newest();
        Some(payload)
    }

    fn edit_focused(&mut self, key: KeyEvent) {
        match self.focus {
            Focus::File => {
                self.file_input.input(TAInput::from(key));
            }
            Focus::Question => {
                self.question_input.input(TAInput::from(key));
                self.sync_question();
            }
        }
    }

    fn sync_question(&mut self) {
        let text = field_text(&self.question_input);
        self.panel.set_question(text);
    }
}

fn file_placeholder(mode: EndpointMode) -> &'static str {
    match mode {
        EndpointMode::Dual => "Path to a PNG or JPEG image (required)",
        EndpointMode::Single => "Path to a PNG or JPEG image (optional)",
    }
}

fn new_field(theme: &Theme, placeholder: &str) -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_style(theme.input_text_style);
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text(placeholder);
    textarea.set_placeholder_style(theme.placeholder_style);
    textarea
}

fn field_text(textarea: &TextArea<'_>) -> String {
    textarea.lines().concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::FAILURE_MESSAGE;
    use crate::core::inference_service::InferenceOutcome;
    use crate::core::message::ConversationEntry;
    use crate::core::message::Role;
    use ratatui::crossterm::event::KeyModifiers;
    use std::fs;
    use tempfile::TempDir;

    fn view(mode: EndpointMode) -> ChatView {
        ChatView::new(ChatPanel::new(mode), Theme::dark())
    }

    fn press(view: &mut ChatView, code: KeyCode) -> Option<SubmissionPayload> {
        view.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(view: &mut ChatView, text: &str) {
        for ch in text.chars() {
            press(view, KeyCode::Char(ch));
        }
    }

    fn write_png(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, b"\x89PNG\r\n\x1a\n").expect("write png");
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn escape_and_ctrl_c_request_exit() {
        let mut v = view(EndpointMode::Dual);
        press(&mut v, KeyCode::Esc);
        assert!(v.exit_requested);

        let mut v = view(EndpointMode::Dual);
        v.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(v.exit_requested);
        assert_eq!(v.file_text(), "");
    }

    #[test]
    fn tab_only_moves_focus_when_questions_are_accepted() {
        let mut dual = view(EndpointMode::Dual);
        press(&mut dual, KeyCode::Tab);
        assert_eq!(dual.focus(), Focus::File);

        let mut single = view(EndpointMode::Single);
        press(&mut single, KeyCode::Tab);
        assert_eq!(single.focus(), Focus::Question);
        press(&mut single, KeyCode::Tab);
        assert_eq!(single.focus(), Focus::File);
    }

    #[test]
    fn typing_a_question_updates_pending_input() {
        let mut v = view(EndpointMode::Single);
        press(&mut v, KeyCode::Tab);
        type_str(&mut v, "why yellow?");
        assert_eq!(v.question_text(), "why yellow?");
        assert_eq!(v.panel.question(), "why yellow?");

        press(&mut v, KeyCode::Backspace);
        assert_eq!(v.panel.question(), "why yellow");
    }

    #[test]
    fn enter_on_question_submits_and_clears_field() {
        let mut v = view(EndpointMode::Single);
        press(&mut v, KeyCode::Tab);
        type_str(&mut v, "hello");

        let payload = press(&mut v, KeyCode::Enter).expect("submitted");
        assert_eq!(payload.question.as_deref(), Some("hello"));
        assert_eq!(v.question_text(), "");
        assert!(v.panel.is_loading());
        assert_eq!(v.panel.log().last().map(|e| e.role()), Some(Role::User));
    }

    #[test]
    fn enter_with_a_path_selects_then_enter_again_sends() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_png(&dir, "leaf.png");
        let mut v = view(EndpointMode::Dual);

        type_str(&mut v, &path);
        assert!(press(&mut v, KeyCode::Enter).is_none());
        assert_eq!(
            v.panel.attachment().map(|a| a.file_name.as_str()),
            Some("leaf.png")
        );
        assert_eq!(v.file_text(), "", "field clears once selected");
        assert_eq!(v.status().map(|s| s.kind), Some(StatusKind::Info));

        let payload = press(&mut v, KeyCode::Enter).expect("submitted");
        assert!(payload.attachment.is_some());
        assert!(v.panel.attachment().is_none());
        assert!(v.status().is_none());
    }

    #[test]
    fn quoted_pasted_paths_are_accepted() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_png(&dir, "stem.png");
        let mut v = view(EndpointMode::Dual);

        v.handle_paste(&format!("'{path}'\n"));
        press(&mut v, KeyCode::Enter);
        assert_eq!(
            v.panel.attachment().map(|a| a.file_name.as_str()),
            Some("stem.png")
        );
    }

    #[test]
    fn unsupported_file_reports_an_error() {
        let mut v = view(EndpointMode::Dual);
        type_str(&mut v, "notes.txt");
        assert!(press(&mut v, KeyCode::Enter).is_none());
        assert!(v.panel.attachment().is_none());
        assert_eq!(v.status().map(|s| s.kind), Some(StatusKind::Error));
        assert_eq!(v.file_text(), "notes.txt", "field keeps the typed path");
    }

    #[test]
    fn dual_mode_submit_without_file_is_silent() {
        let mut v = view(EndpointMode::Dual);
        assert!(press(&mut v, KeyCode::Enter).is_none());
        assert!(v.panel.log().is_empty());
        assert!(!v.panel.is_loading());
        assert!(v.status().is_none());
    }

    #[test]
    fn new_entries_pull_the_view_back_to_the_bottom() {
        let mut v = view(EndpointMode::Single);
        v.set_viewport(40, 4);
        for i in 0..6 {
            v.panel.set_question(format!("question {i}"));
            let payload = v.panel.submit().expect("submitted");
            v.panel
                .complete(payload.request_id, InferenceOutcome::Reply("ok".into()));
        }
        for _ in 0..20 {
            v.visible_transcript();
        }
        let bottom = v.max_scroll();
        assert_eq!(v.scroll.offset(), bottom);

        v.handle_mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(!v.scroll.is_following());
        assert_eq!(v.scroll.offset(), bottom - WHEEL_LINES);

        v.panel.set_question("one more");
        let payload = v.panel.submit().expect("submitted");
        v.panel.complete(payload.request_id, InferenceOutcome::Failed);
        for _ in 0..20 {
            v.visible_transcript();
        }
        assert_eq!(v.scroll.offset(), v.max_scroll());
        assert_eq!(
            v.panel.log().last().map(ConversationEntry::text),
            Some(FAILURE_MESSAGE)
        );
    }

    #[test]
    fn ctrl_home_and_end_jump_through_the_transcript() {
        let mut v = view(EndpointMode::Single);
        v.set_viewport(40, 2);
        for i in 0..4 {
            v.panel.set_question(format!("q{i}"));
            v.panel.submit();
        }
        let max = v.max_scroll();
        assert!(max > 0);

        v.handle_key(KeyEvent::new(KeyCode::Home, KeyModifiers::CONTROL));
        assert_eq!(v.scroll.offset(), 0);
        assert!(!v.scroll.is_following());

        v.handle_key(KeyEvent::new(KeyCode::End, KeyModifiers::CONTROL));
        assert_eq!(v.scroll.offset(), max);
        assert!(v.scroll.is_following());
    }

    #[test]
    fn visible_transcript_is_bounded_by_viewport() {
        let mut v = view(EndpointMode::Single);
        v.set_viewport(30, 3);
        v.panel.set_question("a question long enough to wrap across rows");
        v.panel.submit();
        assert!(v.visible_transcript().len() <= 3);
    }
}
