use crate::ui::state::{ChatView, Focus, StatusKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::TextArea;
use unicode_width::UnicodeWidthStr;

pub fn ui(f: &mut Frame, view: &mut ChatView) {
    let accepts_question = view.panel.mode().accepts_question();

    let mut constraints = vec![
        Constraint::Length(1), // title
        Constraint::Min(0),    // transcript
        Constraint::Length(1), // loading / status
        Constraint::Length(3), // file field
    ];
    if accepts_question {
        constraints.push(Constraint::Length(3));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    f.render_widget(
        Block::default().style(Style::default().bg(view.theme.background_color)),
        f.area(),
    );

    // Title with version, endpoint mode and logging status
    let sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown");
    let short_sha = sha.get(..7).unwrap_or(sha);
    let title = format!(
        "Image Analyzer v{} ({}) • Mode: {} • Logging: {}",
        env!("CARGO_PKG_VERSION"),
        short_sha,
        view.panel.mode().as_str(),
        view.panel.transcript_status()
    );
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(title, view.theme.title_style))),
        chunks[0],
    );

    view.set_viewport(chunks[1].width, chunks[1].height);
    let lines = view.visible_transcript();
    f.render_widget(Paragraph::new(lines), chunks[1]);

    f.render_widget(Paragraph::new(status_line(view)), chunks[2]);

    let file_title = match view.panel.attachment() {
        Some(attachment) => format!("Image: {}", attachment.file_name),
        None => "Image".to_string(),
    };
    render_field(
        f,
        view,
        chunks[3],
        &file_title,
        view.file_input(),
        view.focus() == Focus::File,
    );

    if accepts_question {
        render_field(
            f,
            view,
            chunks[4],
            "Question",
            view.question_input(),
            view.focus() == Focus::Question,
        );
    }
}

fn status_line(view: &ChatView) -> Line<'static> {
    if view.panel.is_loading() {
        let symbol = pulse_symbol(view.pulse_start.elapsed().as_millis());
        let text = match view.panel.in_flight() {
            1 => format!("Loading... {symbol}"),
            n => format!("Loading... {symbol} ({n} requests)"),
        };
        return Line::from(Span::styled(text, view.theme.loading_style));
    }

    match view.status() {
        Some(status) => {
            let style = match status.kind {
                StatusKind::Info => view.theme.status_info_style,
                StatusKind::Error => view.theme.status_error_style,
            };
            Line::from(Span::styled(status.text.clone(), style))
        }
        None => {
            let hint = if view.panel.mode().accepts_question() {
                "Enter selects a typed path or sends • Tab switches fields • Esc quits"
            } else {
                "Enter selects a typed path, Enter again sends • Esc quits"
            };
            Line::from(Span::styled(hint, view.theme.status_info_style))
        }
    }
}

/// Two pulses per second, stepping through three fill levels.
fn pulse_symbol(elapsed_ms: u128) -> &'static str {
    let elapsed = elapsed_ms as f32 / 1000.0;
    let pulse_phase = (elapsed * 2.0) % 2.0;
    let pulse_intensity = if pulse_phase < 1.0 {
        pulse_phase
    } else {
        2.0 - pulse_phase
    };

    if pulse_intensity < 0.33 {
        "○"
    } else if pulse_intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

fn render_field(
    f: &mut Frame,
    view: &ChatView,
    area: Rect,
    title: &str,
    textarea: &TextArea<'static>,
    focused: bool,
) {
    let theme = &view.theme;
    let border_style = if focused {
        theme.input_focused_border_style
    } else {
        theme.input_border_style
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title.to_string(), theme.input_title_style));

    let text = textarea.lines().concat();
    let inner_width = area.width.saturating_sub(2);

    // Cursor column in display cells, from the textarea's char index
    let (_, col) = textarea.cursor();
    let cursor_cells: String = text.chars().take(col).collect();
    let cursor_x = u16::try_from(cursor_cells.width()).unwrap_or(u16::MAX);
    let scroll_x = cursor_x.saturating_sub(inner_width.saturating_sub(1));

    let content = if text.is_empty() {
        Line::from(Span::styled(
            textarea.placeholder_text().to_string(),
            theme.placeholder_style,
        ))
    } else {
        Line::from(Span::styled(text, theme.input_text_style))
    };

    f.render_widget(
        Paragraph::new(content).block(block).scroll((0, scroll_x)),
        area,
    );

    if focused && inner_width > 0 {
        f.set_cursor_position((area.x + 1 + cursor_x - scroll_x, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EndpointMode;
    use crate::core::inference_service::InferenceOutcome;
    use crate::core::panel::ChatPanel;
    use crate::ui::theme::Theme;
    use crate::utils::test_utils::leaf_attachment;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;

    fn draw(view: &mut ChatView, width: u16, height: u16) -> Buffer {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).expect("terminal");
        terminal.draw(|f| ui(f, view)).expect("draw");
        terminal.backend().buffer().clone()
    }

    fn row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect::<String>()
    }

    fn screen(buffer: &Buffer) -> String {
        (0..buffer.area.height)
            .map(|y| row(buffer, y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn pulse_cycles_through_symbols() {
        assert_eq!(pulse_symbol(0), "○");
        assert_eq!(pulse_symbol(250), "◐");
        assert_eq!(pulse_symbol(450), "●");
    }

    #[test]
    fn dual_mode_hides_question_field() {
        let mut view = ChatView::new(ChatPanel::new(EndpointMode::Dual), Theme::dark());
        let buffer = draw(&mut view, 60, 12);
        let text = screen(&buffer);
        assert!(text.contains("Mode: dual"));
        assert!(text.contains("Image"));
        assert!(!text.contains("Question"));
    }

    #[test]
    fn single_mode_shows_both_fields() {
        let mut view = ChatView::new(ChatPanel::new(EndpointMode::Single), Theme::dark());
        let text = screen(&draw(&mut view, 60, 14));
        assert!(text.contains("Mode: single"));
        assert!(text.contains("Question"));
    }

    #[test]
    fn loading_indicator_shows_while_requests_are_pending() {
        let mut panel = ChatPanel::new(EndpointMode::Dual);
        panel.select_file(leaf_attachment());
        let mut view = ChatView::new(panel, Theme::dark());
        let payload = view.panel.submit().expect("submitted");

        let text = screen(&draw(&mut view, 60, 12));
        assert!(text.contains("Loading..."));

        view.panel
            .complete(payload.request_id, InferenceOutcome::Reply("{}".into()));
        let text = screen(&draw(&mut view, 60, 12));
        assert!(!text.contains("Loading..."));
    }

    #[test]
    fn user_bubbles_hug_the_right_edge() {
        let mut panel = ChatPanel::new(EndpointMode::Dual);
        panel.select_file(leaf_attachment());
        let mut view = ChatView::new(panel, Theme::dark());
        view.panel.submit().expect("submitted");

        let buffer = draw(&mut view, 40, 12);
        let transcript_row = row(&buffer, 1);
        assert!(
            transcript_row.ends_with(" leaf.png "),
            "row was {transcript_row:?}"
        );
        assert_eq!(buffer[(39, 1)].bg, view.theme.user_bubble_bg);
    }

    #[test]
    fn attached_file_name_appears_in_field_title() {
        let mut panel = ChatPanel::new(EndpointMode::Dual);
        panel.select_file(leaf_attachment());
        let mut view = ChatView::new(panel, Theme::dark());
        let text = screen(&draw(&mut view, 60, 12));
        assert!(text.contains("Image: leaf.png"));
    }
}
