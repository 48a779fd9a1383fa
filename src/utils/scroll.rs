use crate::core::conversation::ConversationLog;
use crate::core::message::{ConversationEntry, Role};
use crate::ui::theme::Theme;
use crate::utils::syntax::highlight_json;
use ratatui::layout::Alignment;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Bubble width as a share of the transcript width.
const BUBBLE_WIDTH_PERCENT: usize = 80;

/// Lays out the whole log as bubbles: user entries on the right, assistant
/// entries on the left with JSON highlighting. Lines come out pre-wrapped so
/// the line count equals the rendered height.
pub fn build_transcript_lines(
    log: &ConversationLog,
    theme: &Theme,
    width: u16,
) -> Vec<Line<'static>> {
    let bubble_width = (width as usize * BUBBLE_WIDTH_PERCENT / 100).max(1);
    let content_width = bubble_width.saturating_sub(2).max(1);

    let mut lines = Vec::new();
    for entry in log.iter() {
        match entry.role() {
            Role::User => lines.extend(user_bubble(entry, theme, content_width)),
            Role::Assistant => lines.extend(assistant_bubble(entry, theme, content_width)),
        }
        lines.push(Line::from(""));
    }
    lines
}

fn user_bubble(
    entry: &ConversationEntry,
    theme: &Theme,
    content_width: usize,
) -> Vec<Line<'static>> {
    let style = theme.user_text_style.bg(theme.user_bubble_bg);
    let rows: Vec<Vec<Span<'static>>> = wrap_words(entry.text(), content_width)
        .into_iter()
        .map(|row| vec![Span::styled(row, style)])
        .collect();
    pad_rows(rows, theme.user_bubble_bg)
        .into_iter()
        .map(|line| line.alignment(Alignment::Right))
        .collect()
}

fn assistant_bubble(
    entry: &ConversationEntry,
    theme: &Theme,
    content_width: usize,
) -> Vec<Line<'static>> {
    let source = highlight_json(entry.text(), theme).unwrap_or_else(|| {
        let style = theme.assistant_text_style.bg(theme.assistant_bubble_bg);
        entry
            .text()
            .split('\n')
            .map(|line| Line::from(Span::styled(line.to_string(), style)))
            .collect()
    });

    let mut rows = Vec::new();
    for line in source {
        rows.extend(wrap_spans(line.spans, content_width));
    }
    pad_rows(rows, theme.assistant_bubble_bg)
        .into_iter()
        .map(|line| line.alignment(Alignment::Left))
        .collect()
}

/// Gives every row of a bubble the same width, plus one column of padding
/// on each side, so the background reads as a block.
fn pad_rows(rows: Vec<Vec<Span<'static>>>, bg: Color) -> Vec<Line<'static>> {
    let rows = if rows.is_empty() {
        vec![Vec::new()]
    } else {
        rows
    };
    let fill = Style::default().bg(bg);
    let widest = rows.iter().map(|row| spans_width(row)).max().unwrap_or(0);

    rows.into_iter()
        .map(|row| {
            let gap = widest - spans_width(&row);
            let mut spans = Vec::with_capacity(row.len() + 3);
            spans.push(Span::styled(" ", fill));
            spans.extend(row);
            if gap > 0 {
                spans.push(Span::styled(" ".repeat(gap), fill));
            }
            spans.push(Span::styled(" ", fill));
            Line::from(spans)
        })
        .collect()
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.width()).sum()
}

/// Word wraps plain text. Words wider than `width` are broken by grapheme.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();

    for source_line in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0usize;

        for word in source_line.split_word_bounds() {
            let word_width = word.width();
            let is_space = word.chars().all(char::is_whitespace);

            if current_width + word_width <= width {
                current.push_str(word);
                current_width += word_width;
                continue;
            }
            if is_space {
                // Break at the space and drop it
                if current_width > 0 {
                    out.push(take_row(&mut current));
                    current_width = 0;
                }
                continue;
            }
            if current_width > 0 {
                out.push(take_row(&mut current));
                current_width = 0;
            }
            for grapheme in word.graphemes(true) {
                let g_width = grapheme.width();
                if current_width + g_width > width && current_width > 0 {
                    out.push(take_row(&mut current));
                    current_width = 0;
                }
                current.push_str(grapheme);
                current_width += g_width;
            }
        }
        out.push(take_row(&mut current));
    }
    out
}

fn take_row(current: &mut String) -> String {
    let row = std::mem::take(current);
    row.trim_end().to_string()
}

/// Hard wraps styled spans at `width` columns, keeping each fragment's
/// style. Indentation is kept, which matters for pretty-printed JSON.
pub fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Vec<Span<'static>>> {
    let width = width.max(1);
    let mut rows: Vec<Vec<Span<'static>>> = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut row_width = 0usize;

    for span in spans {
        let style = span.style;
        let mut piece = String::new();
        for grapheme in span.content.graphemes(true) {
            let g_width = grapheme.width();
            if row_width + g_width > width && row_width > 0 {
                if !piece.is_empty() {
                    row.push(Span::styled(std::mem::take(&mut piece), style));
                }
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            piece.push_str(grapheme);
            row_width += g_width;
        }
        if !piece.is_empty() {
            row.push(Span::styled(piece, style));
        }
    }
    rows.push(row);
    rows
}

pub fn max_offset(total_lines: usize, height: u16) -> u16 {
    let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
    total.saturating_sub(height)
}

/// Transcript scroll position. While following, the view glides to the
/// newest line a few rows per frame instead of jumping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    offset: u16,
    target: u16,
    follow: bool,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            target: 0,
            follow: true,
        }
    }
}

impl ScrollState {
    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    pub fn follow_newest(&mut self) {
        self.follow = true;
    }

    /// Manual scrolling moves immediately and stops following.
    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.target = self.offset.saturating_sub(lines);
        self.offset = self.target;
    }

    /// Reaching the bottom resumes following.
    pub fn scroll_down(&mut self, lines: u16, max: u16) {
        self.target = self.offset.saturating_add(lines).min(max);
        self.offset = self.target;
        if self.target >= max {
            self.follow = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_up(u16::MAX);
    }

    pub fn scroll_to_bottom(&mut self, max: u16) {
        self.target = max;
        self.offset = max;
        self.follow = true;
    }

    /// Advances one animation frame. Returns `true` while still moving.
    pub fn step(&mut self, max: u16) -> bool {
        if self.follow {
            self.target = max;
        }
        self.target = self.target.min(max);
        self.offset = self.offset.min(max);

        let distance = self.target.abs_diff(self.offset);
        if distance == 0 {
            return false;
        }
        let stride = ((distance + 2) / 3).max(1);
        if self.offset < self.target {
            self.offset += stride;
        } else {
            self.offset -= stride;
        }
        self.offset != self.target
    }
}
