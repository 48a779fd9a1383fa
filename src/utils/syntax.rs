use crate::ui::theme::Theme;
use ratatui::style::Color as TuiColor;
use ratatui::text::{Line, Span};
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};

// Simple FIFO cache (bounded) for highlighted replies, keyed by content hash

const CACHE_CAPACITY: usize = 64;

/// Dark syntect themes, in order of preference.
const DARK_THEME_NAMES: [&str; 3] = [
    "base16-ocean.dark",
    "base16-eighties.dark",
    "Solarized (dark)",
];

fn hash_text(text: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

struct SimpleCache {
    map: HashMap<u64, Vec<Line<'static>>>,
    order: VecDeque<u64>,
    cap: usize,
}

impl SimpleCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    fn get(&self, k: u64) -> Option<Vec<Line<'static>>> {
        self.map.get(&k).cloned()
    }

    fn put(&mut self, k: u64, v: Vec<Line<'static>>) {
        if !self.map.contains_key(&k) {
            self.order.push_back(k);
        }
        self.map.insert(k, v);
        while self.map.len() > self.cap {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
}

static SYNTAX_CACHE: Mutex<Option<SimpleCache>> = Mutex::new(None);

fn with_cache<R>(f: impl FnOnce(&mut SimpleCache) -> R) -> Option<R> {
    // A poisoned cache only costs a re-highlight
    let mut guard = SYNTAX_CACHE.lock().ok()?;
    let cache = guard.get_or_insert_with(|| SimpleCache::new(CACHE_CAPACITY));
    Some(f(cache))
}

fn parse_tui_color_from_syntect(c: syntect::highlighting::Color) -> TuiColor {
    TuiColor::Rgb(c.r, c.g, c.b)
}

/// Highlights an assistant reply as JSON using a fixed dark syntect theme.
/// Text that is not valid JSON still highlights token by token. Returns
/// `None` only if syntect has no usable theme.
pub fn highlight_json(text: &str, theme: &Theme) -> Option<Vec<Line<'static>>> {
    let key = hash_text(text);
    if let Some(lines) = with_cache(|cache| cache.get(key)).flatten() {
        return Some(lines);
    }

    // Initialize syntect lazily
    static SYNTAX_SET: OnceLock<syntect::parsing::SyntaxSet> = OnceLock::new();
    static THEME_SET: OnceLock<syntect::highlighting::ThemeSet> = OnceLock::new();
    let ps = SYNTAX_SET.get_or_init(syntect::parsing::SyntaxSet::load_defaults_newlines);
    let ts = THEME_SET.get_or_init(syntect::highlighting::ThemeSet::load_defaults);

    let syn_theme = DARK_THEME_NAMES
        .iter()
        .find_map(|name| ts.themes.get(*name))?;

    let syntax = ps
        .find_syntax_by_token("json")
        .unwrap_or_else(|| ps.find_syntax_plain_text());

    let mut h = syntect::easy::HighlightLines::new(syntax, syn_theme);
    let bg = theme.assistant_bubble_bg;

    let mut out: Vec<Line<'static>> = Vec::new();
    for line in syntect::util::LinesWithEndings::from(text) {
        let ranges = h.highlight_line(line, ps).ok()?;
        let mut spans: Vec<Span<'static>> = Vec::new();
        for (style, fragment) in ranges {
            // strip trailing newline from the fragment before rendering in a Line
            let fragment = fragment
                .strip_suffix('\n')
                .map(|f| f.strip_suffix('\r').unwrap_or(f))
                .unwrap_or(fragment);
            if fragment.is_empty() {
                continue;
            }
            let st = ratatui::style::Style::default()
                .fg(parse_tui_color_from_syntect(style.foreground))
                .bg(bg);
            spans.push(Span::styled(fragment.to_string(), st));
        }
        out.push(Line::from(spans));
    }

    with_cache(|cache| cache.put(key, out.clone()));
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn highlighting_preserves_text_line_by_line() {
        let theme = Theme::dark();
        let text = "{\n  \"a\": 1\n}";
        let lines = highlight_json(text, &theme).expect("dark theme available");
        assert_eq!(plain(&lines), vec!["{", "  \"a\": 1", "}"]);
    }

    #[test]
    fn spans_carry_assistant_background() {
        let theme = Theme::dark();
        let lines = highlight_json("{\"k\": true}", &theme).expect("highlight");
        for span in lines.iter().flat_map(|l| l.spans.iter()) {
            assert_eq!(span.style.bg, Some(theme.assistant_bubble_bg));
            assert!(matches!(span.style.fg, Some(TuiColor::Rgb(..))));
        }
    }

    #[test]
    fn plain_prose_still_renders() {
        let theme = Theme::dark();
        let lines = highlight_json("Failed to fetch responses.", &theme).expect("highlight");
        assert_eq!(plain(&lines), vec!["Failed to fetch responses."]);
    }

    #[test]
    fn cache_evicts_oldest_entries() {
        let mut cache = SimpleCache::new(2);
        cache.put(1, vec![Line::from("one")]);
        cache.put(2, vec![Line::from("two")]);
        cache.put(3, vec![Line::from("three")]);
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }
}
