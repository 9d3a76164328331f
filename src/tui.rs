use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::DefaultTerminal;

use crate::error::Result;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const UNREAD_STYLE: Style = Style::new()
    .fg(Color::Rgb(80, 220, 100))
    .add_modifier(Modifier::BOLD);
pub const READ_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// A dot for unread reports, blank once read.
pub fn read_span(read: bool) -> Span<'static> {
    if read {
        Span::styled(" ", READ_STYLE)
    } else {
        Span::styled("\u{25cf}", UNREAD_STYLE)
    }
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Take over the terminal for `body`, restoring it afterwards even on panic.
pub fn with_terminal<F>(body: F) -> Result<()>
where
    F: FnOnce(&mut DefaultTerminal) -> Result<()>,
{
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = body(&mut terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_counts_lines() {
        let (wrapped, lines) = wrap_text("one two three four", 8);
        assert_eq!(wrapped, "one two\nthree\nfour");
        assert_eq!(lines, 3);
        assert_eq!(wrap_text("", 10).1, 1);
        assert_eq!(wrap_text("anything", 0), ("anything".to_string(), 1));
    }

    #[test]
    fn test_read_span() {
        assert_eq!(read_span(false).content, "\u{25cf}");
        assert_eq!(read_span(true).content, " ");
    }
}
