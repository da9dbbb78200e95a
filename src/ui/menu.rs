use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    text::Line,
    widgets::{Paragraph, Widget, Wrap},
};

use crate::menu::{Menu, MenuMode, HELP_LINE, SEARCH_PROMPT};
use crate::ui::bold;
use crate::util::truncate_to_width;

const MARKER: &str = "▶ ";
const NO_MARKER: &str = "  ";

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let MenuMode::Stats(index) = self.mode() {
            let stats = self.stats_text(index);
            let lines: Vec<Line> = stats.lines().map(Line::from).collect();
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .render(area, buf);
            return;
        }

        let mut lines = vec![Line::styled(
            self.flash().unwrap_or_default().to_string(),
            bold().fg(Color::Yellow),
        )];
        if self.mode() == MenuMode::Search {
            lines.push(Line::styled(SEARCH_PROMPT, bold()));
            lines.push(Line::from(format!(
                "{}{}",
                self.direction().prefix(),
                self.query()
            )));
        } else {
            lines.push(Line::styled(HELP_LINE, bold()));
        }
        lines.push(Line::default());

        if self.items().is_empty() {
            lines.push(Line::from("No content available."));
        }
        let label_width = usize::from(self.width()).saturating_sub(NO_MARKER.len());
        let end = (self.y_offset() + self.list_rows()).min(self.items().len());
        for index in self.y_offset()..end {
            let label = self.item_label(index);
            let label = truncate_to_width(&label, label_width);
            lines.push(if index == self.selected() {
                Line::styled(format!("{MARKER}{label}"), bold().fg(Color::Yellow))
            } else {
                Line::from(format!("{NO_MARKER}{label}"))
            });
        }
        Paragraph::new(lines).render(area, buf);
    }
}
