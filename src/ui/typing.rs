use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::session::{CharClass, SessionEngine};
use crate::ui::{bold, char_style};
use crate::util::format_duration;

const KEY_HELP: &str =
    "Esc save+menu | Ctrl+S finish | Ctrl+W trim | Ctrl+R reset | Ctrl+J/K/F/B scroll | Ctrl+C quit";

impl Widget for &SessionEngine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let Some(summary) = self.summary().filter(|_| self.is_finished()) {
            let results = summary.results_text();
            let mut lines: Vec<Line> = results.lines().map(Line::from).collect();
            lines.push(Line::default());
            lines.push(Line::styled("Press any key to exit.", bold()));
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .render(area, buf);
            return;
        }

        let mut lines = header_lines(self);
        let rows = self.page_rows();
        let top = self.top_line();
        let layout = self.layout();
        for line in top..(top + rows).min(layout.line_count()) {
            lines.push(text_line(self, layout.line(line)));
        }
        Paragraph::new(lines).render(area, buf);
    }
}

fn header_lines(engine: &SessionEngine<'_>) -> Vec<Line<'static>> {
    let status = if engine.is_started() {
        format!(
            "  WPM: {:.0}  Time: {}  Progress: {}/{}",
            engine.live_wpm(),
            format_duration(engine.elapsed().as_secs()),
            engine.char_pos(),
            engine.text().len()
        )
    } else {
        format!(
            "  Start typing to begin  Progress: {}/{}",
            engine.char_pos(),
            engine.text().len()
        )
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(engine.source_name().to_string(), bold()),
            Span::raw(status),
        ]),
        Line::styled(KEY_HELP, Style::default().fg(Color::DarkGray)),
        Line::styled(
            engine.flash().unwrap_or_default().to_string(),
            bold().fg(Color::Yellow),
        ),
    ];
    if engine.debug_overlay_visible() {
        lines.push(Line::styled(
            engine.debug_line(),
            Style::default().fg(Color::Cyan),
        ));
    }
    lines
}

/// One wrapped row; adjacent positions sharing a class share a span.
fn text_line(engine: &SessionEngine<'_>, range: std::ops::Range<usize>) -> Line<'static> {
    let text = engine.text().as_bytes();
    let mut spans: Vec<Span> = Vec::new();
    let mut run = String::new();
    let mut run_class: Option<CharClass> = None;

    for p in range {
        let class = engine.char_class(p);
        let shown = match (text[p], class) {
            (b' ', CharClass::Incorrect) => '·',
            (b'\n' | b'\t', _) => ' ',
            (b, _) => char::from(b),
        };
        if run_class != Some(class) {
            if let Some(prev) = run_class {
                spans.push(Span::styled(std::mem::take(&mut run), char_style(prev)));
            }
            run_class = Some(class);
        }
        run.push(shown);
    }
    if let Some(prev) = run_class {
        spans.push(Span::styled(run, char_style(prev)));
    }
    Line::from(spans)
}
