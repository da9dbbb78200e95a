pub mod menu;
pub mod typing;

use ratatui::{
    style::{Color, Modifier, Style},
    Frame,
};

use crate::menu::Menu;
use crate::session::{CharClass, SessionEngine};

pub fn draw_menu(f: &mut Frame, menu: &Menu<'_>) {
    f.render_widget(menu, f.area());
}

pub fn draw_session(f: &mut Frame, engine: &SessionEngine<'_>) {
    f.render_widget(engine, f.area());
}

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Style for one text position of the typing view.
pub fn char_style(class: CharClass) -> Style {
    match class {
        CharClass::Excessive | CharClass::Pending => Style::default().fg(Color::DarkGray),
        CharClass::Correct => Style::default().fg(Color::Green),
        CharClass::Incorrect => Style::default().fg(Color::Red),
        CharClass::Cursor => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::UNDERLINED),
    }
}
