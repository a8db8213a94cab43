use ratatui::{
    prelude::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::model::{RefreshState, Widget, WidgetState};

const KEY_HINTS: &str = "q quit  r reload  j/k scroll";

pub fn view(widget: &Widget, frame: &mut Frame, rect: Rect) {
    let status = get_status_content(widget);
    let hints = Line::from(Span::styled(KEY_HINTS, Style::default().fg(Color::Gray)));

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(status.width() as u16),
            Constraint::Length(hints.width() as u16),
        ])
        .split(rect);

    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Black)),
        rect,
    );

    frame.render_widget(Paragraph::new(status), layout[0]);
    frame.render_widget(Paragraph::new(hints), layout[1]);
}

fn get_status_content(widget: &Widget) -> Line<'static> {
    let (refresh, color) = match &widget.refresh {
        RefreshState::Off => ("refresh off".to_owned(), Color::Gray),
        RefreshState::Live => ("live".to_owned(), Color::Green),
        RefreshState::Pending => ("subscribing".to_owned(), Color::Yellow),
        RefreshState::Unavailable(reason) => {
            (format!("refresh unavailable: {}", reason), Color::Red)
        }
    };

    let mut content = vec![Span::styled(refresh, Style::default().fg(color))];
    if let WidgetState::Loaded(list) = &widget.state {
        content.push(Span::styled(
            format!(" {} entries", list.len()),
            Style::default().fg(Color::Gray),
        ));
    }

    Line::from(content)
}
