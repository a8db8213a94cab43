use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    Frame,
};

use crate::{
    layout,
    model::{Icon, Widget, WidgetState},
    registry::Components,
};

pub const HEADER: &str = "Lock History";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CardView {
    Loading,
    Failed(String),
    Loaded {
        header: &'static str,
        name: String,
        rows: Vec<RowView>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RowView {
    pub key: u64,
    pub icon: Icon,
    pub primary: String,
    pub secondary: String,
}

pub fn derive(widget: &Widget) -> CardView {
    match &widget.state {
        WidgetState::Unloaded => CardView::Loading,
        WidgetState::Failed(reason) => CardView::Failed(reason.to_owned()),
        WidgetState::Loaded(list) => CardView::Loaded {
            header: HEADER,
            name: widget.config.name().to_owned(),
            rows: list
                .iter()
                .enumerate()
                .map(|(index, entry)| RowView {
                    key: row_key(index, entry),
                    icon: Icon::for_state(&entry.state),
                    primary: entry.name.to_owned(),
                    secondary: entry.date.to_owned(),
                })
                .collect(),
        },
    }
}

fn row_key(index: usize, entry: &impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    index.hash(&mut hasher);
    entry.hash(&mut hasher);
    hasher.finish()
}

pub fn view(card: &CardView, scroll: usize, components: &Components, frame: &mut Frame, rect: Rect) {
    match card {
        CardView::Loading => {
            let paragraph = Paragraph::new("Loading…")
                .alignment(Alignment::Center)
                .block(Block::bordered());

            frame.render_widget(paragraph, rect);
        }
        CardView::Failed(reason) => {
            let paragraph = Paragraph::new(vec![
                Line::styled("Loading history failed", Style::default().fg(Color::Red)),
                Line::styled(reason.to_owned(), components.item_body.secondary),
            ])
            .wrap(Wrap { trim: true })
            .block(Block::bordered().title(HEADER));

            frame.render_widget(paragraph, rect);
        }
        CardView::Loaded { header, name, rows } => {
            let mut block = Block::bordered().title(*header);
            if !name.is_empty() {
                block = block.title_top(Line::from(name.as_str()).right_aligned());
            }

            let visible = layout::visible_rows(rect);
            let offset = scroll.min(rows.len().saturating_sub(visible));

            let lines: Vec<_> = rows
                .iter()
                .skip(offset)
                .take(visible)
                .flat_map(|row| row_lines(row, components))
                .collect();

            frame.render_widget(Paragraph::new(lines).block(block), rect);
        }
    }
}

fn row_lines<'a>(row: &'a RowView, components: &Components) -> [Line<'a>; 2] {
    let glyph = components.icons.glyph(row.icon);

    [
        Line::from(vec![
            Span::raw(format!("{} ", glyph)),
            Span::styled(row.primary.as_str(), components.item_body.primary),
        ]),
        Line::from(vec![
            Span::raw(" ".repeat(glyph_width(glyph) + 1)),
            Span::styled(row.secondary.as_str(), components.item_body.secondary),
        ]),
    ]
}

fn glyph_width(glyph: &str) -> usize {
    Span::raw(glyph).width()
}
