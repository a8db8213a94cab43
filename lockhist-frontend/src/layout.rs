use ratatui::prelude::{Constraint, Direction, Layout, Rect};

/// Terminal lines granted per unit of card size.
const LINES_PER_CARD_UNIT: u16 = 4;

#[derive(Clone, Debug, Default)]
pub struct AppLayout {
    pub card: Rect,
    pub statusline: Rect,
}

impl AppLayout {
    pub fn new(rect: Rect, card_size: u16) -> Self {
        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(card_size * LINES_PER_CARD_UNIT),
                Constraint::Length(1),
            ])
            .split(rect);

        Self {
            card: main[0],
            statusline: main[1],
        }
    }

    /// Amount of two line history rows fitting into the bordered card.
    pub fn visible_rows(&self) -> usize {
        visible_rows(self.card)
    }
}

pub fn visible_rows(card: Rect) -> usize {
    usize::from(card.height.saturating_sub(2) / 2)
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Rect;

    use super::AppLayout;

    #[test]
    fn statusline_takes_last_line() {
        let layout = AppLayout::new(Rect::new(0, 0, 40, 20), 3);

        assert_eq!(Rect::new(0, 19, 40, 1), layout.statusline);
        assert_eq!(Rect::new(0, 0, 40, 19), layout.card);
    }

    #[test]
    fn visible_rows_excludes_borders() {
        let layout = AppLayout::new(Rect::new(0, 0, 40, 12), 3);

        assert_eq!(4, layout.visible_rows());
    }
}
