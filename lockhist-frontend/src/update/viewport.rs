use crate::{
    action::Action,
    event::ScrollDirection,
    model::{Widget, WidgetState},
};

pub fn scroll(widget: &mut Widget, direction: ScrollDirection, visible_rows: usize) -> Vec<Action> {
    let before = widget.scroll;
    widget.scroll = match direction {
        ScrollDirection::Down => widget.scroll.saturating_add(1),
        ScrollDirection::Up => widget.scroll.saturating_sub(1),
    };
    clamp(widget, visible_rows);

    if before == widget.scroll {
        vec![Action::SkipRender]
    } else {
        Vec::new()
    }
}

pub fn clamp(widget: &mut Widget, visible_rows: usize) {
    let rows = match &widget.state {
        WidgetState::Loaded(list) => list.len(),
        WidgetState::Unloaded | WidgetState::Failed(_) => 0,
    };

    widget.scroll = widget.scroll.min(rows.saturating_sub(visible_rows));
}
