use ratatui::Frame;

use crate::{error::AppError, model::Model, terminal::TerminalWrapper};

mod card;
mod statusline;

pub fn render_model(terminal: &mut TerminalWrapper, model: &Model) -> Result<(), AppError> {
    terminal.draw(|frame| view(model, frame))
}

fn view(model: &Model, frame: &mut Frame) {
    let layout = model.layout.clone();

    card::view(
        &card::derive(&model.widget),
        model.widget.scroll,
        &model.components,
        frame,
        layout.card,
    );

    statusline::view(&model.widget, frame, layout.statusline);
}
