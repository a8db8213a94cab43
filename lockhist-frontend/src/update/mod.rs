use crate::{
    action::Action,
    event::{Envelope, Message},
    model::Model,
};

mod history;
mod lifecycle;
mod viewport;

#[tracing::instrument(skip(model))]
pub fn update(model: &mut Model, envelope: Envelope) -> Vec<Action> {
    envelope
        .messages
        .into_iter()
        .flat_map(|message| update_with_message(model, message))
        .collect()
}

fn update_with_message(model: &mut Model, message: Message) -> Vec<Action> {
    match message {
        Message::HistoryChanged => history::changed(&mut model.widget),
        Message::HistoryFetched(sequence, result) => {
            let actions = history::fetched(&mut model.widget, sequence, result);
            viewport::clamp(&mut model.widget, model.layout.visible_rows());

            actions
        }
        Message::Mount => lifecycle::mount(&mut model.widget),
        Message::Quit => {
            let mut actions = lifecycle::unmount(&mut model.widget);
            actions.push(Action::Quit);

            actions
        }
        Message::Remount => {
            let mut actions = lifecycle::unmount(&mut model.widget);
            actions.extend(lifecycle::mount(&mut model.widget));

            actions
        }
        Message::Rerender => Vec::new(),
        Message::Resize(_, _) => {
            viewport::clamp(&mut model.widget, model.layout.visible_rows());
            Vec::new()
        }
        Message::Scroll(direction) => {
            viewport::scroll(&mut model.widget, direction, model.layout.visible_rows())
        }
        Message::Subscribed(generation, subscription) => {
            lifecycle::subscribed(&mut model.widget, generation, subscription)
        }
        Message::SubscriptionFailed(generation, error) => {
            lifecycle::subscription_failed(&mut model.widget, generation, error)
        }
        Message::Unmount => lifecycle::unmount(&mut model.widget),
    }
}
