use crate::{
    action::Action,
    client::ClientError,
    model::{HistoryList, Widget, WidgetState},
    task::Task,
};

pub fn issue_fetch(widget: &mut Widget) -> Action {
    widget.sequence += 1;

    tracing::debug!("issuing history fetch {}", widget.sequence);

    Action::Task(Task::FetchHistory(widget.sequence))
}

pub fn changed(widget: &mut Widget) -> Vec<Action> {
    if !widget.is_mounted() {
        tracing::trace!("ignoring history change for unmounted card");
        return vec![Action::SkipRender];
    }

    vec![issue_fetch(widget), Action::SkipRender]
}

pub fn fetched(
    widget: &mut Widget,
    sequence: u64,
    result: Result<HistoryList, ClientError>,
) -> Vec<Action> {
    if !widget.is_mounted() {
        tracing::debug!("dropping history fetch {} for unmounted card", sequence);
        return vec![Action::SkipRender];
    }

    if sequence != widget.sequence {
        tracing::debug!(
            "dropping stale history fetch {}, latest issued is {}",
            sequence,
            widget.sequence
        );
        return vec![Action::SkipRender];
    }

    widget.state = match result {
        Ok(list) => WidgetState::Loaded(list),
        Err(error) => {
            tracing::warn!("history fetch {} failed: {}", sequence, error);
            WidgetState::Failed(error.to_string())
        }
    };

    Vec::new()
}
