use lockhist_host::{HostError, Subscription};
use tokio_util::sync::CancellationToken;

use crate::{
    action::Action,
    model::{Lifecycle, RefreshState, Widget, WidgetState},
    task::Task,
};

use super::history;

pub fn mount(widget: &mut Widget) -> Vec<Action> {
    if let Lifecycle::Mounted(generation) = widget.lifecycle {
        tracing::warn!("card is already mounted as generation {}", generation);
        return Vec::new();
    }

    widget.mounts += 1;
    let generation = widget.mounts;

    let token = CancellationToken::new();
    widget.lifecycle = Lifecycle::Mounted(generation);
    widget.mount_token = Some(token.clone());
    widget.refresh = RefreshState::Pending;

    tracing::debug!("mounting card as generation {}", generation);

    vec![
        history::issue_fetch(widget),
        Action::Task(Task::Subscribe(generation, token)),
    ]
}

pub fn unmount(widget: &mut Widget) -> Vec<Action> {
    if let Some(token) = widget.mount_token.take() {
        token.cancel();
    }

    if let Some(mut subscription) = widget.subscription.take() {
        subscription.unsubscribe();
    }

    if widget.is_mounted() {
        tracing::debug!("unmounting card");

        widget.lifecycle = Lifecycle::Unmounted;
        widget.refresh = RefreshState::Off;
        widget.scroll = 0;
        widget.state = WidgetState::Unloaded;
    }

    Vec::new()
}

pub fn subscribed(widget: &mut Widget, generation: u64, mut subscription: Subscription) -> Vec<Action> {
    if widget.lifecycle != Lifecycle::Mounted(generation) {
        tracing::debug!(
            "releasing subscription of generation {} for unmounted card",
            generation
        );

        subscription.unsubscribe();
        return vec![Action::SkipRender];
    }

    if let Some(mut previous) = widget.subscription.replace(subscription) {
        tracing::warn!("replacing active subscription {}", previous.id());
        previous.unsubscribe();
    }

    widget.refresh = RefreshState::Live;

    Vec::new()
}

pub fn subscription_failed(widget: &mut Widget, generation: u64, error: HostError) -> Vec<Action> {
    if widget.lifecycle != Lifecycle::Mounted(generation) {
        tracing::debug!(
            "ignoring subscription failure of generation {}: {:?}",
            generation,
            error
        );
        return vec![Action::SkipRender];
    }

    tracing::error!(
        "subscribing to history updates failed, refresh disabled until remount: {:?}",
        error
    );

    if let Some(mut subscription) = widget.subscription.take() {
        subscription.unsubscribe();
    }

    widget.refresh = RefreshState::Unavailable(error.to_string());

    Vec::new()
}
