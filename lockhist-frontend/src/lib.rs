use std::sync::Arc;

use action::ActionResult;
use error::AppError;
use event::{Emitter, Envelope, Message, MessageSource};
use layout::AppLayout;
use lockhist_host::Host;
use model::Model;
use registry::{define_widget, ensure_dependencies, instantiate, Registry, CARD_NAME};
use settings::Settings;
use terminal::TerminalWrapper;
use update::update;
use view::render_model;

mod action;
pub mod client;
pub mod error;
mod event;
mod layout;
pub mod model;
pub mod registry;
pub mod settings;
mod task;
mod terminal;
mod update;
mod view;

pub async fn run(settings: Settings, host: Arc<dyn Host>) -> Result<(), AppError> {
    let registry = Registry::global();
    define_widget(registry);

    let components = ensure_dependencies(registry, settings.glyphs).await?;
    let widget = instantiate(registry, CARD_NAME, settings.card)?;
    let mut model = Model::new(widget, components);

    let mut terminal = TerminalWrapper::start()?;
    let mut emitter = Emitter::start(host);
    emitter.emit(MessageSource::User, vec![Message::Mount])?;

    tracing::debug!("starting with model state: {:?}", model);

    let mut result = run_loop(&mut model, &mut emitter, &mut terminal).await;

    if let Err(error) = emitter.shutdown().await {
        result.push(error);
    }

    if let Err(error) = terminal.shutdown() {
        result.push(error);
    }

    if result.is_empty() {
        Ok(())
    } else {
        Err(AppError::Aggregate(result))
    }
}

/// Processes messages until quit or a terminal failure. The card is unmounted on
/// every exit path.
async fn run_loop(
    model: &mut Model,
    emitter: &mut Emitter,
    terminal: &mut TerminalWrapper,
) -> Vec<AppError> {
    let mut errors = Vec::new();
    while let Some(envelope) = emitter.receiver.recv().await {
        tracing::debug!("received messages: {:?}", envelope.messages);

        let size = match terminal.size() {
            Ok(size) => size,
            Err(error) => {
                tracing::error!("reading terminal size failed: {:?}", error);
                errors.push(error);
                break;
            }
        };
        model.layout = AppLayout::new(size, model.widget.card_size());

        match step(model, emitter, envelope) {
            ActionResult::Quit => break,
            ActionResult::SkipRender => {}
            ActionResult::Normal => {
                if let Err(error) = render_model(terminal, model) {
                    tracing::error!("rendering failed: {:?}", error);
                    errors.push(error);
                    break;
                }
            }
        }
    }

    step(
        model,
        emitter,
        Envelope::new(MessageSource::User, vec![Message::Unmount]),
    );

    errors
}

fn step(model: &mut Model, emitter: &mut Emitter, envelope: Envelope) -> ActionResult {
    let actions = update(model, envelope);
    action::exec(emitter, actions)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use lockhist_host::memory::MemoryHost;
    use ratatui::layout::Rect;
    use serde_json::{json, Value};

    use crate::{
        action::ActionResult,
        error::AppError,
        event::{Emitter, Message, MessageSource},
        layout::AppLayout,
        model::{HistoryEntry, Model, RefreshState, Widget, WidgetState},
        registry::Components,
        settings::CardConfig,
        terminal::TerminalWrapper,
    };

    use super::{run_loop, step};

    fn entry(name: &str, state: &str) -> Value {
        json!({ "name": name, "date": "01/01/2024 10:00:00", "state": state })
    }

    fn names(model: &Model) -> Vec<String> {
        match &model.widget.state {
            WidgetState::Loaded(list) => list.iter().map(|e: &HistoryEntry| e.name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    fn setup(host: &MemoryHost) -> (Model, Emitter) {
        let mut model = Model::new(Widget::new(CardConfig::default()), Components::default());
        model.layout = AppLayout::new(Rect::new(0, 0, 40, 20), model.widget.card_size());

        let emitter = Emitter::headless(Arc::new(host.clone()));
        emitter
            .emit(MessageSource::User, vec![Message::Mount])
            .expect("emit mount");

        (model, emitter)
    }

    async fn process_until(
        model: &mut Model,
        emitter: &mut Emitter,
        done: impl Fn(&Model) -> bool,
    ) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done(model) {
                let envelope = emitter.receiver.recv().await.expect("envelope");
                assert_ne!(ActionResult::Quit, step(model, emitter, envelope));
            }
        })
        .await
        .expect("condition reached in time");
    }

    async fn held_calls(host: &MemoryHost, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while host.held_calls() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("calls held in time");
    }

    #[tokio::test]
    async fn mount_loads_history_and_refetches_on_update() {
        let host = MemoryHost::new(vec![entry("Front Door", "Home")]);
        let (mut model, mut emitter) = setup(&host);

        process_until(&mut model, &mut emitter, |model| {
            model.widget.refresh == RefreshState::Live
                && matches!(model.widget.state, WidgetState::Loaded(_))
        })
        .await;
        assert_eq!(vec!["Front Door"], names(&model));
        assert_eq!(1, host.calls());

        host.record(entry("Back Door", "Away"));
        process_until(&mut model, &mut emitter, |model| names(model).len() == 2).await;

        assert_eq!(vec!["Back Door", "Front Door"], names(&model));
        assert_eq!(2, host.calls());

        emitter.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn latest_issued_fetch_wins_over_late_response() {
        let host = MemoryHost::new(Vec::new());
        host.hold();
        let (mut model, mut emitter) = setup(&host);

        process_until(&mut model, &mut emitter, |model| model.widget.is_mounted()).await;
        emitter
            .emit(MessageSource::Host, vec![Message::HistoryChanged])
            .expect("emit change");
        process_until(&mut model, &mut emitter, |model| model.widget.sequence == 2).await;
        held_calls(&host, 2).await;

        host.set_history(vec![entry("Latest", "Home")]);
        assert!(host.release(1));
        process_until(&mut model, &mut emitter, |model| !names(model).is_empty()).await;

        host.set_history(vec![entry("Outdated", "Away")]);
        assert!(host.release(0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        while let Ok(envelope) = emitter.receiver.try_recv() {
            step(&mut model, &mut emitter, envelope);
        }

        assert_eq!(vec!["Latest"], names(&model));

        emitter.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn unmount_stops_refetching() {
        let host = MemoryHost::new(vec![entry("Front Door", "Home")]);
        let (mut model, mut emitter) = setup(&host);

        process_until(&mut model, &mut emitter, |model| {
            model.widget.refresh == RefreshState::Live
                && matches!(model.widget.state, WidgetState::Loaded(_))
        })
        .await;
        assert_eq!(1, host.listener_count());

        emitter
            .emit(MessageSource::User, vec![Message::Unmount])
            .expect("emit unmount");
        process_until(&mut model, &mut emitter, |model| !model.widget.is_mounted()).await;

        host.record(entry("Back Door", "Away"));

        assert_eq!(0, host.listener_count());
        assert!(emitter.receiver.try_recv().is_err());
        assert_eq!(1, host.calls());
        assert_eq!(WidgetState::Unloaded, model.widget.state);

        emitter.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn failed_fetch_is_rendered_as_failure() {
        let host = MemoryHost::new(vec![entry("Front Door", "Home")]);
        host.fail_next_call("not_found", "Lock history is not set up");
        let (mut model, mut emitter) = setup(&host);

        process_until(&mut model, &mut emitter, |model| {
            matches!(model.widget.state, WidgetState::Failed(_))
        })
        .await;

        match &model.widget.state {
            WidgetState::Failed(reason) => assert!(reason.contains("Lock history is not set up")),
            other => panic!("unexpected state: {:?}", other),
        }

        emitter.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn lost_connection_marks_refresh_unavailable() {
        let host = MemoryHost::new(vec![entry("Front Door", "Home")]);
        let (mut model, mut emitter) = setup(&host);

        process_until(&mut model, &mut emitter, |model| {
            model.widget.refresh == RefreshState::Live
                && matches!(model.widget.state, WidgetState::Loaded(_))
        })
        .await;

        host.disconnect();
        process_until(&mut model, &mut emitter, |model| {
            matches!(model.widget.refresh, RefreshState::Unavailable(_))
        })
        .await;

        assert!(model.widget.subscription.is_none());
        assert_eq!(vec!["Front Door"], names(&model));

        emitter.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn terminal_failure_still_unmounts() {
        let host = MemoryHost::new(vec![entry("Front Door", "Home")]);
        let (mut model, mut emitter) = setup(&host);

        process_until(&mut model, &mut emitter, |model| {
            model.widget.refresh == RefreshState::Live
        })
        .await;
        assert_eq!(1, host.listener_count());

        emitter
            .emit(MessageSource::User, vec![Message::Rerender])
            .expect("emit rerender");
        let mut terminal = TerminalWrapper::default();
        let errors = run_loop(&mut model, &mut emitter, &mut terminal).await;

        assert!(matches!(errors.as_slice(), [AppError::TerminalNotInitialized]));
        assert!(!model.widget.is_mounted());
        assert_eq!(0, host.listener_count());

        emitter.shutdown().await.expect("shutdown");
    }
}
