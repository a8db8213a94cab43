use std::sync::Arc;

use crossterm::event::{Event, KeyCode, KeyEventKind};
use futures::{FutureExt, StreamExt};
use lockhist_host::{Host, HostError, Subscription};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::{
    client::ClientError,
    error::AppError,
    model::HistoryList,
    task::{Task, TaskManager},
};

#[derive(Debug)]
pub struct Envelope {
    pub messages: Vec<Message>,
    pub source: MessageSource,
}

impl Envelope {
    pub fn new(source: MessageSource, messages: Vec<Message>) -> Self {
        Self { messages, source }
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum MessageSource {
    Host,
    Task,
    User,
}

pub enum Message {
    HistoryChanged,
    HistoryFetched(u64, Result<HistoryList, ClientError>),
    Mount,
    Quit,
    Remount,
    Rerender,
    Resize(u16, u16),
    Scroll(ScrollDirection),
    Subscribed(u64, Subscription),
    SubscriptionFailed(u64, HostError),
    Unmount,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::HistoryChanged => write!(f, "HistoryChanged"),
            Message::HistoryFetched(sequence, Ok(list)) => {
                write!(f, "HistoryFetched({}, Ok(<{} entries>))", sequence, list.len())
            }
            Message::HistoryFetched(sequence, Err(error)) => {
                write!(f, "HistoryFetched({}, Err({:?}))", sequence, error)
            }
            Message::Mount => write!(f, "Mount"),
            Message::Quit => write!(f, "Quit"),
            Message::Remount => write!(f, "Remount"),
            Message::Rerender => write!(f, "Rerender"),
            Message::Resize(x, y) => write!(f, "Resize({}, {})", x, y),
            Message::Scroll(direction) => write!(f, "Scroll({:?})", direction),
            Message::Subscribed(generation, subscription) => {
                write!(f, "Subscribed({}, {:?})", generation, subscription)
            }
            Message::SubscriptionFailed(generation, error) => {
                write!(f, "SubscriptionFailed({}, {:?})", generation, error)
            }
            Message::Unmount => write!(f, "Unmount"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrollDirection {
    Down,
    Up,
}

pub struct Emitter {
    cancellation: CancellationToken,
    pub receiver: UnboundedReceiver<Envelope>,
    sender: UnboundedSender<Envelope>,
    tasks: TaskManager,
}

impl Emitter {
    pub fn start(host: Arc<dyn Host>) -> Self {
        let emitter = Self::headless(host);
        start_crossterm_listener(emitter.cancellation.child_token(), emitter.sender.clone());

        emitter
    }

    /// Emitter without terminal input, driven by host and tasks only.
    pub fn headless(host: Arc<dyn Host>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tasks = TaskManager::new(host, sender.clone());

        Self {
            cancellation: CancellationToken::new(),
            receiver,
            sender,
            tasks,
        }
    }

    pub fn emit(&self, source: MessageSource, messages: Vec<Message>) -> Result<(), AppError> {
        Ok(self.sender.send(Envelope::new(source, messages))?)
    }

    pub fn run(&mut self, task: Task) {
        self.tasks.run(task);
    }

    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.cancellation.cancel();
        self.tasks.finishing().await
    }
}

fn start_crossterm_listener(cancellation: CancellationToken, sender: UnboundedSender<Envelope>) {
    tokio::spawn(async move {
        let mut reader = crossterm::event::EventStream::new();

        loop {
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = cancellation.cancelled() => break,
                event = crossterm_event => match event {
                    Some(Ok(event)) => {
                        if let Some(envelope) = handle_crossterm_event(event) {
                            if sender.send(envelope).is_err() {
                                break;
                            }
                        }
                    }
                    Some(Err(error)) => {
                        tracing::error!("reading terminal event failed: {:?}", error);
                    }
                    None => break,
                }
            }
        }

        tracing::debug!("terminal listener stopped");
    });
}

fn handle_crossterm_event(event: Event) -> Option<Envelope> {
    let message = match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Message::Quit,
            KeyCode::Char('r') => Message::Remount,
            KeyCode::Char('j') | KeyCode::Down => Message::Scroll(ScrollDirection::Down),
            KeyCode::Char('k') | KeyCode::Up => Message::Scroll(ScrollDirection::Up),
            _ => return None,
        },
        Event::Resize(x, y) => Message::Resize(x, y),
        Event::FocusGained => Message::Rerender,
        Event::Key(_)
        | Event::FocusLost
        | Event::Mouse(_)
        | Event::Paste(_) => return None,
    };

    Some(Envelope::new(MessageSource::User, vec![message]))
}
