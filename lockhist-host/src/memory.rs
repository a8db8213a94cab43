use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::{
    protocol::{HISTORY_REQUEST_TYPE, HISTORY_UPDATED_EVENT, MAX_HISTORY},
    CallDispatch, EventBus, HostError, Listener, Subscription,
};

/// In process host keeping the lock history in memory.
///
/// Serves the demo mode and tests. Calls can be held back with [`MemoryHost::hold`]
/// to control the order in which responses arrive.
#[derive(Clone, Default)]
pub struct MemoryHost {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    calls: usize,
    ended: HashMap<u64, CancellationToken>,
    held: Option<VecDeque<oneshot::Sender<()>>>,
    history: VecDeque<Value>,
    listeners: HashMap<u64, (String, Arc<Listener>)>,
    next_id: u64,
    scripted: VecDeque<Scripted>,
}

enum Scripted {
    Fail { code: String, message: String },
    Respond(Value),
}

impl MemoryHost {
    pub fn new(history: Vec<Value>) -> Self {
        let host = Self::default();
        host.set_history(history);
        host
    }

    /// Amount of requests received so far, including held ones.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    pub fn set_history(&self, history: Vec<Value>) {
        self.lock().history = history.into_iter().take(MAX_HISTORY).collect();
    }

    /// Adds an entry as the most recent one and notifies listeners.
    pub fn record(&self, entry: Value) {
        {
            let mut inner = self.lock();
            inner.history.push_front(entry);
            inner.history.truncate(MAX_HISTORY);

            tracing::debug!("recorded entry, history has {} entries", inner.history.len());
        }

        self.emit(HISTORY_UPDATED_EVENT, json!({}));
    }

    pub fn history(&self) -> Vec<Value> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn emit(&self, event_type: &str, payload: Value) {
        let listeners: Vec<_> = self
            .lock()
            .listeners
            .values()
            .filter(|(kind, _)| kind == event_type)
            .map(|(_, listener)| listener.clone())
            .collect();

        tracing::trace!("emitting {} to {} listeners", event_type, listeners.len());

        for listener in listeners {
            listener(payload.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Drops every listener and ends their subscriptions like a lost connection.
    pub fn disconnect(&self) {
        let ended: Vec<_> = {
            let mut inner = self.lock();
            inner.listeners.clear();
            inner.ended.drain().map(|(_, token)| token).collect()
        };

        tracing::debug!("disconnecting {} subscriptions", ended.len());

        for token in ended {
            token.cancel();
        }
    }

    pub fn fail_next_call(&self, code: &str, message: &str) {
        self.lock().scripted.push_back(Scripted::Fail {
            code: code.to_owned(),
            message: message.to_owned(),
        });
    }

    /// Answers the next request with the given payload instead of the history.
    pub fn respond_next_with(&self, response: Value) {
        self.lock().scripted.push_back(Scripted::Respond(response));
    }

    /// Parks every following request until it gets released.
    pub fn hold(&self) {
        let mut inner = self.lock();
        if inner.held.is_none() {
            inner.held = Some(VecDeque::new());
        }
    }

    pub fn held_calls(&self) -> usize {
        self.lock().held.as_ref().map_or(0, |held| held.len())
    }

    /// Releases the held request with the given position in arrival order.
    pub fn release(&self, index: usize) -> bool {
        let sender = self
            .lock()
            .held
            .as_mut()
            .and_then(|held| held.remove(index));

        match sender {
            Some(sender) => sender.send(()).is_ok(),
            None => false,
        }
    }

    /// Stops holding and lets every parked request continue.
    pub fn release_all(&self) {
        let held = self.lock().held.take().unwrap_or_default();
        for sender in held {
            let _ = sender.send(());
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CallDispatch for MemoryHost {
    async fn call(&self, request: Value) -> Result<Value, HostError> {
        let parked = {
            let mut inner = self.lock();
            inner.calls += 1;

            inner.held.as_mut().map(|held| {
                let (sender, receiver) = oneshot::channel();
                held.push_back(sender);
                receiver
            })
        };

        if let Some(receiver) = parked {
            if receiver.await.is_err() {
                return Err(HostError::ChannelClosed);
            }
        }

        let mut inner = self.lock();
        if let Some(scripted) = inner.scripted.pop_front() {
            return match scripted {
                Scripted::Fail { code, message } => Err(HostError::Remote { code, message }),
                Scripted::Respond(response) => Ok(response),
            };
        }

        match request.get("type").and_then(Value::as_str) {
            Some(HISTORY_REQUEST_TYPE) => {
                let history: Vec<_> = inner.history.iter().cloned().collect();
                Ok(json!({ "history": history }))
            }
            Some(kind) => Err(HostError::UnknownCommand(kind.to_owned())),
            None => Err(HostError::Protocol(format!("request without type: {}", request))),
        }
    }
}

#[async_trait]
impl EventBus for MemoryHost {
    async fn subscribe(
        &self,
        event_type: &str,
        listener: Listener,
    ) -> Result<Subscription, HostError> {
        let id = {
            let mut inner = self.lock();
            inner.next_id += 1;

            let id = inner.next_id;
            inner
                .listeners
                .insert(id, (event_type.to_owned(), Arc::new(listener)));

            id
        };

        let inner = Arc::downgrade(&self.inner);
        let subscription = Subscription::new(id, move || {
            if let Some(inner) = inner.upgrade() {
                let mut guard = match inner.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                guard.listeners.remove(&id);
                guard.ended.remove(&id);
            }
        });

        self.lock().ended.insert(id, subscription.ended());

        Ok(subscription)
    }
}
