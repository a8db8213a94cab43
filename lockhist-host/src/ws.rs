use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot},
    time,
};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as Frame, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{CallDispatch, EventBus, HostError, Listener, Subscription};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Pending = oneshot::Sender<Result<Value, HostError>>;

/// Host connection speaking the Home Assistant websocket api.
pub struct WsHost {
    cancellation: CancellationToken,
    next_id: Arc<AtomicU64>,
    outgoing: mpsc::UnboundedSender<String>,
    request_timeout: Option<Duration>,
    shared: Arc<Mutex<Shared>>,
}

#[derive(Default)]
struct Shared {
    closed: bool,
    ended: HashMap<u64, CancellationToken>,
    listeners: HashMap<u64, Arc<Listener>>,
    pending: HashMap<u64, Pending>,
}

impl WsHost {
    pub async fn connect(
        url: &str,
        token: &str,
        request_timeout: Option<Duration>,
    ) -> Result<Self, HostError> {
        let url = Url::parse(url)?;

        tracing::info!("connecting to {}", url);

        let (mut socket, _) = connect_async(url.as_str()).await?;
        authenticate(&mut socket, token).await?;

        tracing::info!("authenticated against {}", url);

        let (mut sink, mut stream) = socket.split();
        let (outgoing, mut outgoing_receiver) = mpsc::unbounded_channel::<String>();
        let shared = Arc::new(Mutex::new(Shared::default()));
        let cancellation = CancellationToken::new();

        let writer_cancellation = cancellation.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_cancellation.cancelled() => break,
                    payload = outgoing_receiver.recv() => {
                        let payload = match payload {
                            Some(it) => it,
                            None => break,
                        };

                        tracing::trace!("sending frame: {}", payload);

                        if let Err(error) = sink.send(Frame::text(payload)).await {
                            tracing::error!("sending frame failed: {:?}", error);
                            break;
                        }
                    }
                }
            }

            let _ = sink.close().await;
        });

        let reader_shared = shared.clone();
        let reader_cancellation = cancellation.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_cancellation.cancelled() => break,
                    frame = stream.next() => match frame {
                        Some(Ok(Frame::Text(text))) => match serde_json::from_str::<Value>(&text) {
                            Ok(value) => dispatch(&reader_shared, value),
                            Err(error) => tracing::warn!("invalid frame received: {:?}", error),
                        },
                        Some(Ok(Frame::Close(reason))) => {
                            tracing::info!("connection closed by host: {:?}", reason);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(error)) => {
                            tracing::error!("receiving frame failed: {:?}", error);
                            break;
                        }
                        None => break,
                    }
                }
            }

            close(&reader_shared);
        });

        Ok(Self {
            cancellation,
            next_id: Arc::new(AtomicU64::new(1)),
            outgoing,
            request_timeout,
            shared,
        })
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn send(
        &self,
        id: u64,
        mut request: Value,
    ) -> Result<oneshot::Receiver<Result<Value, HostError>>, HostError> {
        if !request.is_object() {
            return Err(HostError::Protocol(format!("request is no object: {}", request)));
        }
        request["id"] = json!(id);

        let (sender, receiver) = oneshot::channel();
        {
            let mut shared = lock(&self.shared);
            if shared.closed {
                return Err(HostError::ChannelClosed);
            }
            shared.pending.insert(id, sender);
        }

        if self.outgoing.send(request.to_string()).is_err() {
            lock(&self.shared).pending.remove(&id);
            return Err(HostError::ChannelClosed);
        }

        Ok(receiver)
    }

    async fn wait(
        &self,
        id: u64,
        receiver: oneshot::Receiver<Result<Value, HostError>>,
    ) -> Result<Value, HostError> {
        let result = match self.request_timeout {
            Some(timeout) => match time::timeout(timeout, receiver).await {
                Ok(result) => result,
                Err(_) => {
                    lock(&self.shared).pending.remove(&id);
                    return Err(HostError::Timeout);
                }
            },
            None => receiver.await,
        };

        match result {
            Ok(result) => result,
            Err(_) => Err(HostError::ChannelClosed),
        }
    }
}

impl Drop for WsHost {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

#[async_trait]
impl CallDispatch for WsHost {
    async fn call(&self, request: Value) -> Result<Value, HostError> {
        let id = self.next_id();
        let receiver = self.send(id, request)?;

        self.wait(id, receiver).await
    }
}

#[async_trait]
impl EventBus for WsHost {
    async fn subscribe(
        &self,
        event_type: &str,
        listener: Listener,
    ) -> Result<Subscription, HostError> {
        // events carry the id of the subscribing request, so the listener has to be
        // known before the request goes out
        let id = self.next_id();
        lock(&self.shared).listeners.insert(id, Arc::new(listener));

        let request = json!({ "type": "subscribe_events", "event_type": event_type });
        let result = match self.send(id, request) {
            Ok(receiver) => self.wait(id, receiver).await,
            Err(error) => Err(error),
        };

        if let Err(error) = result {
            lock(&self.shared).listeners.remove(&id);
            return Err(error);
        }

        tracing::debug!("subscribed to {} with id {}", event_type, id);

        let shared = Arc::downgrade(&self.shared);
        let next_id = self.next_id.clone();
        let outgoing = self.outgoing.clone();
        let subscription = Subscription::new(id, move || {
            if let Some(shared) = shared.upgrade() {
                let mut shared = lock(&shared);
                shared.listeners.remove(&id);
                shared.ended.remove(&id);
            }

            let request = json!({
                "id": next_id.fetch_add(1, Ordering::SeqCst),
                "type": "unsubscribe_events",
                "subscription": id,
            });

            if outgoing.send(request.to_string()).is_err() {
                tracing::debug!("connection gone, skipping unsubscribe of {}", id);
            }
        });

        {
            let mut shared = lock(&self.shared);
            if shared.closed {
                subscription.ended().cancel();
            } else {
                shared.ended.insert(id, subscription.ended());
            }
        }

        Ok(subscription)
    }
}

async fn authenticate(socket: &mut Socket, token: &str) -> Result<(), HostError> {
    let greeting = next_message(socket).await?;
    if message_type(&greeting) != Some("auth_required") {
        return Err(HostError::Protocol(format!("expected auth_required, got {}", greeting)));
    }

    let auth = json!({ "type": "auth", "access_token": token });
    socket.send(Frame::text(auth.to_string())).await?;

    let response = next_message(socket).await?;
    match message_type(&response) {
        Some("auth_ok") => Ok(()),
        Some("auth_invalid") => Err(HostError::Authentication(
            response
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("invalid access token")
                .to_owned(),
        )),
        _ => Err(HostError::Protocol(format!("unexpected auth response {}", response))),
    }
}

async fn next_message(socket: &mut Socket) -> Result<Value, HostError> {
    while let Some(frame) = socket.next().await {
        match frame? {
            Frame::Text(text) => return Ok(serde_json::from_str(&text)?),
            Frame::Close(_) => break,
            _ => {}
        }
    }

    Err(HostError::ChannelClosed)
}

fn message_type(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn dispatch(shared: &Mutex<Shared>, value: Value) {
    let id = match value.get("id").and_then(Value::as_u64) {
        Some(id) => id,
        None => {
            tracing::trace!("ignoring frame without id: {}", value);
            return;
        }
    };

    match message_type(&value) {
        Some("result") => {
            let pending = lock(shared).pending.remove(&id);
            let sender = match pending {
                Some(it) => it,
                None => {
                    tracing::trace!("no pending request for result {}", id);
                    return;
                }
            };

            let _ = sender.send(to_result(value));
        }
        Some("event") => {
            let listener = lock(shared).listeners.get(&id).cloned();
            match listener {
                Some(listener) => {
                    let payload = value.get("event").cloned().unwrap_or(Value::Null);
                    listener(payload);
                }
                None => tracing::trace!("no listener for subscription {}", id),
            }
        }
        kind => tracing::trace!("ignoring frame of type {:?}", kind),
    }
}

fn to_result(value: Value) -> Result<Value, HostError> {
    if value.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(value.get("result").cloned().unwrap_or(Value::Null));
    }

    let error = value.get("error");
    let field = |name: &str| {
        error
            .and_then(|error| error.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    match field("code").as_str() {
        "unknown_command" => Err(HostError::UnknownCommand(field("message"))),
        code => Err(HostError::Remote {
            code: code.to_owned(),
            message: field("message"),
        }),
    }
}

fn close(shared: &Mutex<Shared>) {
    let (pending, ended): (Vec<_>, Vec<_>) = {
        let mut shared = lock(shared);
        shared.closed = true;
        shared.listeners.clear();
        (
            shared.pending.drain().map(|(_, sender)| sender).collect(),
            shared.ended.drain().map(|(_, token)| token).collect(),
        )
    };

    tracing::info!(
        "connection closed, failing {} pending requests and ending {} subscriptions",
        pending.len(),
        ended.len()
    );

    for sender in pending {
        let _ = sender.send(Err(HostError::ChannelClosed));
    }

    for token in ended {
        token.cancel();
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    match shared.lock() {
        Ok(shared) => shared,
        Err(poisoned) => poisoned.into_inner(),
    }
}
