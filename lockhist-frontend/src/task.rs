use std::sync::Arc;

use lockhist_host::{protocol::HISTORY_UPDATED_EVENT, Host, HostError, Listener};
use tokio::{sync::mpsc::UnboundedSender, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    client::HistoryClient,
    error::AppError,
    event::{Envelope, Message, MessageSource},
};

#[derive(Debug)]
pub enum Task {
    FetchHistory(u64),
    Subscribe(u64, CancellationToken),
}

pub struct TaskManager {
    host: Arc<dyn Host>,
    sender: UnboundedSender<Envelope>,
    tasks: JoinSet<()>,
}

impl TaskManager {
    pub fn new(host: Arc<dyn Host>, sender: UnboundedSender<Envelope>) -> Self {
        Self {
            host,
            sender,
            tasks: JoinSet::new(),
        }
    }

    pub fn run(&mut self, task: Task) {
        tracing::debug!("handling task: {:?}", task);

        self.reap();

        let sender = self.sender.clone();
        match task {
            Task::FetchHistory(sequence) => {
                let client = HistoryClient::new(self.host.clone());
                self.tasks.spawn(async move {
                    let result = client.fetch_history().await;
                    if let Err(error) = &result {
                        tracing::warn!("fetching history {} failed: {:?}", sequence, error);
                    }

                    send(&sender, Message::HistoryFetched(sequence, result));
                });
            }
            Task::Subscribe(generation, token) => {
                let host = self.host.clone();
                let listener = history_listener(sender.clone(), token.clone());
                self.tasks.spawn(async move {
                    let subscription = match host.subscribe(HISTORY_UPDATED_EVENT, listener).await
                    {
                        Ok(it) => it,
                        Err(error) => {
                            send(&sender, Message::SubscriptionFailed(generation, error));
                            return;
                        }
                    };

                    let ended = subscription.ended();
                    send(&sender, Message::Subscribed(generation, subscription));

                    tokio::select! {
                        _ = token.cancelled() => {}
                        _ = ended.cancelled() => {
                            tracing::warn!("subscription of generation {} ended by host", generation);
                            send(&sender, Message::SubscriptionFailed(generation, HostError::ChannelClosed));
                        }
                    }
                });
            }
        }
    }

    pub async fn finishing(&mut self) -> Result<(), AppError> {
        self.tasks.abort_all();

        let mut errors = Vec::new();
        while let Some(result) = self.tasks.join_next().await {
            if let Err(error) = result {
                if error.is_panic() {
                    tracing::error!("task failed: {:?}", error);
                    errors.push(AppError::TaskFailed(error.to_string()));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Aggregate(errors))
        }
    }

    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(error) = result {
                tracing::error!("task failed: {:?}", error);
            }
        }
    }
}

/// Listener that turns history updates into refetch messages until the token
/// of its mount gets cancelled.
fn history_listener(sender: UnboundedSender<Envelope>, token: CancellationToken) -> Listener {
    Box::new(move |_| {
        if token.is_cancelled() {
            tracing::trace!("ignoring history update for unmounted card");
            return;
        }

        let envelope = Envelope::new(MessageSource::Host, vec![Message::HistoryChanged]);
        if sender.send(envelope).is_err() {
            tracing::debug!("receiver gone, dropping history update");
        }
    })
}

fn send(sender: &UnboundedSender<Envelope>, message: Message) {
    if let Err(error) = sender.send(Envelope::new(MessageSource::Task, vec![message])) {
        tracing::debug!("receiver gone, dropping task result: {:?}", error.0.messages);
    }
}
