use async_trait::async_trait;
use serde_json::Value;

pub use error::HostError;
pub use subscription::Subscription;

mod error;
pub mod memory;
pub mod protocol;
mod subscription;
pub mod ws;

/// Callback invoked with the payload of every pushed event of a subscribed type.
pub type Listener = Box<dyn Fn(Value) + Send + Sync>;

/// Generic request/response channel into the backend.
#[async_trait]
pub trait CallDispatch: Send + Sync {
    async fn call(&self, request: Value) -> Result<Value, HostError>;
}

/// Push channel for named backend events.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn subscribe(
        &self,
        event_type: &str,
        listener: Listener,
    ) -> Result<Subscription, HostError>;
}

/// Everything a card consumes from the surrounding dashboard.
pub trait Host: CallDispatch + EventBus {}

impl<T: CallDispatch + EventBus> Host for T {}
