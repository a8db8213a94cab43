use lockhist_host::Subscription;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{layout::AppLayout, registry::Components, settings::CardConfig};

/// Relative height the card asks the dashboard for.
pub const CARD_SIZE: u16 = 3;

/// One lock state change as reported by the backend.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
pub struct HistoryEntry {
    pub name: String,
    pub date: String,
    pub state: String,
}

/// Entries in backend order, most recent first.
pub type HistoryList = Vec<HistoryEntry>;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum WidgetState {
    #[default]
    Unloaded,
    Loaded(HistoryList),
    Failed(String),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Lifecycle {
    #[default]
    Created,
    Mounted(u64),
    Unmounted,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum RefreshState {
    #[default]
    Off,
    Live,
    Pending,
    Unavailable(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Icon {
    Home,
    Lock,
}

impl Icon {
    pub fn for_state(state: &str) -> Self {
        if state == "Home" {
            Icon::Home
        } else {
            Icon::Lock
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Icon::Home => "mdi:home",
            Icon::Lock => "mdi:lock",
        }
    }
}

#[derive(Debug, Default)]
pub struct Widget {
    pub config: CardConfig,
    pub lifecycle: Lifecycle,
    pub mount_token: Option<CancellationToken>,
    pub mounts: u64,
    pub refresh: RefreshState,
    pub scroll: usize,
    pub sequence: u64,
    pub state: WidgetState,
    pub subscription: Option<Subscription>,
}

impl Widget {
    pub fn new(config: CardConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Replaces the card options with the given dashboard configuration.
    pub fn set_config(&mut self, config: Value) -> Result<(), serde_json::Error> {
        self.config = CardConfig::from_value(config)?;
        Ok(())
    }

    pub fn card_size(&self) -> u16 {
        CARD_SIZE
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Mounted(_))
    }
}

#[derive(Debug)]
pub struct Model {
    pub components: Components,
    pub layout: AppLayout,
    pub widget: Widget,
}

impl Model {
    pub fn new(widget: Widget, components: Components) -> Self {
        Self {
            components,
            layout: AppLayout::default(),
            widget,
        }
    }
}
