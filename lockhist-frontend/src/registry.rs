use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
};

use ratatui::style::{Color, Modifier, Style};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::{
    error::AppError,
    model::{Icon, Widget, CARD_SIZE},
    settings::{CardConfig, GlyphSet},
};

pub const CARD_NAME: &str = "lock-history-card";
pub const ICON_COMPONENT: &str = "ha-icon";
pub const ITEM_BODY_COMPONENT: &str = "paper-item-body";

#[derive(Clone, Debug)]
pub enum Component {
    Card(CardDefinition),
    Icons(IconSet),
    ItemBody(ItemBody),
}

#[derive(Clone, Copy, Debug)]
pub struct CardDefinition {
    pub create: fn(CardConfig) -> Widget,
    pub size: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IconSet {
    pub home: &'static str,
    pub lock: &'static str,
}

impl IconSet {
    pub fn glyph(&self, icon: Icon) -> &'static str {
        match icon {
            Icon::Home => self.home,
            Icon::Lock => self.lock,
        }
    }
}

impl From<GlyphSet> for IconSet {
    fn from(glyphs: GlyphSet) -> Self {
        match glyphs {
            GlyphSet::Ascii => Self {
                home: "H",
                lock: "L",
            },
            GlyphSet::Unicode => Self {
                home: "🏠",
                lock: "🔒",
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ItemBody {
    pub primary: Style,
    pub secondary: Style,
}

impl Default for ItemBody {
    fn default() -> Self {
        Self {
            primary: Style::default(),
            secondary: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        }
    }
}

/// Leaf components the card renders with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Components {
    pub icons: IconSet,
    pub item_body: ItemBody,
}

impl Default for Components {
    fn default() -> Self {
        Self {
            icons: IconSet::from(GlyphSet::default()),
            item_body: ItemBody::default(),
        }
    }
}

/// Name keyed component definitions. Every name gets defined at most once.
#[derive(Default)]
pub struct Registry {
    entries: Mutex<HashMap<String, Arc<OnceCell<Component>>>>,
}

impl Registry {
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::default)
    }

    pub fn get(&self, name: &str) -> Option<Component> {
        self.lock()
            .get(name)
            .and_then(|cell| cell.get())
            .cloned()
    }

    pub fn define(&self, name: &str, component: Component) -> bool {
        let defined = self.cell(name).set(component).is_ok();
        if !defined {
            tracing::debug!("component {} is already defined", name);
        }

        defined
    }

    /// Returns the component for name and runs loader if it is missing. Concurrent
    /// callers share one loader run.
    pub async fn ensure<F, Fut>(&self, name: &str, loader: F) -> Result<Component, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Component, AppError>>,
    {
        let cell = self.cell(name);
        let component = cell
            .get_or_try_init(move || async move {
                tracing::info!("loading component {}", name);
                loader().await
            })
            .await?;

        Ok(component.clone())
    }

    fn cell(&self, name: &str) -> Arc<OnceCell<Component>> {
        self.lock()
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<OnceCell<Component>>>> {
        match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub fn define_widget(registry: &Registry) -> bool {
    registry.define(
        CARD_NAME,
        Component::Card(CardDefinition {
            create: Widget::new,
            size: CARD_SIZE,
        }),
    )
}

/// Creates the card registered under name and applies the dashboard config.
pub fn instantiate(registry: &Registry, name: &str, config: Value) -> Result<Widget, AppError> {
    match registry.get(name) {
        Some(Component::Card(definition)) => {
            tracing::debug!("creating {} with size {}", name, definition.size);

            let mut widget = (definition.create)(CardConfig::default());
            widget.set_config(config)?;

            Ok(widget)
        }
        Some(_) => Err(AppError::ComponentMismatch(name.to_owned())),
        None => Err(AppError::ComponentNotDefined(name.to_owned())),
    }
}

pub async fn ensure_dependencies(
    registry: &Registry,
    glyphs: GlyphSet,
) -> Result<Components, AppError> {
    let icons = match registry
        .ensure(ICON_COMPONENT, || async move {
            Ok(Component::Icons(IconSet::from(glyphs)))
        })
        .await?
    {
        Component::Icons(icons) => icons,
        _ => return Err(AppError::ComponentMismatch(ICON_COMPONENT.to_owned())),
    };

    let item_body = match registry
        .ensure(ITEM_BODY_COMPONENT, || async {
            Ok(Component::ItemBody(ItemBody::default()))
        })
        .await?
    {
        Component::ItemBody(item_body) => item_body,
        _ => return Err(AppError::ComponentMismatch(ITEM_BODY_COMPONENT.to_owned())),
    };

    Ok(Components { icons, item_body })
}
