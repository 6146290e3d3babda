//! View registration: numeric ids mapped onto session factories.
//!
//! The host UI layer asks to "open view N for the held item"; this module
//! keeps drawing out of the picture and only constructs the session.

use std::sync::Arc;

use satchel_core::ItemRegistry;

use crate::backed::{PackConfig, PackError};
use crate::player::PlayerInventory;
use crate::session::PackSession;

/// Identifier handed out by [`ViewRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u32);

impl ViewId {
    /// Raw numeric id, for wire formats and logs.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Builds a session for a registered view.
pub trait ViewFactory {
    /// Open a session on the acting player's currently equipped stack.
    fn open(
        &self,
        player: PlayerInventory,
        registry: Arc<ItemRegistry>,
    ) -> Result<PackSession, PackError>;
}

/// Factory for the standard pack view.
pub struct PackViewFactory {
    config: PackConfig,
}

impl PackViewFactory {
    /// Create a factory opening packs with the given sizing.
    pub fn new(config: PackConfig) -> Self {
        Self { config }
    }
}

impl ViewFactory for PackViewFactory {
    fn open(
        &self,
        player: PlayerInventory,
        registry: Arc<ItemRegistry>,
    ) -> Result<PackSession, PackError> {
        PackSession::open(player, registry, &self.config)
    }
}

/// Registry of view factories keyed by sequentially assigned ids.
#[derive(Default)]
pub struct ViewRegistry {
    factories: Vec<Box<dyn ViewFactory>>,
}

impl ViewRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, handing back the next available id.
    pub fn register(&mut self, factory: Box<dyn ViewFactory>) -> ViewId {
        let id = ViewId(self.factories.len() as u32);
        self.factories.push(factory);
        id
    }

    /// Open the view registered under `id`.
    pub fn open(
        &self,
        id: ViewId,
        player: PlayerInventory,
        registry: Arc<ItemRegistry>,
    ) -> Result<PackSession, PackError> {
        let factory = self
            .factories
            .get(id.0 as usize)
            .ok_or(PackError::UnknownView(id.0))?;
        factory.open(player, registry)
    }
}
