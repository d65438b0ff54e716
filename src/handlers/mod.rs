//! Request handlers.
//!
//! A session is served by one of two handler sets chosen at connection time
//! by the [`Gate`](crate::caps::Gate): the master set for the room's own
//! identity and the public set for everyone else admitted. Each set is a
//! [`Registry`] of method handlers; requests for methods outside the set are
//! answered with `unknown_method`.

mod admin;
mod core;
mod room;

pub use self::core::{Context, Registry};

use crate::error::HandlerResult;
use serde::Serialize;
use std::sync::Arc;

/// Which handler set a session was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Master,
    Public,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Public => "public",
        }
    }
}

/// Handler set bound to one session.
#[derive(Clone)]
pub struct SessionHandler {
    kind: HandlerKind,
    registry: Arc<Registry>,
}

impl SessionHandler {
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    pub fn manifest(&self) -> &[&'static str] {
        self.registry.manifest()
    }

    pub async fn dispatch(&self, ctx: &Context<'_>, line: &str) -> HandlerResult {
        self.registry.dispatch(ctx, line).await
    }
}

/// Both handler sets, built once and handed out per connection.
pub struct HandlerSet {
    master: SessionHandler,
    public: SessionHandler,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self {
            master: SessionHandler {
                kind: HandlerKind::Master,
                registry: Arc::new(Registry::master()),
            },
            public: SessionHandler {
                kind: HandlerKind::Public,
                registry: Arc::new(Registry::public()),
            },
        }
    }

    pub fn master(&self) -> SessionHandler {
        self.master.clone()
    }

    pub fn public(&self) -> SessionHandler {
        self.public.clone()
    }
}

impl Default for HandlerSet {
    fn default() -> Self {
        Self::new()
    }
}
