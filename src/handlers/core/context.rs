//! Handler context and the handler trait.

use crate::caps::Principal;
use crate::error::HandlerResult;
use crate::handlers::HandlerKind;
use crate::identity::Identity;
use crate::state::Room;
use async_trait::async_trait;

/// Context passed to each request handler.
pub struct Context<'a> {
    /// Shared room state.
    pub room: &'a Room,
    /// Verified identity of the connected peer.
    pub peer: &'a Identity,
    /// Handler set this session was given.
    pub kind: HandlerKind,
    /// Who is acting, resolved for this request.
    pub principal: Principal,
    /// Methods this session may call.
    pub manifest: &'a [&'static str],
}

/// A request handler.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult;
}

/// Positional argument, or empty text when absent.
///
/// Admin operations validate their own fields, so a missing argument is
/// reported by them like any other malformed value.
pub fn arg<'a>(args: &[&'a str], index: usize) -> &'a str {
    args.get(index).copied().unwrap_or("")
}
