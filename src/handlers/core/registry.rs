//! Request handler registry and dispatch.

use super::context::{Context, Handler};
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{admin, room};
use crate::telemetry::{CommandTimer, spans};
use std::collections::HashMap;
use tracing::{Instrument, debug};

/// Registry of request handlers for one handler set.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
    /// Sorted method names, as reported by `room.manifest`.
    manifest: Vec<&'static str>,
}

impl Registry {
    /// Methods any admitted peer may call.
    pub fn public() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();
        Self::insert_public(&mut handlers);
        Self::from_handlers(handlers)
    }

    /// Full capability set for the room's own identity.
    pub fn master() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();
        Self::insert_public(&mut handlers);

        // Member administration
        handlers.insert("members.list", Box::new(admin::MembersListHandler));
        handlers.insert("members.get", Box::new(admin::MembersGetHandler));
        handlers.insert("members.add", Box::new(admin::MembersAddHandler));
        handlers.insert("members.removeConfirm", Box::new(admin::MembersRemoveConfirmHandler));
        handlers.insert("members.remove", Box::new(admin::MembersRemoveHandler));

        // Alias administration
        handlers.insert("aliases.list", Box::new(admin::AliasesListHandler));
        handlers.insert("aliases.get", Box::new(admin::AliasesGetHandler));
        handlers.insert("aliases.revoke", Box::new(admin::AliasesRevokeHandler));

        Self::from_handlers(handlers)
    }

    fn insert_public(handlers: &mut HashMap<&'static str, Box<dyn Handler>>) {
        handlers.insert("room.ping", Box::new(room::PingHandler));
        handlers.insert("room.whoami", Box::new(room::WhoamiHandler));
        handlers.insert("room.manifest", Box::new(room::ManifestHandler));
        handlers.insert("room.privacy", Box::new(room::PrivacyHandler));
        handlers.insert("room.resolveAlias", Box::new(room::ResolveAliasHandler));
        handlers.insert("room.registerAlias", Box::new(room::RegisterAliasHandler));

        // Role-gated: the acting principal's role decides
        handlers.insert("members.setRole", Box::new(admin::MembersSetRoleHandler));
        handlers.insert("room.setPrivacy", Box::new(admin::SetPrivacyHandler));
    }

    fn from_handlers(handlers: HashMap<&'static str, Box<dyn Handler>>) -> Self {
        let mut manifest: Vec<_> = handlers.keys().copied().collect();
        manifest.sort_unstable();
        Self { handlers, manifest }
    }

    pub fn manifest(&self) -> &[&'static str] {
        &self.manifest
    }

    /// Dispatch one request line `<method> [args...]`.
    pub async fn dispatch(&self, ctx: &Context<'_>, line: &str) -> HandlerResult {
        let mut parts = line.split_whitespace();
        let method = parts.next().ok_or(HandlerError::EmptyRequest)?;
        let args: Vec<&str> = parts.collect();

        let Some((&name, handler)) = self.handlers.get_key_value(method) else {
            crate::metrics::record_command_error("unknown", "unknown_method");
            return Err(HandlerError::UnknownMethod(method.to_string()));
        };

        let span = spans::command(name, &ctx.peer.to_string());
        let _timer = CommandTimer::new(name);

        let result = handler.handle(ctx, &args).instrument(span).await;

        if let Err(ref e) = result {
            crate::metrics::record_command_error(name, e.error_code());
            debug!(method = name, error = %e, "Request error");
        }

        result
    }
}
