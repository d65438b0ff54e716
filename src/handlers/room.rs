//! Public room methods, available to every admitted peer.

use super::core::{Context, Handler};
use crate::caps::Principal;
use crate::db::DbError;
use crate::error::{HandlerError, HandlerResult, to_result};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

/// `room.ping`
pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, _ctx: &Context<'_>, _args: &[&str]) -> HandlerResult {
        Ok(json!("pong"))
    }
}

/// `room.whoami`: the peer's identity, handler set and role.
pub struct WhoamiHandler;

#[async_trait]
impl Handler for WhoamiHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[&str]) -> HandlerResult {
        Ok(json!({
            "identity": ctx.peer.to_string(),
            "handler": ctx.kind.as_str(),
            "principal": ctx.principal.to_string(),
            "role": ctx.principal.role().map(|r| r.as_str()),
        }))
    }
}

/// `room.manifest`: methods this session may call.
pub struct ManifestHandler;

#[async_trait]
impl Handler for ManifestHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[&str]) -> HandlerResult {
        Ok(json!({
            "room": ctx.room.name,
            "methods": ctx.manifest,
        }))
    }
}

/// `room.privacy`: the current privacy mode.
pub struct PrivacyHandler;

#[async_trait]
impl Handler for PrivacyHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[&str]) -> HandlerResult {
        let mode = ctx.room.privacy.load()?;
        Ok(json!(mode.as_str()))
    }
}

/// `room.resolveAlias <name>`
pub struct ResolveAliasHandler;

#[async_trait]
impl Handler for ResolveAliasHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let name = args.first().ok_or(HandlerError::NeedMoreParams)?;
        match ctx.room.db.aliases().resolve(name).await {
            Ok(alias) => to_result(&alias),
            Err(DbError::NotFound) => Err(HandlerError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// `room.registerAlias <name>`: claim an alias for the caller's own identity.
pub struct RegisterAliasHandler;

#[async_trait]
impl Handler for RegisterAliasHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let name = args.first().ok_or(HandlerError::NeedMoreParams)?;

        if matches!(ctx.principal, Principal::Visitor) {
            return Err(HandlerError::Forbidden(
                "only members may register aliases".to_string(),
            ));
        }

        let alias = ctx.room.db.aliases().register(name, ctx.peer).await?;
        info!(alias = %alias.name, identity = %alias.identity, "Alias registered");
        to_result(&alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, Role};
    use crate::handlers::HandlerKind;
    use crate::identity::{Algorithm, Identity};
    use crate::state::{PrivacyHandle, PrivacyMode, Room};
    use std::time::Duration;

    fn identity(byte: u8) -> Identity {
        Identity::new([byte; 32], Algorithm::Ed25519)
    }

    async fn room(privacy: PrivacyHandle) -> Room {
        let db = Database::new(":memory:").await.unwrap();
        Room::new("lobby", identity(0), db, privacy, Duration::from_secs(5))
    }

    fn ctx<'a>(room: &'a Room, peer: &'a Identity, principal: Principal) -> Context<'a> {
        Context {
            room,
            peer,
            kind: HandlerKind::Public,
            principal,
            manifest: &["room.ping"],
        }
    }

    #[tokio::test]
    async fn test_whoami_and_manifest() {
        let room = room(PrivacyHandle::new(PrivacyMode::Open)).await;
        let peer = identity(1);
        let ctx = ctx(&room, &peer, Principal::Visitor);

        let me = WhoamiHandler.handle(&ctx, &[]).await.unwrap();
        assert_eq!(me["identity"], peer.to_string().as_str());
        assert_eq!(me["handler"], "public");
        assert!(me["role"].is_null());

        let manifest = ManifestHandler.handle(&ctx, &[]).await.unwrap();
        assert_eq!(manifest, json!({"room": "lobby", "methods": ["room.ping"]}));
    }

    #[tokio::test]
    async fn test_privacy_reports_unknown_mode() {
        let room = room(PrivacyHandle::from_raw(42)).await;
        let peer = identity(1);
        let ctx = ctx(&room, &peer, Principal::Visitor);

        let err = PrivacyHandler.handle(&ctx, &[]).await.unwrap_err();
        assert_eq!(err.error_code(), "configuration");

        room.privacy.store(PrivacyMode::Community);
        assert_eq!(PrivacyHandler.handle(&ctx, &[]).await.unwrap(), json!("community"));
    }

    #[tokio::test]
    async fn test_alias_register_and_resolve() {
        let room = room(PrivacyHandle::new(PrivacyMode::Open)).await;
        let peer = identity(1);
        let member = room.db.members().add(&peer, Role::Member).await.unwrap();
        let ctx = ctx(&room, &peer, Principal::Member(member));

        assert!(matches!(
            RegisterAliasHandler.handle(&ctx, &[]).await,
            Err(HandlerError::NeedMoreParams)
        ));

        RegisterAliasHandler.handle(&ctx, &["bob"]).await.unwrap();
        let taken = RegisterAliasHandler.handle(&ctx, &["bob"]).await.unwrap_err();
        assert_eq!(taken.error_code(), "alias_taken");
        let invalid = RegisterAliasHandler.handle(&ctx, &["no.dots"]).await.unwrap_err();
        assert_eq!(invalid.error_code(), "invalid_alias");

        let resolved = ResolveAliasHandler.handle(&ctx, &["bob"]).await.unwrap();
        assert_eq!(resolved["identity"], peer.to_string().as_str());
        assert!(matches!(
            ResolveAliasHandler.handle(&ctx, &["nobody"]).await,
            Err(HandlerError::NotFound)
        ));
    }
}
