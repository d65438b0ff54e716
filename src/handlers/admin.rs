//! Admin methods.
//!
//! Most are on the master handler set only. `members.setRole` and
//! `room.setPrivacy` are also on the public set and rely on the admin
//! surface's role check. Each handler forwards its text arguments to the
//! admin surface, which does the validation.

use super::core::{Context, Handler, arg};
use crate::admin::{AliasesAdmin, MembersAdmin, PrivacyAdmin};
use crate::error::{HandlerResult, to_result};
use async_trait::async_trait;

/// `members.list`
pub struct MembersListHandler;

#[async_trait]
impl Handler for MembersListHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[&str]) -> HandlerResult {
        let members = MembersAdmin::new(&ctx.room.db).overview().await?;
        to_result(&members)
    }
}

/// `members.get <id>`
pub struct MembersGetHandler;

#[async_trait]
impl Handler for MembersGetHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let member = MembersAdmin::new(&ctx.room.db).details(arg(args, 0)).await?;
        to_result(&member)
    }
}

/// `members.removeConfirm <id>`: the member record, or a redirect when it is gone.
pub struct MembersRemoveConfirmHandler;

#[async_trait]
impl Handler for MembersRemoveConfirmHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let confirm = MembersAdmin::new(&ctx.room.db)
            .remove_confirm(arg(args, 0))
            .await?;
        to_result(&confirm)
    }
}

/// `members.add <identity>`
pub struct MembersAddHandler;

#[async_trait]
impl Handler for MembersAddHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let redirect = MembersAdmin::new(&ctx.room.db).add(arg(args, 0)).await?;
        to_result(&redirect)
    }
}

/// `members.setRole <id> <role>`
pub struct MembersSetRoleHandler;

#[async_trait]
impl Handler for MembersSetRoleHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let redirect = MembersAdmin::new(&ctx.room.db)
            .change_role(&ctx.principal, arg(args, 0), arg(args, 1))
            .await?;
        to_result(&redirect)
    }
}

/// `members.remove <id>`
pub struct MembersRemoveHandler;

#[async_trait]
impl Handler for MembersRemoveHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let redirect = MembersAdmin::new(&ctx.room.db).remove(arg(args, 0)).await?;
        to_result(&redirect)
    }
}

/// `aliases.list`
pub struct AliasesListHandler;

#[async_trait]
impl Handler for AliasesListHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[&str]) -> HandlerResult {
        let aliases = AliasesAdmin::new(&ctx.room.db).overview().await?;
        to_result(&aliases)
    }
}

/// `aliases.get <id>`: the alias record, or a redirect when it is gone.
pub struct AliasesGetHandler;

#[async_trait]
impl Handler for AliasesGetHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let confirm = AliasesAdmin::new(&ctx.room.db)
            .revoke_confirm(arg(args, 0))
            .await?;
        to_result(&confirm)
    }
}

/// `aliases.revoke <name>`
pub struct AliasesRevokeHandler;

#[async_trait]
impl Handler for AliasesRevokeHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let redirect = AliasesAdmin::new(&ctx.room.db).revoke(arg(args, 0)).await?;
        to_result(&redirect)
    }
}

/// `room.setPrivacy <open|community|restricted>`
pub struct SetPrivacyHandler;

#[async_trait]
impl Handler for SetPrivacyHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[&str]) -> HandlerResult {
        let redirect = PrivacyAdmin::new(&ctx.room.db, &ctx.room.privacy)
            .set(&ctx.principal, arg(args, 0))
            .await?;
        to_result(&redirect)
    }
}
