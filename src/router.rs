use std::sync::Arc;

use crate::blocklist::BlockList;
use crate::config::Config;
use crate::directory::Directory;
use crate::error::{GatewayError, GatewayResult, TransportError};
use crate::metrics;
use crate::relay_map::RelayMap;
use crate::transport::{Inbound, InboundKind, Transport};
use crate::types::UserId;
use crate::utils::display_user;

// ============================================================================
// Router - the relay state machine
// ============================================================================
//
// Two directional flows, each triggered by one inbound event:
//
//   user -> operator:  block check, directory upsert, info message, forward,
//                      relay link record, delivery ack to the user
//   operator -> user:  must be a reply; relay link resolve, block check,
//                      copy (not forward) to the user, confirmation
//
// plus the operator command surface. The Router owns all shared state; no
// lock is held across a transport await.
//
// ============================================================================

// Reply texts. Blocked senders deliberately get none of these: a blocked
// user must not be able to observe their own block status.
pub const ACK_SENT: &str = "✅ Sent to admin";
pub const DELIVERED: &str = "✅ Delivered";
pub const USER_NOT_FOUND: &str = "❌ User not found";
pub const USER_BLOCKED: &str = "🚫 User blocked";
pub const NO_USERS_YET: &str = "No users yet";
pub const NO_HANDLE: &str = "NoUsername";
pub const USAGE_BLOCK: &str = "Usage: /block user_id";
pub const USAGE_UNBLOCK: &str = "Usage: /unblock user_id";
pub const WELCOME: &str =
    "👋 Welcome!\nEverything you send here goes straight to the admin.\nPlease wait for a reply 🙂";

pub struct Router {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
    directory: Directory,
    blocklist: BlockList,
    relay: RelayMap,
}

impl Router {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<Config>) -> Self {
        let relay = RelayMap::new(config.relay_map_capacity);
        Self {
            transport,
            config,
            directory: Directory::new(),
            blocklist: BlockList::new(),
            relay,
        }
    }

    pub fn operator_id(&self) -> UserId {
        self.config.operator_id
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn blocklist(&self) -> &BlockList {
        &self.blocklist
    }

    pub fn relay_map(&self) -> &RelayMap {
        &self.relay
    }

    /// Process one inbound event. Errors are transport failures; the caller
    /// logs them and the event is dropped, never retried.
    pub async fn handle(&self, inbound: Inbound) -> GatewayResult<()> {
        match inbound.kind {
            InboundKind::Command { ref name, ref args } => {
                self.handle_command(&inbound, name, args).await
            }
            InboundKind::Message => {
                if inbound.sender.id == self.config.operator_id {
                    self.deliver_reply(&inbound).await
                } else {
                    self.relay_to_operator(&inbound).await
                }
            }
        }
    }

    // ===== Flow: user -> operator =====

    async fn relay_to_operator(&self, inbound: &Inbound) -> GatewayResult<()> {
        let sender = &inbound.sender;

        // Total silence for blocked senders: no ack, no forward, no
        // directory update. Anything else would leak the block.
        if self.blocklist.is_blocked(sender.id).await {
            metrics::BLOCKED_DROPPED_TOTAL.inc();
            tracing::debug!(
                user = %display_user(sender.id, &self.config.logging),
                "dropped message from blocked sender"
            );
            return Ok(());
        }

        self.directory
            .upsert(sender.id, sender.display_name.clone(), sender.handle.clone())
            .await;

        let operator = self.config.operator_id;
        let info = format!(
            "👤 New Message\n• Name: {}\n• Username: @{}\n• ID: {}",
            sender.display_name,
            sender.handle.as_deref().unwrap_or(NO_HANDLE),
            sender.id,
        );

        // The info message must land before the forwarded content so the
        // operator has context for what follows.
        self.transport
            .send_text(operator, &info)
            .await
            .map_err(Self::transport_failure)?;

        let forwarded = self
            .transport
            .forward(operator, sender.id, inbound.message_id)
            .await
            .map_err(Self::transport_failure)?;
        self.relay.record(forwarded, sender.id).await;
        metrics::MESSAGES_RELAYED_TOTAL.inc();

        tracing::info!(
            user = %display_user(sender.id, &self.config.logging),
            forwarded_id = %forwarded,
            "relayed message to operator"
        );

        self.transport
            .send_text(sender.id, ACK_SENT)
            .await
            .map_err(Self::transport_failure)?;
        Ok(())
    }

    // ===== Flow: operator -> user =====

    async fn deliver_reply(&self, inbound: &Inbound) -> GatewayResult<()> {
        let operator = self.config.operator_id;

        // Bare operator notes are not part of any flow.
        let Some(replied_to) = inbound.reply_to else {
            tracing::debug!("ignoring operator message that is not a reply");
            return Ok(());
        };

        let Some(target) = self.relay.resolve(replied_to).await else {
            metrics::RELAY_RESOLVE_MISSES_TOTAL.inc();
            tracing::debug!(replied_to = %replied_to, "reply has no relay link");
            self.transport
                .send_text(operator, USER_NOT_FOUND)
                .await
                .map_err(Self::transport_failure)?;
            return Ok(());
        };

        if self.blocklist.is_blocked(target).await {
            self.transport
                .send_text(operator, USER_BLOCKED)
                .await
                .map_err(Self::transport_failure)?;
            return Ok(());
        }

        // Copy, not forward: a forward would tag the message as
        // "forwarded from <operator>" and break anonymity.
        self.transport
            .copy(target, operator, inbound.message_id)
            .await
            .map_err(Self::transport_failure)?;
        metrics::REPLIES_DELIVERED_TOTAL.inc();

        tracing::info!(
            user = %display_user(target, &self.config.logging),
            "delivered operator reply"
        );

        self.transport
            .send_text(operator, DELIVERED)
            .await
            .map_err(Self::transport_failure)?;
        Ok(())
    }

    // ===== Commands =====

    async fn handle_command(
        &self,
        inbound: &Inbound,
        name: &str,
        args: &[String],
    ) -> GatewayResult<()> {
        let sender = inbound.sender.id;

        // /start is the one command open to everyone.
        if name == "start" {
            self.transport
                .send_text(sender, WELCOME)
                .await
                .map_err(Self::transport_failure)?;
            return Ok(());
        }

        if sender != self.config.operator_id {
            tracing::debug!(
                command = name,
                user = %display_user(sender, &self.config.logging),
                "ignoring command from non-operator"
            );
            return Ok(());
        }

        match name {
            "block" => self.block_command(args).await,
            "unblock" => self.unblock_command(args).await,
            "users" => self.users_command().await,
            other => {
                tracing::debug!(command = other, "unknown operator command");
                Ok(())
            }
        }
    }

    async fn block_command(&self, args: &[String]) -> GatewayResult<()> {
        let operator = self.config.operator_id;
        let Some(id) = args.first().and_then(|a| UserId::parse(a).ok()) else {
            self.transport
                .send_text(operator, USAGE_BLOCK)
                .await
                .map_err(Self::transport_failure)?;
            return Ok(());
        };

        self.blocklist.block(id).await;
        tracing::info!(user = %display_user(id, &self.config.logging), "user blocked");
        self.transport
            .send_text(operator, &format!("🚫 Blocked {}", id))
            .await
            .map_err(Self::transport_failure)?;
        Ok(())
    }

    async fn unblock_command(&self, args: &[String]) -> GatewayResult<()> {
        let operator = self.config.operator_id;
        let Some(id) = args.first().and_then(|a| UserId::parse(a).ok()) else {
            self.transport
                .send_text(operator, USAGE_UNBLOCK)
                .await
                .map_err(Self::transport_failure)?;
            return Ok(());
        };

        self.blocklist.unblock(id).await;
        tracing::info!(user = %display_user(id, &self.config.logging), "user unblocked");
        self.transport
            .send_text(operator, &format!("✅ Unblocked {}", id))
            .await
            .map_err(Self::transport_failure)?;
        Ok(())
    }

    async fn users_command(&self) -> GatewayResult<()> {
        let operator = self.config.operator_id;
        let users = self.directory.list().await;

        if users.is_empty() {
            self.transport
                .send_text(operator, NO_USERS_YET)
                .await
                .map_err(Self::transport_failure)?;
            return Ok(());
        }

        let mut text = String::from("👥 Users:\n\n");
        for user in &users {
            text.push_str(&format!(
                "{} (@{}) → {}\n",
                user.display_name,
                user.handle.as_deref().unwrap_or(NO_HANDLE),
                user.id,
            ));
        }

        self.transport
            .send_text(operator, &text)
            .await
            .map_err(Self::transport_failure)?;
        Ok(())
    }

    fn transport_failure(e: TransportError) -> GatewayError {
        metrics::TRANSPORT_ERRORS_TOTAL.inc();
        GatewayError::Transport(e)
    }
}
