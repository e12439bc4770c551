//! # Admin Notification Worker
//!
//! Claims new orders from the review queue and sends each one to the admin
//! chat with accept/reject buttons. The decision itself is handled by the
//! bot, outside this crate.

use super::formatting::format_admin_summary;
use super::poll_loop::PollWorker;
use crate::claim::{ClaimQueue, JobClaimer};
use crate::config::AuctionConfig;
use crate::constants::{callbacks, tags};
use crate::error::{AuctionError, Result};
use crate::gateway::{InlineButton, InlineKeyboard, MessagingGateway, OutboundMessage};
use crate::locations::LocationResolver;
use crate::logging::log_order_operation;
use crate::models::{Location, Order, OrderColumns};
use crate::store::OrderStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct AdminNotifier {
    claimer: JobClaimer,
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn MessagingGateway>,
    resolver: Arc<dyn LocationResolver>,
    admin_chat_id: String,
    stale_claim_threshold: Duration,
}

impl AdminNotifier {
    /// Fails with a configuration error when no admin chat is configured
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn MessagingGateway>,
        resolver: Arc<dyn LocationResolver>,
        config: &AuctionConfig,
    ) -> Result<Self> {
        let admin_chat_id = config.admin.require_chat_id()?.to_string();

        Ok(Self {
            claimer: JobClaimer::new(store.clone()),
            store,
            gateway,
            resolver,
            admin_chat_id,
            stale_claim_threshold: config.workers.stale_claim_threshold(),
        })
    }

    /// Return abandoned review claims to the queue
    pub async fn sweep_stale_claims(&self) -> Result<u64> {
        self.claimer.sweep_stale_claims(self.stale_claim_threshold).await
    }

    /// Send one specific order without claiming it. Returns `false` when the
    /// order does not exist.
    pub async fn process_order(&self, order_id: i64) -> Result<bool> {
        match self.claimer.claim_next(ClaimQueue::Review, Some(order_id)).await? {
            Some(mut order) => {
                self.notify(&mut order).await?;
                Ok(true)
            }
            None => {
                warn!(order_id = order_id, "Order not found");
                Ok(false)
            }
        }
    }

    /// Resolve locations, send the review request and mark the order sent.
    /// On failure the order keeps its claim for the stale sweep.
    pub async fn notify(&self, order: &mut Order) -> Result<()> {
        let locations = self.resolve_locations(order).await?;
        let submitter = self.store.submitter(order.uid).await?;

        let text = format_admin_summary(order, &locations, submitter.as_ref());
        let message = OutboundMessage::new(self.admin_chat_id.clone(), text)
            .with_tag(tags::admin_order(order.id))
            .with_keyboard(review_keyboard(order.id));

        let outcome = self.gateway.send_message(message).await.map_err(|e| {
            error!(order_id = order.id, error = %e, "Failed to send order to admin");
            e
        })?;

        if !outcome.is_ok() {
            let reason = outcome.failure_reason();
            error!(order_id = order.id, reason = %reason, "Admin chat rejected review request");
            return Err(AuctionError::GatewayError(format!(
                "admin notification for order {} failed: {reason}",
                order.id
            )));
        }

        order.mark_review_sent();
        self.store.save(order, OrderColumns::Review).await?;

        log_order_operation(
            "admin_notify",
            Some(order.id),
            order.lot_name.as_deref(),
            "sended",
            None,
        );
        Ok(())
    }

    async fn resolve_locations(&self, order: &Order) -> Result<Vec<Location>> {
        let linked = self.store.locations_for(order.id).await?;
        if !linked.is_empty() {
            return Ok(linked);
        }

        let Some(text) = order.locations.as_deref().filter(|t| !t.trim().is_empty()) else {
            return Ok(linked);
        };

        match self.resolver.resolve_locations_in_text(text).await {
            Ok(ids) if ids.is_empty() => {
                debug!(order_id = order.id, "No known locations in pickup text");
                Ok(linked)
            }
            Ok(ids) => {
                self.store.attach_locations(order.id, &ids).await?;
                info!(order_id = order.id, location_count = ids.len(), "Linked resolved locations");
                self.store.locations_for(order.id).await
            }
            Err(e) => {
                // The summary still carries the raw pickup text
                warn!(order_id = order.id, error = %e, "Location resolution failed");
                Ok(linked)
            }
        }
    }
}

fn review_keyboard(order_id: i64) -> InlineKeyboard {
    InlineKeyboard::single_row(vec![
        InlineButton {
            text: "✅ Accept".to_string(),
            callback_data: callbacks::accept_order(order_id),
        },
        InlineButton {
            text: "❌ Reject".to_string(),
            callback_data: callbacks::reject_order(order_id),
        },
    ])
}

#[async_trait]
impl PollWorker for AdminNotifier {
    fn name(&self) -> &'static str {
        "admin_notifier"
    }

    async fn prepare(&self) -> Result<()> {
        self.sweep_stale_claims().await?;
        Ok(())
    }

    async fn process_next(&self) -> Result<bool> {
        let Some(mut order) = self.claimer.claim_next(ClaimQueue::Review, None).await? else {
            return Ok(false);
        };

        self.notify(&mut order).await?;
        Ok(true)
    }
}
