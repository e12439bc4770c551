//! # Auction Publisher Worker
//!
//! Claims approved orders and runs the publish protocol: channel post (with
//! retry), comment-thread discovery, the "place your bids" comment, an
//! optional repost, then the final write. Failures inside the protocol mark
//! the order FAILED and never stop the loop.

use super::formatting::format_announcement;
use super::poll_loop::PollWorker;
use crate::claim::{ClaimQueue, JobClaimer};
use crate::config::{AuctionChannelConfig, AuctionConfig};
use crate::constants::tags;
use crate::error::{AuctionError, Result};
use crate::gateway::{ForwardRequest, MessagingGateway, OutboundMessage};
use crate::logging::{log_error, log_order_operation};
use crate::models::{LogStore, Order, OrderColumns};
use crate::resilience::RetryPolicy;
use crate::store::OrderStore;
use crate::thread_discovery::ThreadDiscoveryScanner;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct AuctionPublisher {
    claimer: JobClaimer,
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn MessagingGateway>,
    scanner: ThreadDiscoveryScanner,
    retry: RetryPolicy,
    channel: AuctionChannelConfig,
}

impl AuctionPublisher {
    /// A missing channel id is reported per order, not here
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn MessagingGateway>,
        log_store: Arc<dyn LogStore>,
        config: &AuctionConfig,
    ) -> Result<Self> {
        let channel = config.auction.clone();
        let scanner = ThreadDiscoveryScanner::new(
            log_store,
            channel.channel_id.clone().unwrap_or_default(),
            channel.discussion_group_id,
            config.thread_discovery.clone(),
        );

        Ok(Self {
            claimer: JobClaimer::new(store.clone()),
            store,
            gateway,
            scanner,
            retry: RetryPolicy::from_config(&config.retry)?,
            channel,
        })
    }

    /// Publish one specific order without claiming it. Errors are returned
    /// to the caller and the order is left as it was. Returns `false` when
    /// the order does not exist.
    pub async fn process_order(&self, order_id: i64) -> Result<bool> {
        match self.claimer.claim_next(ClaimQueue::Auction, Some(order_id)).await? {
            Some(mut order) => {
                self.publish(&mut order).await?;
                Ok(true)
            }
            None => {
                warn!(order_id = order_id, "Order not found");
                Ok(false)
            }
        }
    }

    /// Run the publish protocol for a claimed order
    pub async fn publish(&self, order: &mut Order) -> Result<()> {
        let channel_id = self.channel.require_channel_id()?.to_string();

        let message_id = match order.auction_message_id() {
            Some(existing) => {
                info!(
                    order_id = order.id,
                    message_id = existing,
                    "Channel post already recorded, not posting again"
                );
                existing
            }
            None => self.post_to_channel(order, &channel_id).await?,
        };

        let comment_message_id = match self.scanner.find_thread_id(message_id).await? {
            Some(thread_id) => self.post_comment(order, thread_id).await,
            None => None,
        };

        self.repost(order, &channel_id, message_id).await;

        order.mark_published(comment_message_id, Utc::now())?;
        self.store.save(order, OrderColumns::Auction).await?;

        log_order_operation(
            "publish",
            Some(order.id),
            order.lot_name.as_deref(),
            "published",
            Some(&format!(
                "message_id={message_id} comment_message_id={comment_message_id:?}"
            )),
        );
        Ok(())
    }

    async fn post_to_channel(&self, order: &mut Order, channel_id: &str) -> Result<i64> {
        let media = self.store.media_for(order.id).await?;
        let message = OutboundMessage::new(channel_id, format_announcement(order, &self.channel))
            .with_tag(tags::auction_post(order.id))
            .with_media(media);

        let outcome = self
            .retry
            .run(|| self.gateway.send_message(message.clone()))
            .await?;

        let message_id = match outcome.last_message_id() {
            Some(id) if outcome.error.is_none() => id,
            _ => {
                return Err(AuctionError::PublishError {
                    order_id: order.id,
                    reason: format!("channel post failed: {}", outcome.failure_reason()),
                })
            }
        };

        info!(order_id = order.id, message_id = message_id, "📤 Posted to channel");

        // Recorded before anything else can fail so a re-claim never reposts
        order.record_channel_message(message_id);
        self.store.save(order, OrderColumns::Auction).await?;

        Ok(message_id)
    }

    async fn post_comment(&self, order: &Order, thread_id: i64) -> Option<i64> {
        let group_id = self.channel.discussion_group_id?;
        let message = OutboundMessage::new(group_id.to_string(), self.channel.comment_text.clone())
            .with_tag(tags::auction_comment(order.id))
            .in_reply_to(thread_id);

        match self.gateway.send_message(message).await {
            Ok(outcome) if outcome.is_ok() => {
                let comment_id = outcome.last_message_id();
                info!(order_id = order.id, comment_message_id = ?comment_id, "💬 Comment posted");
                comment_id
            }
            Ok(outcome) => {
                warn!(
                    order_id = order.id,
                    thread_id = thread_id,
                    reason = %outcome.failure_reason(),
                    "Failed to post comment to thread"
                );
                None
            }
            Err(e) => {
                warn!(order_id = order.id, thread_id = thread_id, error = %e, "Failed to post comment to thread");
                None
            }
        }
    }

    async fn repost(&self, order: &Order, channel_id: &str, message_id: i64) {
        let Some(repost_group) = self.channel.repost_group() else {
            return;
        };

        let request = ForwardRequest {
            from_chat: channel_id.to_string(),
            to_chat: repost_group.to_string(),
            message_id,
            topic_id: self.channel.repost_topic_id,
        };

        match self.gateway.forward_message(request).await {
            Ok(outcome) if outcome.is_ok() => info!(
                order_id = order.id,
                forwarded_message_id = ?outcome.last_message_id(),
                "🔄 Forwarded to repost group"
            ),
            Ok(outcome) => warn!(
                order_id = order.id,
                reason = %outcome.failure_reason(),
                "Failed to forward to repost group"
            ),
            Err(e) => warn!(order_id = order.id, error = %e, "Failed to forward to repost group"),
        }
    }

    /// Publish a claimed order, converting any failure into FAILED
    async fn publish_claimed(&self, mut order: Order) -> Result<()> {
        let Err(e) = self.publish(&mut order).await else {
            return Ok(());
        };

        error!(
            order_id = order.id,
            lot_name = order.lot_label(),
            error = %e,
            "❌ Failed to publish order"
        );
        log_error(
            "auction_publisher",
            "publish",
            &e.to_string(),
            Some(&format!("order_id={}", order.id)),
        );

        order.mark_failed();
        self.store.save(&mut order, OrderColumns::Auction).await
    }
}

#[async_trait]
impl PollWorker for AuctionPublisher {
    fn name(&self) -> &'static str {
        "auction_publisher"
    }

    async fn process_next(&self) -> Result<bool> {
        let Some(order) = self.claimer.claim_next(ClaimQueue::Auction, None).await? else {
            return Ok(false);
        };

        self.publish_claimed(order).await?;
        Ok(true)
    }
}
