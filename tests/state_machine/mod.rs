//! Property tests for the order state rules

use auction_core::models::{NewOrder, Order};
use auction_core::{derive_status, AuctionStatus, OrderStatus, ReviewCheck};
use chrono::Utc;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Transition {
    ClaimForReview,
    MarkReviewSent,
    ReleaseReviewClaim,
    Accept,
    Reject,
    Close,
    MarkBroken,
    BeginPublishing,
    RecordChannelMessage(i64),
    MarkPublished,
    MarkFailed,
}

fn transition() -> impl Strategy<Value = Transition> {
    prop_oneof![
        Just(Transition::ClaimForReview),
        Just(Transition::MarkReviewSent),
        Just(Transition::ReleaseReviewClaim),
        Just(Transition::Accept),
        Just(Transition::Reject),
        Just(Transition::Close),
        Just(Transition::MarkBroken),
        Just(Transition::BeginPublishing),
        (1_i64..10_000).prop_map(Transition::RecordChannelMessage),
        Just(Transition::MarkPublished),
        Just(Transition::MarkFailed),
    ]
}

fn apply(order: &mut Order, transition: Transition) {
    let now = Utc::now();
    match transition {
        Transition::ClaimForReview => order.claim_for_review(now),
        Transition::MarkReviewSent => order.mark_review_sent(),
        Transition::ReleaseReviewClaim => order.release_review_claim(),
        Transition::Accept => order.record_review_decision(true),
        Transition::Reject => order.record_review_decision(false),
        Transition::Close => order.close(now),
        Transition::MarkBroken => order.mark_broken(),
        Transition::BeginPublishing => order.begin_publishing(),
        Transition::RecordChannelMessage(id) => order.record_channel_message(id),
        Transition::MarkPublished => {
            let had_message = order.auction_message_id().is_some();
            assert_eq!(order.mark_published(None, now).is_ok(), had_message);
        }
        Transition::MarkFailed => order.mark_failed(),
    }
}

fn fresh_order() -> Order {
    Order::from_new(
        1,
        NewOrder {
            uid: 9,
            text: "Bike".into(),
            ..Default::default()
        },
        Utc::now(),
    )
}

proptest! {
    #[test]
    fn status_follows_precedence(steps in prop::collection::vec(transition(), 0..24)) {
        let mut order = fresh_order();
        for step in steps {
            apply(&mut order, step);

            let expected = if order.is_broken() {
                OrderStatus::Broken
            } else if order.closed_at().is_some() {
                OrderStatus::Closed
            } else {
                match order.review_check() {
                    ReviewCheck::Blocked => OrderStatus::RejectedByAdmin,
                    ReviewCheck::InWork => OrderStatus::InWork,
                    _ => OrderStatus::New,
                }
            };
            prop_assert_eq!(order.status(), expected);
            prop_assert_eq!(
                order.status(),
                derive_status(order.closed_at().is_some(), order.review_check(), order.is_broken())
            );
        }
    }

    #[test]
    fn claim_timestamp_only_while_sending(steps in prop::collection::vec(transition(), 0..24)) {
        let mut order = fresh_order();
        for step in steps {
            apply(&mut order, step);
            if order.review_claimed_at().is_some() {
                prop_assert_eq!(order.review_check(), ReviewCheck::Sending);
            }
        }
    }

    #[test]
    fn published_orders_carry_channel_message(steps in prop::collection::vec(transition(), 0..24)) {
        let mut order = fresh_order();
        for step in steps {
            apply(&mut order, step);
            if order.auction_status() == Some(AuctionStatus::Published) {
                prop_assert!(order.auction_message_id().is_some());
                prop_assert!(order.auction_posted_at().is_some());
            }
        }
    }
}

#[test]
fn test_status_codes_match_storage() {
    let cases = [
        (OrderStatus::New, 0),
        (OrderStatus::RejectedByAdmin, 2),
        (OrderStatus::InWork, 3),
        (OrderStatus::Broken, 4),
        (OrderStatus::Closed, 8),
    ];
    for (status, code) in cases {
        assert_eq!(status.code(), code);
        assert_eq!(OrderStatus::from_code(code).unwrap(), status);
    }
    assert!(OrderStatus::from_code(1).is_err());
}
