//! Event Queue Tests
//!
//! Tests the bounded callback-to-task mailbox and the radio callbacks that
//! feed it.
//! Run with: cargo test --test queue_tests

mod common;

use common::{PEER_A, PEER_B};
use embassy_futures::block_on;
use embassy_time::{Duration, Instant};
use espnow_modbus_bridge::config::{ESPNOW_MAX_PAYLOAD, EVENT_QUEUE_SIZE};
use espnow_modbus_bridge::radio::{EventQueue, QueueEvent, RadioCallbacks, RadioContext};
use espnow_modbus_bridge::types::{Payload, SendStatus};

fn receive_event(byte: u8) -> QueueEvent {
    QueueEvent::ReceiveResult {
        peer: PEER_A,
        payload: Payload::from_slice(&[byte]).unwrap(),
    }
}

// ============================================================================
// EventQueue Tests
// ============================================================================

#[test]
fn queue_starts_empty() {
    let queue: EventQueue<6> = EventQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
    assert_eq!(queue.capacity(), 6);
    assert_eq!(queue.dropped(), 0);
    assert_eq!(queue.try_dequeue(), None);
}

#[test]
fn queue_overflow_drops_newest_and_keeps_fifo() {
    let queue: EventQueue<6> = EventQueue::new();

    for i in 0..7u8 {
        let accepted = queue.enqueue(receive_event(i));
        assert_eq!(accepted, i < 6, "enqueue {i}");
    }
    assert_eq!(queue.len(), 6);
    assert_eq!(queue.dropped(), 1);

    for i in 0..6u8 {
        assert_eq!(queue.try_dequeue(), Some(receive_event(i)));
    }
    assert!(queue.is_empty());
}

#[test]
fn queue_accepts_again_after_drain() {
    let queue: EventQueue<2> = EventQueue::new();
    assert!(queue.enqueue(receive_event(1)));
    assert!(queue.enqueue(receive_event(2)));
    assert!(!queue.enqueue(receive_event(3)));

    assert_eq!(queue.try_dequeue(), Some(receive_event(1)));
    assert!(queue.enqueue(receive_event(4)));
    assert_eq!(queue.try_dequeue(), Some(receive_event(2)));
    assert_eq!(queue.try_dequeue(), Some(receive_event(4)));
    assert_eq!(queue.dropped(), 1);
}

#[test]
fn queue_dequeue_returns_queued_event() {
    let queue: EventQueue<6> = EventQueue::new();
    queue.enqueue(receive_event(9));

    let event = block_on(queue.dequeue(Duration::from_millis(100)));
    assert_eq!(event, Some(receive_event(9)));
}

#[test]
fn queue_dequeue_times_out_when_empty() {
    let queue: EventQueue<6> = EventQueue::new();

    let start = Instant::now();
    let event = block_on(queue.dequeue(Duration::from_millis(20)));
    assert_eq!(event, None);
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[test]
fn queue_clear_discards_everything() {
    let queue: EventQueue<6> = EventQueue::new();
    for i in 0..4 {
        queue.enqueue(receive_event(i));
    }
    assert_eq!(queue.clear(), 4);
    assert!(queue.is_empty());
    assert_eq!(queue.clear(), 0);
}

#[test]
fn event_peer_accessor() {
    let send = QueueEvent::SendResult {
        peer: PEER_B,
        status: SendStatus::Delivered,
        sequence: 3,
    };
    assert_eq!(send.peer(), PEER_B);
    assert_eq!(receive_event(0).peer(), PEER_A);
}

// ============================================================================
// Radio Callback Tests
// ============================================================================

#[test]
fn context_queue_has_configured_capacity() {
    let ctx = RadioContext::new();
    assert_eq!(ctx.queue().capacity(), EVENT_QUEUE_SIZE);
    assert_eq!(ctx.in_flight(), None);
}

#[test]
fn receive_callback_copies_payload() {
    let ctx = RadioContext::new();
    let callbacks = RadioCallbacks::new(&ctx);

    let mut driver_buffer = [0x01, 0x03, 0x00, 0x00];
    assert!(callbacks.on_receive(&PEER_A.octets(), &driver_buffer));
    // The driver reuses its buffer once the callback returns
    driver_buffer.fill(0xEE);

    match ctx.queue().try_dequeue() {
        Some(QueueEvent::ReceiveResult { peer, payload }) => {
            assert_eq!(peer, PEER_A);
            assert_eq!(payload.as_slice(), &[0x01, 0x03, 0x00, 0x00]);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn receive_callback_accepts_maximum_payload() {
    let ctx = RadioContext::new();
    let callbacks = RadioCallbacks::new(&ctx);
    let data = [0x5A; ESPNOW_MAX_PAYLOAD];

    assert!(callbacks.on_receive(&PEER_A.octets(), &data));
    assert_eq!(ctx.rx_rejected(), 0);
}

#[test]
fn receive_callback_rejects_bad_header() {
    let ctx = RadioContext::new();
    let callbacks = RadioCallbacks::new(&ctx);

    assert!(!callbacks.on_receive(&[0x11, 0x22, 0x33], &[1, 2, 3]));
    assert_eq!(ctx.rx_rejected(), 1);
    assert!(ctx.queue().is_empty());
}

#[test]
fn receive_callback_rejects_bad_length() {
    let ctx = RadioContext::new();
    let callbacks = RadioCallbacks::new(&ctx);

    assert!(!callbacks.on_receive(&PEER_A.octets(), &[]));
    assert!(!callbacks.on_receive(&PEER_A.octets(), &[0u8; ESPNOW_MAX_PAYLOAD + 1]));
    assert_eq!(ctx.rx_rejected(), 2);
    assert!(ctx.queue().is_empty());
}

#[test]
fn receive_callback_drops_when_full() {
    let ctx = RadioContext::new();
    let callbacks = RadioCallbacks::new(&ctx);

    for _ in 0..EVENT_QUEUE_SIZE {
        assert!(callbacks.on_receive(&PEER_A.octets(), &[1]));
    }
    assert!(!callbacks.on_receive(&PEER_A.octets(), &[2]));
    assert_eq!(ctx.queue().dropped(), 1);
    assert_eq!(ctx.rx_rejected(), 0);
}

#[test]
fn send_callback_without_in_flight_is_tagged_zero() {
    let ctx = RadioContext::new();
    let callbacks = RadioCallbacks::new(&ctx);

    assert!(callbacks.on_send_complete(PEER_A, SendStatus::Failed));
    assert_eq!(
        ctx.queue().try_dequeue(),
        Some(QueueEvent::SendResult {
            peer: PEER_A,
            status: SendStatus::Failed,
            sequence: 0,
        })
    );
}
