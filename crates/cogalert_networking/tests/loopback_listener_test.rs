//! Integration tests: real UDP traffic over loopback into the dispatch queue.

use cogalert_core::{AlertPayload, Consumer, DispatchQueue, DisplayError, QueueConfig};
use cogalert_networking::{AlertSender, DatagramListener, ListenerConfig, ListenerError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn start_listener() -> (DatagramListener, Consumer, Arc<DispatchQueue>) {
    let queue = DispatchQueue::shared(QueueConfig::default());
    let consumer = queue.attach_consumer().unwrap();
    let listener = DatagramListener::start(&ListenerConfig::localhost(0), Arc::clone(&queue)).unwrap();
    (listener, consumer, queue)
}

/// Drains every few ms until `expected` alerts were shown or time runs out.
fn collect(consumer: &mut Consumer, expected: usize) -> Vec<String> {
    let mut shown = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while shown.len() < expected && Instant::now() < deadline {
        consumer.drain_and_run(&mut |payload: &AlertPayload| -> Result<(), DisplayError> {
            shown.push(payload.to_string());
            Ok(())
        });
        thread::sleep(Duration::from_millis(5));
    }
    shown
}

#[test]
fn test_alerts_arrive_in_order_and_noise_is_filtered() {
    let (listener, mut consumer, _queue) = start_listener();
    let mut sender = AlertSender::new(listener.local_addr()).unwrap();

    sender.send_alert("HIGH").unwrap();
    sender.send_alert("LOW").unwrap();
    sender.send_raw(b"NOISE").unwrap();
    sender.send_alert("HIGH").unwrap();

    let shown = collect(&mut consumer, 3);
    assert_eq!(shown, vec!["HIGH", "LOW", "HIGH"]);

    // Let the NOISE datagram settle; it must never show up
    thread::sleep(Duration::from_millis(50));
    let report = consumer.drain_and_run(&mut |_: &AlertPayload| -> Result<(), DisplayError> { Ok(()) });
    assert!(report.is_empty());

    let stats = listener.stats();
    assert_eq!(stats.datagrams_received.load(Ordering::Relaxed), 4);
    assert_eq!(stats.alerts_enqueued.load(Ordering::Relaxed), 3);
    assert_eq!(stats.ignored.load(Ordering::Relaxed), 1);
}

#[test]
fn test_long_sequence_preserves_order() {
    let (listener, mut consumer, _queue) = start_listener();
    let mut sender = AlertSender::new(listener.local_addr()).unwrap();

    let labels: Vec<String> = (0..200).map(|i| format!("L{i}")).collect();
    for label in &labels {
        sender.send_alert(label).unwrap();
        // Keep well under the loopback receive buffer
        if label.ends_with('0') {
            thread::sleep(Duration::from_millis(1));
        }
    }

    let shown = collect(&mut consumer, labels.len());
    assert_eq!(shown, labels);
}

#[test]
fn test_payload_keeps_extra_delimiters() {
    let (listener, mut consumer, _queue) = start_listener();
    let mut sender = AlertSender::new(listener.local_addr()).unwrap();

    sender.send_raw(b"ALERT|HIGH|0.97").unwrap();

    assert_eq!(collect(&mut consumer, 1), vec!["HIGH|0.97"]);
}

#[test]
fn test_long_payload_is_delivered_in_full() {
    let (listener, mut consumer, _queue) = start_listener();
    let mut sender = AlertSender::new(listener.local_addr()).unwrap();
    let label = "X".repeat(1500);
    let big = "Y".repeat(8000);

    sender.send_alert(&label).unwrap();
    sender.send_alert(&big).unwrap();

    assert_eq!(collect(&mut consumer, 2), vec![label, big]);
}

#[test]
fn test_bad_datagram_does_not_stop_listener() {
    let (listener, mut consumer, _queue) = start_listener();
    let mut sender = AlertSender::new(listener.local_addr()).unwrap();

    sender.send_raw(&[0xff, 0xfe, 0xfd]).unwrap();
    sender.send_alert("STILL_RUNNING").unwrap();

    assert_eq!(collect(&mut consumer, 1), vec!["STILL_RUNNING"]);
    assert!(listener.is_running());
    assert_eq!(listener.stats().receive_errors.load(Ordering::Relaxed), 1);
}

#[test]
fn test_port_in_use_is_bind_error() {
    let (listener, _consumer, queue) = start_listener();
    let config = ListenerConfig::localhost(listener.local_addr().port());

    let err = DatagramListener::start(&config, queue).err().unwrap();

    assert!(err.is_bind());
    match err {
        ListenerError::Bind { addr, .. } => assert_eq!(addr, listener.local_addr()),
        other => panic!("expected bind error, got {other}"),
    }
}

#[test]
fn test_stop_unblocks_receive_promptly() {
    let queue = DispatchQueue::shared(QueueConfig::default());
    let _consumer = queue.attach_consumer().unwrap();
    // Long read timeout: only the wake datagram can end the receive quickly
    let config = ListenerConfig {
        read_timeout_ms: 30_000,
        ..ListenerConfig::localhost(0)
    };
    let mut listener = DatagramListener::start(&config, queue).unwrap();

    // Make sure the thread is parked in recv
    thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    listener.stop();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(!listener.is_running());

    // Idempotent
    listener.stop();
    assert!(!listener.is_running());
}

#[test]
fn test_port_is_reusable_after_stop() {
    let (mut listener, _consumer, queue) = start_listener();
    let port = listener.local_addr().port();
    listener.stop();

    let again = DatagramListener::start(&ListenerConfig::localhost(port), queue).unwrap();
    assert_eq!(again.local_addr().port(), port);
}

#[test]
fn test_alerts_without_consumer_are_counted_not_queued() {
    let queue = DispatchQueue::shared(QueueConfig::default());
    let listener = DatagramListener::start(&ListenerConfig::localhost(0), Arc::clone(&queue)).unwrap();
    let mut sender = AlertSender::new(listener.local_addr()).unwrap();

    sender.send_alert("EARLY").unwrap();

    let stats = listener.stats();
    let deadline = Instant::now() + Duration::from_secs(5);
    while stats.rejected.load(Ordering::Relaxed) == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(stats.rejected.load(Ordering::Relaxed), 1);
    assert!(queue.is_empty());
    assert!(listener.is_running());
}
