//! Concurrency tests
//!
//! The global registry is shared by every task; encoding and decoding from
//! many threads at once must not interfere.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use sfs_protocol::core::{Buffer, Field, Registry, SFSArray, SFSObject};
use sfs_protocol::protocol::{self, Dispatcher, Message};
use sfs_protocol::utils::Metrics;
use tokio::task::JoinSet;

fn payload(seed: usize, size: usize) -> SFSObject {
    let mut items = SFSArray::new();
    for i in 0..(size % 17) {
        items.add_int((seed * i) as i32);
    }
    let mut obj = SFSObject::new();
    obj.put_long("seed", seed as i64)
        .put_byte_array("bytes", vec![(seed & 0xFF) as u8; size])
        .put_utf_string("name", format!("user-{seed}"))
        .put_sfs_array("items", items);
    obj
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_encode_decode_heavy() {
    let iterations = 2_000usize;
    let payload_sizes = [0usize, 64, 512, 4096, 40_000];

    let mut tasks = JoinSet::new();
    for &size in &payload_sizes {
        tasks.spawn(async move {
            for i in 0..iterations {
                let msg = Message::new(1, (i % 100) as i32, payload(i, size));
                let frame = protocol::encode(&msg).unwrap();
                let decoded = protocol::decode(&frame).unwrap();
                assert_eq!(decoded, msg);
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_registry_is_one_instance() {
    let mut tasks = JoinSet::new();
    for _ in 0..16 {
        tasks.spawn(async { Registry::global() as *const Registry as usize });
    }

    let first = Registry::global() as *const Registry as usize;
    while let Some(res) = tasks.join_next().await {
        assert_eq!(res.unwrap(), first);
    }
    assert!(Arc::ptr_eq(&Registry::shared(), &Registry::shared()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decode_of_shared_bytes() {
    let mut obj = payload(7, 1024);
    obj.put("nested", Field::Object(payload(8, 16)));
    let bytes = Arc::new(Field::Object(obj.clone()).to_bytes().unwrap());

    let mut tasks = JoinSet::new();
    for _ in 0..32 {
        let bytes = Arc::clone(&bytes);
        tasks.spawn_blocking(move || {
            let mut buf = Buffer::new(&bytes);
            Registry::global().decode(&mut buf).unwrap()
        });
    }

    while let Some(res) = tasks.join_next().await {
        assert_eq!(res.unwrap(), Field::Object(obj.clone()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatch() {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(1, 1, |msg: &Message| {
            let n = msg.params.get_int("n")?;
            let mut params = SFSObject::new();
            params.put_int("n", n * 2);
            Ok(Some(Message::new(1, 1, params)))
        })
        .unwrap();

    let mut tasks = JoinSet::new();
    for n in 0..64 {
        let dispatcher = dispatcher.clone();
        tasks.spawn(async move {
            let mut params = SFSObject::new();
            params.put_int("n", n);
            let reply = dispatcher.dispatch(&Message::new(1, 1, params)).unwrap().unwrap();
            assert_eq!(reply.params.get_int("n").unwrap(), n * 2);
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_metrics_updates() {
    let metrics = Arc::new(Metrics::new());

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let metrics = Arc::clone(&metrics);
        tasks.spawn(async move {
            for _ in 0..1_000 {
                metrics.connection_established();
                metrics.frame_sent(10);
                metrics.connection_closed();
            }
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.connections_total, 8_000);
    assert_eq!(snapshot.connections_active, 0);
    assert_eq!(snapshot.frames_sent, 8_000);
    assert_eq!(snapshot.bytes_sent, 80_000);
}
