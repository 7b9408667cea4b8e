//! Integration tests for [`dispatcher::Dispatcher`] with a recording transport.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dispatcher::{worker_for, Affinity, Dispatcher, DispatcherOptions, StatsSnapshot};
use newsfeed_core::{
    handler_fn, inbound_queue, BotError, Failure, HandlerError, Inbound, Request, Response,
    SharedHandler, Transport,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Transport that records every delivered response and fails deliveries to `fail_chat`.
struct MockTransport {
    inbound: Inbound,
    sent: Mutex<Vec<Response>>,
    fail_chat: Option<String>,
}

impl MockTransport {
    fn new(capacity: usize) -> (mpsc::Sender<Request>, Arc<Self>) {
        let (tx, inbound) = inbound_queue(capacity);
        let transport = Arc::new(Self {
            inbound,
            sent: Mutex::new(Vec::new()),
            fail_chat: None,
        });
        (tx, transport)
    }

    fn failing_for(capacity: usize, chat: &str) -> (mpsc::Sender<Request>, Arc<Self>) {
        let (tx, inbound) = inbound_queue(capacity);
        let transport = Arc::new(Self {
            inbound,
            sent: Mutex::new(Vec::new()),
            fail_chat: Some(chat.to_string()),
        });
        (tx, transport)
    }

    fn sent(&self) -> Vec<Response> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn updates(&self) -> Inbound {
        self.inbound.clone()
    }

    async fn send_message(&self, response: &Response) -> newsfeed_core::Result<()> {
        if self.fail_chat.as_deref() == Some(response.chat_id.as_str()) {
            return Err(BotError::Transport("chat unreachable".to_string()));
        }
        self.sent.lock().unwrap().push(response.clone());
        Ok(())
    }
}

fn counting(calls: Arc<AtomicUsize>) -> SharedHandler {
    handler_fn(move |_ctx, req: Request| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Response::to(&req, req.text.clone())])
        }
    })
}

async fn run_until_closed(dispatcher: &Dispatcher) {
    tokio::time::timeout(Duration::from_secs(10), dispatcher.run(CancellationToken::new()))
        .await
        .expect("dispatcher did not stop after the queue closed")
        .unwrap();
}

/// **Test: K enqueued requests produce exactly K handler invocations.**
///
/// **Setup:** 4 workers, shared queue, 50 requests, sender dropped.
/// **Expected:** 50 calls, 50 deliveries, run returns once the queue is drained.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_request_handled_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, transport) = MockTransport::new(64);
    for i in 0..50 {
        tx.send(Request::new((i % 5).to_string(), format!("msg {}", i)))
            .await
            .unwrap();
    }
    drop(tx);

    let dispatcher = Dispatcher::new(
        counting(calls.clone()),
        transport.clone(),
        DispatcherOptions::new(4),
    );
    run_until_closed(&dispatcher).await;

    assert_eq!(calls.load(Ordering::SeqCst), 50);
    let mut texts: Vec<String> = transport.sent().into_iter().map(|r| r.text).collect();
    texts.sort();
    texts.dedup();
    assert_eq!(texts.len(), 50);
    assert_eq!(
        dispatcher.stats(),
        StatsSnapshot {
            handled: 50,
            failures: 0,
            delivered: 50,
            delivery_failures: 0,
        }
    );
}

/// **Test: a failing handler does not stop the worker and its responses are still delivered.**
#[tokio::test]
async fn test_handler_error_keeps_worker_alive() {
    let handler = handler_fn(|_ctx, req: Request| async move {
        if req.text == "fail" {
            return Err(Failure::with_responses(
                HandlerError::InvalidCommand("fail".to_string()),
                vec![Response::to(&req, "sorry")],
            ));
        }
        Ok(vec![Response::to(&req, "ok")])
    });

    let (tx, transport) = MockTransport::new(8);
    for text in ["ok", "fail", "ok"] {
        tx.send(Request::new("1", text)).await.unwrap();
    }
    drop(tx);

    let dispatcher = Dispatcher::new(handler, transport.clone(), DispatcherOptions::new(1));
    run_until_closed(&dispatcher).await;

    let texts: Vec<String> = transport.sent().into_iter().map(|r| r.text).collect();
    assert_eq!(texts, vec!["ok", "sorry", "ok"]);
    assert_eq!(dispatcher.stats().failures, 1);
}

/// **Test: a failed delivery is skipped and the remaining responses go out in order.**
#[tokio::test]
async fn test_delivery_failure_does_not_abort_batch() {
    let handler = handler_fn(|_ctx, _req| async move {
        Ok(vec![
            Response::new("a", "first"),
            Response::new("down", "lost"),
            Response::new("c", "third"),
        ])
    });

    let (tx, transport) = MockTransport::failing_for(4, "down");
    tx.send(Request::new("1", "go")).await.unwrap();
    drop(tx);

    let dispatcher = Dispatcher::new(handler, transport.clone(), DispatcherOptions::new(2));
    run_until_closed(&dispatcher).await;

    let texts: Vec<String> = transport.sent().into_iter().map(|r| r.text).collect();
    assert_eq!(texts, vec!["first", "third"]);
    let stats = dispatcher.stats();
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.delivery_failures, 1);
}

/// **Test: a panic that escapes the handler chain is contained by the worker.**
#[tokio::test]
async fn test_worker_survives_raw_panic() {
    let handler = handler_fn(|_ctx, req: Request| async move {
        if req.text == "panic" {
            panic!("unguarded");
        }
        Ok(vec![Response::to(&req, "alive")])
    });

    let (tx, transport) = MockTransport::new(4);
    tx.send(Request::new("1", "panic")).await.unwrap();
    tx.send(Request::new("1", "next")).await.unwrap();
    drop(tx);

    let dispatcher = Dispatcher::new(handler, transport.clone(), DispatcherOptions::new(1));
    run_until_closed(&dispatcher).await;

    assert_eq!(transport.sent(), vec![Response::new("1", "alive")]);
    assert_eq!(dispatcher.stats().failures, 1);
}

/// **Test: after cancellation each worker takes at most one further request.**
///
/// **Setup:** 3 workers, 100 queued requests, each taking 20ms.
/// **Action:** Cancel once a few requests have been handled.
/// **Expected:** run returns; handled count grows by at most the worker count after cancel.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancellation_stops_workers() {
    const WORKERS: usize = 3;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handler = handler_fn(move |_ctx, _req| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Vec::new())
        }
    });

    let (tx, transport) = MockTransport::new(128);
    for i in 0..100 {
        tx.send(Request::new("1", i.to_string())).await.unwrap();
    }

    let dispatcher = Arc::new(Dispatcher::new(
        handler,
        transport,
        DispatcherOptions::new(WORKERS),
    ));
    let cancel = CancellationToken::new();
    let running = {
        let dispatcher = dispatcher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { dispatcher.run(cancel).await })
    };

    while calls.load(Ordering::SeqCst) < WORKERS {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let at_cancel = calls.load(Ordering::SeqCst);
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("dispatcher did not stop after cancellation")
        .unwrap()
        .unwrap();

    let total = calls.load(Ordering::SeqCst);
    assert!(total <= at_cancel + WORKERS, "{} > {} + {}", total, at_cancel, WORKERS);
    assert!(total < 100);
    drop(tx);
}

/// **Test: handlers observe dispatcher cancellation through their context.**
#[tokio::test]
async fn test_handler_context_follows_shutdown() {
    let handler = handler_fn(|ctx, req: Request| async move {
        ctx.done().await;
        Ok(vec![Response::to(&req, "stopped")])
    });

    let (tx, transport) = MockTransport::new(4);
    tx.send(Request::new("1", "wait")).await.unwrap();

    let dispatcher = Dispatcher::new(handler, transport.clone(), DispatcherOptions::new(1));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), dispatcher.run(cancel))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(transport.sent(), vec![Response::new("1", "stopped")]);
    drop(tx);
}

/// **Test: per-chat affinity keeps each chat's requests in submission order.**
///
/// **Setup:** 4 workers with chat affinity; 3 chats x 20 interleaved requests; handlers sleep a
/// varying amount so an unordered pool would reorder them.
/// **Expected:** for every chat, handled sequence numbers are strictly increasing.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_chat_affinity_preserves_per_chat_order() {
    let seen: Arc<Mutex<HashMap<String, Vec<u32>>>> = Arc::new(Mutex::new(HashMap::new()));
    let log = seen.clone();
    let handler = handler_fn(move |_ctx, req: Request| {
        let log = log.clone();
        async move {
            let seq: u32 = req.text.parse().unwrap_or_default();
            tokio::time::sleep(Duration::from_millis(u64::from((seq * 7) % 5))).await;
            log.lock()
                .unwrap()
                .entry(req.chat.id.clone())
                .or_default()
                .push(seq);
            Ok(Vec::new())
        }
    });

    let (tx, transport) = MockTransport::new(128);
    for seq in 0..20u32 {
        for chat in ["alpha", "beta", "gamma"] {
            tx.send(Request::new(chat, seq.to_string())).await.unwrap();
        }
    }
    drop(tx);

    let dispatcher = Dispatcher::new(
        handler,
        transport,
        DispatcherOptions::new(4).with_affinity(Affinity::Chat),
    );
    run_until_closed(&dispatcher).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    for (chat, seqs) in seen.iter() {
        let expected: Vec<u32> = (0..20).collect();
        assert_eq!(seqs, &expected, "chat {} out of order", chat);
    }
    assert_eq!(dispatcher.stats().handled, 60);
}

/// **Test: with chat affinity a stalled chat holds up only its own worker.**
///
/// **Setup:** 4 workers, per-worker queue capacity 1. Chat "slow" blocks until released and has
/// 6 requests queued ahead of 8 requests from chats mapped to other workers.
/// **Expected:** all 8 other chats are handled while "slow" is stalled; everything completes
/// once it is released.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_chat_affinity_stalled_chat_does_not_block_others() {
    const WORKERS: usize = 4;
    let release = CancellationToken::new();
    let fast_calls = Arc::new(AtomicUsize::new(0));
    let handler = {
        let release = release.clone();
        let fast_calls = fast_calls.clone();
        handler_fn(move |_ctx, req: Request| {
            let release = release.clone();
            let fast_calls = fast_calls.clone();
            async move {
                if req.chat.id == "slow" {
                    release.cancelled().await;
                } else {
                    fast_calls.fetch_add(1, Ordering::SeqCst);
                }
                Ok(vec![Response::to(&req, req.text.clone())])
            }
        })
    };

    let slow_slot = worker_for("slow", WORKERS);
    let fast: Vec<String> = (0..)
        .map(|i| format!("fast{}", i))
        .filter(|chat| worker_for(chat, WORKERS) != slow_slot)
        .take(8)
        .collect();

    let (tx, transport) = MockTransport::new(64);
    for i in 0..6 {
        tx.send(Request::new("slow", i.to_string())).await.unwrap();
    }
    for chat in &fast {
        tx.send(Request::new(chat.as_str(), "hi")).await.unwrap();
    }
    drop(tx);

    let dispatcher = Arc::new(Dispatcher::new(
        handler,
        transport.clone(),
        DispatcherOptions::new(WORKERS)
            .with_affinity(Affinity::Chat)
            .with_chat_queue_capacity(1),
    ));
    let running = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.run(CancellationToken::new()).await })
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        while fast_calls.load(Ordering::SeqCst) < fast.len() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("other chats were held up by the stalled chat");

    release.cancel();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("dispatcher did not stop after the queue closed")
        .unwrap()
        .unwrap();

    assert_eq!(dispatcher.stats().handled, 14);
    let slow: Vec<String> = transport
        .sent()
        .into_iter()
        .filter(|r| r.chat_id == "slow")
        .map(|r| r.text)
        .collect();
    assert_eq!(slow, vec!["0", "1", "2", "3", "4", "5"]);
}

/// **Test: chat affinity stops on cancellation too.**
#[tokio::test]
async fn test_chat_affinity_cancellation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, transport) = MockTransport::new(4);
    tx.send(Request::new("1", "x")).await.unwrap();

    let dispatcher = Dispatcher::new(
        counting(calls.clone()),
        transport,
        DispatcherOptions::new(2).with_affinity(Affinity::Chat),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), dispatcher.run(cancel))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    drop(tx);
}

#[tokio::test]
async fn test_zero_workers_is_config_error() {
    let (_tx, transport) = MockTransport::new(1);
    let dispatcher = Dispatcher::new(
        counting(Arc::new(AtomicUsize::new(0))),
        transport,
        DispatcherOptions::new(0),
    );
    let err = dispatcher.run(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, BotError::Config(_)));
}
