//! Delivery benchmark suite.
//!
//! Benchmarks the cooperative delivery path at different scales:
//! - Handshake: connect N peers and wait for `open`
//! - Fan-out: one acceptor broadcast to N open peers
//!
//! Run with: cargo bench --bench delivery
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use mock_socket::event::listener;
use mock_socket::{Acceptor, AcceptorOptions, EmitOptions, PeerHandle, Registry};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const URL: &str = "ws://localhost:8080";
const PEER_COUNTS: &[usize] = &[1, 10, 100, 1000];

// ============================================================================
// Benchmark: Handshake
// ============================================================================

fn bench_handshake(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("handshake");

    for &count in PEER_COUNTS {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("connect", count), &count, |b, &count| {
            b.to_async(&rt).iter(|| async move {
                let registry = Registry::new();
                let acceptor = Acceptor::bind(
                    &registry,
                    URL,
                    AcceptorOptions::new().with_mock_global(false),
                )
                .unwrap();

                let peers: Vec<_> = (0..count)
                    .map(|_| PeerHandle::connect(&registry, URL, ()).unwrap())
                    .collect();
                registry.flush().await;

                // Break the registry/acceptor cycle.
                acceptor.stop();
                black_box(peers)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Fan-out
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("fan_out");

    for &count in PEER_COUNTS {
        let (registry, acceptor, received) = rt.block_on(setup_open_peers(count));

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("send", count), &count, |b, _| {
            b.to_async(&rt).iter(|| async {
                acceptor.send(black_box("tick"), EmitOptions::new());
                registry.flush().await;
            });
        });

        black_box(received.load(Ordering::Relaxed));
        acceptor.stop();
    }

    group.finish();
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn setup_open_peers(count: usize) -> (Registry, Acceptor, Arc<AtomicUsize>) {
    let registry = Registry::new();
    let acceptor = Acceptor::bind(
        &registry,
        URL,
        AcceptorOptions::new().with_mock_global(false),
    )
    .unwrap();

    let received = Arc::new(AtomicUsize::new(0));
    for _ in 0..count {
        let peer = PeerHandle::connect(&registry, URL, ()).unwrap();
        let counter = Arc::clone(&received);
        peer.set_on_message(Some(listener(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        })));
    }
    registry.flush().await;

    (registry, acceptor, received)
}

criterion_group!(benches, bench_handshake, bench_fan_out);
criterion_main!(benches);
