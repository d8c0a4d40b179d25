use std::collections::VecDeque;

use criterion::{BatchSize, Criterion, Throughput};
use heapless::{String as HString, Vec as HVec};
use mqtt_node::mqtt::{ConnectionConfig, Supervisor, SupervisorConfig};
use mqtt_node::network::prelude::*;
use mqtt_node::network::{ClientState, ConnectOptions, PublishPacket};

/// In-memory session; the benchmark fills `inbox` directly.
#[derive(Default)]
struct Loopback {
    connected: bool,
    inbox: VecDeque<PublishPacket>,
}

impl Transport for Loopback {
    type Error = ();

    fn connect(&mut self, _options: &ConnectOptions<'_>) -> Result<(), ()> {
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn state(&self) -> ClientState {
        if self.connected {
            ClientState::Connected
        } else {
            ClientState::Disconnected
        }
    }

    fn publish(&mut self, _topic: &str, _payload: &[u8], _retain: bool) -> Result<(), ()> {
        Ok(())
    }

    fn subscribe(&mut self, _filter: &str) -> Result<(), ()> {
        Ok(())
    }

    fn unsubscribe(&mut self, _filter: &str) -> Result<(), ()> {
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<PublishPacket>, ()> {
        Ok(self.inbox.pop_front())
    }
}

struct Board;

impl Platform for Board {
    fn uptime_ms(&self) -> u64 {
        0
    }

    fn hardware_id(&self) -> u32 {
        0x00c0_ffee
    }

    fn restart(&mut self) {}
}

fn ignore(_device: &str, _action: &str, _payload: &str) {}

fn setup_node() -> Supervisor<Loopback, Board> {
    let connection = ConnectionConfig::new("broker.local").expect("Failed to build config");
    let mut node = Supervisor::new(
        Loopback::default(),
        Board,
        connection,
        SupervisorConfig::default(),
    );
    node.set_handler(ignore);
    node.set_topic("bench").expect("Failed to set topic");
    node.poll().expect("Failed to connect");
    node
}

fn packet(topic: &str, payload: &[u8]) -> PublishPacket {
    PublishPacket {
        topic: HString::try_from(topic).expect("Topic too long"),
        payload: HVec::from_slice(payload).expect("Payload too long"),
    }
}

pub fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("supervisor_publish");
    let payload = b"21.5";
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("publish", |b| {
        b.iter_batched_ref(
            setup_node,
            |node| {
                node.publish("temperature", payload, true)
                    .expect("Failed to publish");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_poll_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("supervisor_poll");
    let payload = b"ON";
    group.throughput(Throughput::Elements(16));
    group.bench_function("poll_drain_16", |b| {
        b.iter_batched_ref(
            || {
                let mut node = setup_node();
                for _ in 0..16 {
                    node.transport_mut()
                        .inbox
                        .push_back(packet("cmnd/bench/relay/set", payload));
                }
                node
            },
            |node| {
                let _ = node.poll().expect("Failed to poll");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
