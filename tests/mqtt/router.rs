use std::cell::RefCell;

use mqtt_node::mqtt::{Dispatch, MessageHandler, Router, TopicSet};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Default)]
struct Recorder {
    messages: Vec<(String, String, String)>,
}

impl MessageHandler for Recorder {
    fn on_message(&mut self, device: &str, action: &str, payload: &str) {
        self.messages
            .push((device.to_string(), action.to_string(), payload.to_string()));
    }
}

fn router(topic: &str) -> Router<Recorder> {
    Router::new(TopicSet::new(topic).unwrap()).with_handler(Recorder::default())
}

fn word(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..12);
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[test]
fn test_dispatch_device_action_payload() {
    let mut router = router("device1");

    assert_eq!(router.dispatch("cmnd/device1/relay/set", b"ON"), Dispatch::Delivered);
    assert_eq!(
        router.handler_mut().unwrap().messages,
        vec![("relay".to_string(), "set".to_string(), "ON".to_string())]
    );
}

#[test]
fn test_dispatch_outcomes() {
    let mut router = router("device1");

    assert_eq!(router.dispatch("cmnd/device1/relay/set", b""), Dispatch::EmptyPayload);
    assert_eq!(router.dispatch("cmnd/device2/relay/set", b"ON"), Dispatch::Unrouted);
    assert_eq!(router.dispatch("stat/device1/relay", b"ON"), Dispatch::Unrouted);
    assert_eq!(router.dispatch("cmnd/device10/set", b"ON"), Dispatch::Unrouted);
    assert_eq!(
        router.dispatch("cmnd/device1/relay/set", &[0xff, 0xfe]),
        Dispatch::InvalidPayload
    );
    assert!(router.handler_mut().unwrap().messages.is_empty());

    let mut bare = Router::new(TopicSet::new("device1").unwrap());
    assert_eq!(bare.dispatch("cmnd/device1/relay/set", b"ON"), Dispatch::NoHandler);
}

#[test]
fn test_dispatch_without_topic() {
    let mut router = Router::new(TopicSet::default()).with_handler(Recorder::default());

    assert_eq!(router.dispatch("anything/goes/here", b"1"), Dispatch::Delivered);
    assert_eq!(router.dispatch("single", b"2"), Dispatch::Delivered);
    assert_eq!(
        router.handler_mut().unwrap().messages,
        vec![
            ("anything/goes".to_string(), "here".to_string(), "1".to_string()),
            (String::new(), "single".to_string(), "2".to_string()),
        ]
    );
}

#[test]
fn test_retopic_changes_routing() {
    let mut router = router("device1");
    router.set_topics(TopicSet::new("device2").unwrap());

    assert_eq!(router.dispatch("cmnd/device1/relay/set", b"ON"), Dispatch::Unrouted);
    assert_eq!(router.dispatch("cmnd/device2/relay/set", b"ON"), Dispatch::Delivered);
    assert_eq!(router.topics().command_filter(), "cmnd/device2/#");
}

#[test]
fn test_closure_handler_counts() {
    let count = RefCell::new(0);
    let mut router = Router::new(TopicSet::new("node").unwrap()).with_handler(
        |_device: &str, _action: &str, _payload: &str| {
            *count.borrow_mut() += 1;
        },
    );

    router.dispatch("cmnd/node/a/b", b"x");
    router.dispatch("cmnd/node/b", b"x");
    router.dispatch("cmnd/other/b", b"x");
    drop(router);

    assert_eq!(*count.borrow(), 2);
}

#[test]
fn test_random_device_paths() {
    let mut rng = StdRng::seed_from_u64(0x6d71_7474);

    for _ in 0..200 {
        let base = word(&mut rng);
        let depth = rng.gen_range(0..4);
        let segments: Vec<String> = (0..depth).map(|_| word(&mut rng)).collect();
        let device = segments.join("/");
        let action = word(&mut rng);
        let payload = word(&mut rng);

        let topic = if device.is_empty() {
            format!("cmnd/{base}/{action}")
        } else {
            format!("cmnd/{base}/{device}/{action}")
        };

        let mut router = router(&base);
        assert_eq!(router.dispatch(&topic, payload.as_bytes()), Dispatch::Delivered);
        assert_eq!(
            router.handler_mut().unwrap().messages,
            vec![(device, action, payload)],
            "topic {topic}"
        );
    }
}
