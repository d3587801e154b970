//! Producer interception through the running application.

#[path = "../support/mod.rs"]
mod support;
mod notifications;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use notifications::{
    Notifications, Order, OrderIntake, Plain, PlainSender, RecordingNotifications,
};
use smooth_events::{
    BindError, ComponentMetadata, Error, EventApplication, EventClient, InMemoryTransport,
    Instance, MethodMetadata, ParamMetadata,
};
use support::{init_tracing, wait_until, TIMEOUT};

fn order() -> Order {
    Order {
        id: 7,
        item: "coffee".into(),
    }
}

#[test]
fn producer_call_publishes_once_without_running_the_body() {
    init_tracing();
    let transport = InMemoryTransport::new();
    let real = Arc::new(RecordingNotifications::default());
    let context = EventApplication::builder(transport.clone())
        .component::<dyn Notifications>(real.clone())
        .build()
        .run()
        .unwrap();

    let notifications = context.resolve::<dyn Notifications>().unwrap();
    notifications.notify(&order());

    let sent = transport.find_all_by_topic("orders/notified");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload_str(), Some(r#"{"id":7,"item":"coffee"}"#));
    assert_eq!(real.body_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unsized_payloads_are_published_as_is() {
    let transport = InMemoryTransport::new();
    let real = Arc::new(RecordingNotifications::default());
    let context = EventApplication::builder(transport.clone())
        .component::<dyn Notifications>(real.clone())
        .build()
        .run()
        .unwrap();

    context.resolve::<dyn Notifications>().unwrap().alert("low stock");

    let sent = transport.find_all_by_topic("alerts");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload_str(), Some(r#""low stock""#));
    assert_eq!(real.body_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn other_methods_reach_the_real_implementation() {
    let transport = InMemoryTransport::new();
    let context = EventApplication::builder(transport.clone())
        .component::<dyn Notifications>(Arc::new(RecordingNotifications::default()))
        .build()
        .run()
        .unwrap();

    let notifications = context.resolve::<dyn Notifications>().unwrap();
    assert_eq!(notifications.channel(), "email");
    assert!(transport.published().is_empty());
}

#[test]
fn controller_dependencies_receive_the_proxy() {
    init_tracing();
    let transport = InMemoryTransport::new();
    let real = Arc::new(RecordingNotifications::default());
    let context = EventApplication::builder(transport.clone())
        .component::<dyn Notifications>(real.clone())
        .component_with::<OrderIntake, _>(|container| {
            Ok(Arc::new(OrderIntake {
                notifications: container.resolve::<dyn Notifications>()?,
            }))
        })
        .build()
        .run()
        .unwrap();

    context.client().emit("orders/place", &order()).unwrap();

    assert!(wait_until(TIMEOUT, || {
        transport.find_all_by_topic("orders/notified").len() == 1
    }));
    assert_eq!(real.body_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn intercepted_publishers_can_be_consumed_by_application_code() {
    let transport = InMemoryTransport::new();
    let context = EventApplication::builder(transport.clone())
        .component::<dyn Notifications>(Arc::new(RecordingNotifications::default()))
        .build()
        .run()
        .unwrap();

    let received = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let client: Arc<EventClient> = context.resolve::<EventClient>().unwrap();
    client
        .subscribe("orders/notified", move |order: Order| {
            sink.lock().unwrap().push(order);
        })
        .unwrap();

    context.resolve::<dyn Notifications>().unwrap().notify(&order());

    assert!(wait_until(TIMEOUT, || received.lock().unwrap().len() == 1));
    assert_eq!(received.lock().unwrap()[0], order());
}

#[test]
fn publisher_without_interceptor_fails_startup() {
    let transport = InMemoryTransport::new();
    let metadata = ComponentMetadata::publisher::<dyn Plain>().method(
        MethodMetadata::new("send")
            .produces("plain")
            .param(ParamMetadata::value::<u32>("value")),
    );

    let result = EventApplication::builder(transport.clone())
        .register(metadata, |_| Ok(Instance::new::<dyn Plain>(Arc::new(PlainSender))))
        .build()
        .run();

    match result {
        Err(Error::Bind(BindError::NonInterceptable { component })) => {
            assert_eq!(component.short_name(), "Plain");
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("startup should fail"),
    }
    assert!(transport.published().is_empty());
}
