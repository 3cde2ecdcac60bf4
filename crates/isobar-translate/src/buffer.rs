//! Event serialization.
//!
//! Ingestion callbacks may fire concurrently from any number of producer
//! tasks; the buffer funnels them onto one bounded channel consumed by a
//! single task, so the handler downstream never needs internal locking.

use isobar_api::Object;
use isobar_core::WorkerGroup;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 128;

/// The consumer-side contract: the translator implements this.
pub trait EventHandler: Send + 'static {
    /// An object was created.
    fn on_add(&mut self, obj: Object);
    /// An object was replaced.
    fn on_update(&mut self, old: Object, new: Object);
    /// An object was removed.
    fn on_delete(&mut self, obj: Object);
}

enum Event {
    Add(Object),
    Update(Object, Object),
    Delete(Object),
}

/// The producer half of the event pipeline.
///
/// Enqueueing never drops an event: when the channel is full the send logs
/// one diagnostic for the overflow episode and then waits for capacity,
/// applying backpressure to the caller.
#[derive(Clone)]
pub struct Buffer {
    tx: mpsc::Sender<Event>,
}

impl Buffer {
    /// Create a buffer of the given capacity and register its consumer on
    /// the worker group.
    ///
    /// With `drain` set, events already queued at shutdown are delivered
    /// before the consumer returns; otherwise it exits immediately.
    pub fn new<H>(group: &mut WorkerGroup, handler: H, capacity: usize, drain: bool) -> Self
    where
        H: EventHandler,
    {
        let (tx, rx) = mpsc::channel(capacity);
        group.add(move |stop| consume(rx, handler, stop, drain));
        Self { tx }
    }

    /// Enqueue an add event.
    pub async fn on_add(&self, obj: Object) {
        self.send(Event::Add(obj)).await;
    }

    /// Enqueue an update event.
    pub async fn on_update(&self, old: Object, new: Object) {
        self.send(Event::Update(old, new)).await;
    }

    /// Enqueue a delete event.
    pub async fn on_delete(&self, obj: Object) {
        self.send(Event::Delete(obj)).await;
    }

    async fn send(&self, event: Event) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(
                    capacity = self.tx.max_capacity(),
                    "event channel is full, waiting for the consumer"
                );
                if self.tx.send(event).await.is_err() {
                    warn!("event channel closed, discarding event");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("event channel closed, discarding event");
            }
        }
    }
}

async fn consume<H>(
    mut rx: mpsc::Receiver<Event>,
    mut handler: H,
    mut stop: watch::Receiver<bool>,
    drain: bool,
) -> isobar_core::Result<()>
where
    H: EventHandler,
{
    debug!("event buffer started");
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => dispatch(&mut handler, event),
                None => break,
            },
            _ = stop.changed() => {
                if drain {
                    while let Ok(event) = rx.try_recv() {
                        dispatch(&mut handler, event);
                    }
                }
                break;
            }
        }
    }
    debug!("event buffer stopped");
    Ok(())
}

fn dispatch<H: EventHandler>(handler: &mut H, event: Event) {
    match event {
        Event::Add(obj) => handler.on_add(obj),
        Event::Update(old, new) => handler.on_update(old, new),
        Event::Delete(obj) => handler.on_delete(obj),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isobar_api::{ObjectMeta, Secret};
    use std::sync::{Arc, Mutex};

    // records the order events arrive in
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl EventHandler for Recorder {
        fn on_add(&mut self, obj: Object) {
            self.0.lock().unwrap().push(format!("add {}", obj.meta().name));
        }

        fn on_update(&mut self, _old: Object, new: Object) {
            self.0
                .lock()
                .unwrap()
                .push(format!("update {}", new.meta().name));
        }

        fn on_delete(&mut self, obj: Object) {
            self.0
                .lock()
                .unwrap()
                .push(format!("delete {}", obj.meta().name));
        }
    }

    fn secret(name: &str) -> Object {
        Object::Secret(Arc::new(Secret {
            meta: ObjectMeta::new("default", name),
            data: Default::default(),
        }))
    }

    #[tokio::test]
    async fn events_are_delivered_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut group = WorkerGroup::new();
        let buffer = Buffer::new(&mut group, Recorder(Arc::clone(&log)), 16, true);

        buffer.on_add(secret("a")).await;
        buffer.on_update(secret("a"), secret("a")).await;
        buffer.on_delete(secret("a")).await;
        drop(buffer);

        group.run().await.unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["add a", "update a", "delete a"]
        );
    }

    #[tokio::test]
    async fn full_channel_applies_backpressure_without_loss() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut group = WorkerGroup::new();
        // capacity 1 forces the overflow path on the second send
        let buffer = Buffer::new(&mut group, Recorder(Arc::clone(&log)), 1, true);
        let running = tokio::spawn(group.run());

        for i in 0..8 {
            buffer.on_add(secret(&i.to_string())).await;
        }
        drop(buffer);

        running.await.unwrap().unwrap();
        assert_eq!(log.lock().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn consumer_exits_on_stop_without_drain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut group = WorkerGroup::new();
        let buffer = Buffer::new(&mut group, Recorder(Arc::clone(&log)), 16, false);
        // a second task that returns immediately stops the group
        group.add(|_stop| async move { Ok(()) });

        buffer.on_add(secret("late")).await;
        group.run().await.unwrap();
        // no assertion on delivery of "late": the consumer may exit first;
        // the test asserts the consumer does terminate
    }
}
