//! Bounded broadcast event bus.
//!
//! Used for Transport position publication, parameter-change fan-out, and
//! output stats. Subscribers are untrusted (the spec calls out WebSocket
//! clients specifically) so the producer never blocks: each subscriber owns
//! a small fixed-capacity ring buffer, and on overflow the oldest queued
//! event is evicted to make room for the new one. This mirrors the
//! teacher's lock-free single-producer/single-consumer split between the
//! audio engine and its UI (`daw-backend::audio::engine::Engine`'s
//! `rtrb::Producer<AudioEvent>`), generalised here to multi-subscriber
//! broadcast since `rtrb` itself is strictly SPSC and cannot fan out.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct Inner<T> {
    capacity: usize,
    queue: Mutex<VecDeque<T>>,
}

pub struct EventBus<T> {
    capacity: usize,
    subscribers: Mutex<Vec<Arc<Inner<T>>>>,
}

#[derive(Clone)]
pub struct EventReceiver<T> {
    inner: Arc<Inner<T>>,
}

impl<T> EventReceiver<T> {
    pub fn try_recv(&self) -> Option<T> {
        self.inner.queue.lock().pop_front()
    }

    pub fn drain(&self) -> Vec<T> {
        self.inner.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> EventReceiver<T> {
        let inner = Arc::new(Inner {
            capacity: self.capacity,
            queue: Mutex::new(VecDeque::with_capacity(self.capacity)),
        });
        self.subscribers.lock().push(inner.clone());
        EventReceiver { inner }
    }

    /// Publish to every live subscriber, evicting the oldest queued event
    /// for any subscriber whose ring is full. Never blocks. Subscribers
    /// whose only handle has been dropped are pruned on the next publish
    /// (strong_count == 1 means only this bus still references them).
    pub fn publish(&self, event: T) {
        let mut subs = self.subscribers.lock();
        subs.retain(|s| Arc::strong_count(s) > 1);
        for sub in subs.iter() {
            let mut q = sub.queue.lock();
            if q.len() >= sub.capacity {
                q.pop_front();
            }
            q.push_back(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_oldest_on_overflow() {
        let bus: EventBus<u32> = EventBus::new(2);
        let rx = bus.subscribe();
        bus.publish(1);
        bus.publish(2);
        bus.publish(3);
        assert_eq!(rx.drain(), vec![2, 3]);
    }

    #[test]
    fn each_subscriber_sees_every_event() {
        let bus: EventBus<u32> = EventBus::new(4);
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(42);
        assert_eq!(a.try_recv(), Some(42));
        assert_eq!(b.try_recv(), Some(42));
    }
}
