use std::collections::BTreeSet;
use log::{debug, info};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use crate::models::{Feed, ViewKey};

/// A full snapshot of a feed, tagged with the generation of the subscription set
/// that produced it
///
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub generation: u64,
    pub feed: Feed,
    pub data: Value,
}

/// Where a transport delivers the snapshots of one subscription
///
#[derive(Clone)]
pub struct SnapshotSink {
    generation: u64,
    feed: Feed,
    tx: UnboundedSender<Snapshot>,
}

impl SnapshotSink {
    pub fn new(generation: u64, feed: Feed, tx: UnboundedSender<Snapshot>) -> Self {
        Self { generation, feed, tx }
    }

    /// Delivers a snapshot, returns false once the consumer is gone
    pub fn deliver(&self, data: Value) -> bool {
        self.tx.send(Snapshot { generation: self.generation, feed: self.feed, data }).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A live subscription, unsubscribes when released or dropped
///
pub struct SubscriptionHandle {
    path: String,
    cancel: Option<Box<dyn FnOnce()>>,
}

impl SubscriptionHandle {
    /// Returns a new handle
    ///
    /// # Arguments
    ///
    /// * 'path' - the subscribed path
    /// * 'cancel' - stops the subscription, called exactly once
    pub fn new(path: &str, cancel: impl FnOnce() + 'static) -> Self {
        Self { path: path.to_string(), cancel: Some(Box::new(cancel)) }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            debug!("unsubscribing {}", self.path);
            cancel();
        }
    }
}

/// A push based store that delivers a full snapshot of a path on every change
///
pub trait Transport {
    fn subscribe(&self, path: &str, sink: SnapshotSink) -> SubscriptionHandle;
}

/// Keeps exactly the subscriptions the active view needs
///
pub struct SubscriptionManager<T: Transport> {
    transport: T,
    tx: UnboundedSender<Snapshot>,
    active: Option<ViewKey>,
    generation: u64,
    handles: Vec<SubscriptionHandle>,
}

impl<T: Transport> SubscriptionManager<T> {
    /// Returns a new manager without subscriptions
    ///
    /// # Arguments
    ///
    /// * 'transport' - store to subscribe against
    /// * 'tx' - channel all snapshots are delivered on
    pub fn new(transport: T, tx: UnboundedSender<Snapshot>) -> Self {
        Self { transport, tx, active: None, generation: 0, handles: Vec::new() }
    }

    /// Releases the subscriptions of the previous view and subscribes the feeds of
    /// the given one. Returns the generation snapshots of the new set carry
    ///
    /// # Arguments
    ///
    /// * 'view' - the view that became active
    pub fn activate(&mut self, view: ViewKey) -> u64 {
        self.release();

        self.generation += 1;
        self.active = Some(view);
        self.handles = Feed::for_view(view)
            .into_iter()
            .map(|feed| {
                let sink = SnapshotSink::new(self.generation, feed, self.tx.clone());
                self.transport.subscribe(&feed.path(), sink)
            })
            .collect();

        info!("view {} active with {} subscriptions", view, self.handles.len());
        self.generation
    }

    /// Releases all subscriptions
    pub fn release(&mut self) {
        if !self.handles.is_empty() {
            debug!("releasing {} subscriptions", self.handles.len());
        }
        self.handles.clear();
        self.active = None;
    }

    /// Tells whether a snapshot belongs to the current subscription set
    pub fn is_current(&self, snapshot: &Snapshot) -> bool {
        self.active.is_some() && snapshot.generation == self.generation
    }

    pub fn active_view(&self) -> Option<ViewKey> {
        self.active
    }

    pub fn active_paths(&self) -> BTreeSet<String> {
        self.handles.iter().map(|h| h.path().to_string()).collect()
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;
    use super::fake::FakeTransport;
    use super::*;

    fn expected_paths(view: ViewKey) -> BTreeSet<String> {
        Feed::for_view(view).iter().map(|f| f.path()).collect()
    }

    #[test]
    fn every_transition_leaves_exactly_the_new_views_paths() {
        let (tx, _rx) = unbounded_channel();
        let transport = FakeTransport::default();
        let mut manager = SubscriptionManager::new(transport.clone(), tx);

        let mut previous = ViewKey::Overview;
        manager.activate(previous);
        for view in ViewKey::ALL.iter().rev().chain(ViewKey::ALL.iter()).copied() {
            manager.activate(view);
            assert_eq!(transport.live_paths(), expected_paths(view), "{} -> {}", previous, view);
            assert_eq!(manager.active_paths(), expected_paths(view));
            previous = view;
        }
    }

    #[test]
    fn overview_subscriptions_share_one_lifetime() {
        let (tx, _rx) = unbounded_channel();
        let transport = FakeTransport::default();
        let mut manager = SubscriptionManager::new(transport.clone(), tx);

        manager.activate(ViewKey::Overview);
        assert_eq!(transport.live_paths().len(), 6);

        manager.activate(ViewKey::Water);
        assert_eq!(transport.live_paths(), BTreeSet::from(["cards/WATER".to_string()]));
    }

    #[test]
    fn dropping_the_manager_releases_everything() {
        let (tx, _rx) = unbounded_channel();
        let transport = FakeTransport::default();
        {
            let mut manager = SubscriptionManager::new(transport.clone(), tx);
            manager.activate(ViewKey::Electricity);
            assert_eq!(transport.live_paths().len(), 3);
        }
        assert!(transport.live_paths().is_empty());
    }

    #[test]
    fn stale_snapshots_are_recognized() {
        let (tx, mut rx) = unbounded_channel();
        let transport = FakeTransport::default();
        let mut manager = SubscriptionManager::new(transport.clone(), tx);

        manager.activate(ViewKey::Co2);
        let stale_sink = transport.sink("cards/CO2").unwrap();
        manager.activate(ViewKey::Water);

        assert!(stale_sink.deliver(json!({"card1": {"value": 1}})));
        assert!(transport.push("cards/WATER", json!({"card1": {"value": 2}})));

        let stale = rx.try_recv().unwrap();
        let fresh = rx.try_recv().unwrap();
        assert!(!manager.is_current(&stale));
        assert!(manager.is_current(&fresh));
        assert_eq!(fresh.feed, Feed::Cards(ViewKey::Water));
    }

    #[test]
    fn released_manager_accepts_nothing() {
        let (tx, mut rx) = unbounded_channel();
        let transport = FakeTransport::default();
        let mut manager = SubscriptionManager::new(transport.clone(), tx);

        manager.activate(ViewKey::Water);
        let sink = transport.sink("cards/WATER").unwrap();
        manager.release();

        sink.deliver(Value::Null);
        let snapshot = rx.try_recv().unwrap();
        assert!(!manager.is_current(&snapshot));
        assert_eq!(manager.active_view(), None);
    }
}
