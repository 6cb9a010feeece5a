use std::fmt;
use std::fmt::Formatter;
use std::time::Duration;
use log::debug;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;
use crate::models::ViewKey;

const CUE_CAPACITY: usize = 16;

/// Highlight state of one displayed value
///
#[derive(Clone, Debug)]
pub struct ValuePulse<V> {
    last: Option<V>,
    active_until: Option<Instant>,
}

impl<V> Default for ValuePulse<V> {
    fn default() -> Self {
        Self { last: None, active_until: None }
    }
}

impl<V: PartialEq + Clone> ValuePulse<V> {
    /// Observes the value being rendered. Returns true when it differs from the
    /// previous one, which (re)starts the highlight for 'duration'
    ///
    /// # Arguments
    ///
    /// * 'value' - value about to be rendered
    /// * 'now' - current instant
    /// * 'duration' - how long the highlight lasts
    pub fn observe(&mut self, value: &V, now: Instant, duration: Duration) -> bool {
        match &self.last {
            None => {
                self.last = Some(value.clone());
                false
            }
            Some(last) if last == value => false,
            Some(_) => {
                self.last = Some(value.clone());
                self.active_until = Some(now + duration);
                true
            }
        }
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.active_until.is_some_and(|until| now < until)
    }

    /// Drops an expired highlight, the observed value stays as baseline
    pub fn expire(&mut self, now: Instant) {
        if !self.is_active(now) {
            self.active_until = None;
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.active_until
    }
}

/// Highlights for a row of cards, indexed by display position
///
#[derive(Debug)]
pub struct PulseBoard<V> {
    pulses: Vec<ValuePulse<V>>,
}

impl<V> Default for PulseBoard<V> {
    fn default() -> Self {
        Self { pulses: Vec::new() }
    }
}

impl<V: PartialEq + Clone> PulseBoard<V> {
    /// Observes a full row of values, returns the positions that started a highlight
    pub fn observe_all(&mut self, values: &[V], now: Instant, duration: Duration) -> Vec<usize> {
        self.pulses.resize_with(values.len(), ValuePulse::default);
        self.pulses.iter_mut()
            .zip(values)
            .enumerate()
            .filter_map(|(i, (pulse, value))| pulse.observe(value, now, duration).then_some(i))
            .collect()
    }

    pub fn active_flags(&self, now: Instant) -> Vec<bool> {
        self.pulses.iter().map(|p| p.is_active(now)).collect()
    }

    pub fn expire(&mut self, now: Instant) {
        self.pulses.iter_mut().for_each(|p| p.expire(now));
    }

    /// Earliest pending highlight end
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pulses.iter().filter_map(|p| p.deadline()).min()
    }

    /// Forgets all baselines, e.g. when a different view's cards take over
    pub fn reset(&mut self) {
        self.pulses.clear();
    }
}

#[derive(Debug)]
pub struct CueError(pub String);
impl fmt::Display for CueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CueError: {}", self.0)
    }
}

/// A cue sent to whoever renders the dashboard, one per changed card value
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CueEvent {
    pub view: ViewKey,
    pub title: String,
}

/// The alert cue channel, created on first use and closed on teardown
///
#[derive(Default)]
pub struct AlertCue {
    sender: Option<broadcast::Sender<CueEvent>>,
    closed: bool,
}

impl AlertCue {
    /// Returns the sender, creating it on first use
    pub fn sender(&mut self) -> Option<broadcast::Sender<CueEvent>> {
        if self.closed {
            return None;
        }
        Some(self.sender.get_or_insert_with(|| broadcast::channel(CUE_CAPACITY).0).clone())
    }

    /// Plays the cue once, fails when nobody is listening
    ///
    /// # Arguments
    ///
    /// * 'event' - the cue
    pub fn play(&mut self, event: CueEvent) -> Result<(), CueError> {
        let sender = self.sender().ok_or(CueError("cue channel closed".to_string()))?;
        sender.send(event)
            .map(|listeners| debug!("cue played to {} listeners", listeners))
            .map_err(|_| CueError("no listener for cue".to_string()))
    }

    /// Closes the channel, later plays fail
    pub fn close(&mut self) {
        self.sender = None;
        self.closed = true;
    }
}
