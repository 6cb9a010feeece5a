use log::{debug, info};
use crate::models::ViewKey;

/// Identifies one arming of the resume timer, a token from an earlier
/// arming no longer resumes anything
pub type ResumeToken = u64;

/// Auto-advancing view selection with manual override
///
/// The cycle only holds state; the owner runs the recurring tick timer and
/// the single resume timer and feeds their expiry back in.
#[derive(Debug)]
pub struct ViewCycle {
    active: ViewKey,
    paused: bool,
    resume_token: ResumeToken,
}

impl Default for ViewCycle {
    fn default() -> Self {
        Self::new(ViewKey::Overview)
    }
}

impl ViewCycle {
    pub fn new(initial: ViewKey) -> Self {
        Self { active: initial, paused: false, resume_token: 0 }
    }

    pub fn active(&self) -> ViewKey {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Recurring timer expiry. Advances to the next view unless paused and
    /// returns the new view when it moved
    pub fn tick(&mut self) -> Option<ViewKey> {
        if self.paused {
            debug!("tick ignored while paused on {}", self.active);
            return None;
        }

        self.active = self.active.next();
        info!("auto cycle to {}", self.active);
        Some(self.active)
    }

    /// Switches to a view picked by the user and pauses cycling. Returns whether
    /// the view changed and the token the resume timer must be armed with, which
    /// supersedes any earlier token
    ///
    /// # Arguments
    ///
    /// * 'view' - the picked view
    pub fn manual_select(&mut self, view: ViewKey) -> (Option<ViewKey>, ResumeToken) {
        let changed = (self.active != view).then_some(view);
        self.active = view;
        self.paused = true;
        self.resume_token += 1;

        info!("manual select of {}, cycling paused", view);
        (changed, self.resume_token)
    }

    /// Resume timer expiry, returns false for a superseded token
    ///
    /// # Arguments
    ///
    /// * 'token' - token the expired timer was armed with
    pub fn resume(&mut self, token: ResumeToken) -> bool {
        if token != self.resume_token || !self.paused {
            return false;
        }

        self.paused = false;
        info!("auto cycle resumed on {}", self.active);
        true
    }
}
