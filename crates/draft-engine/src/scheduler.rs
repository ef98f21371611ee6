//! Autosave debounce and the cooperative auto-validation timer

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Quiet period after the last edit before an autosave fires.
pub const AUTOSAVE_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Runs one action after a quiet period, cancelling any pending one.
///
/// At most one task is ever pending: a new `schedule` call aborts the
/// previous timer, so a burst of edits inside the quiet window
/// produces exactly one save.
#[derive(Debug)]
pub struct DebounceScheduler {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl DebounceScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `action` to run after the quiet period, replacing any
    /// previously scheduled action.
    pub fn schedule<F, Fut>(&mut self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action().await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Periodic validation countdown that yields to other work.
///
/// The timer never fires while a validation run is already in flight
/// or the session is outside edit mode, and a manual validation
/// trigger resets the countdown.
#[derive(Debug)]
pub struct AutoValidationTimer {
    interval: Duration,
    deadline: Instant,
    validating: bool,
    editing: bool,
}

impl AutoValidationTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: Instant::now() + interval,
            validating: false,
            editing: true,
        }
    }

    pub fn set_validating(&mut self, validating: bool) {
        self.validating = validating;
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    /// Restart the countdown, as on a manual validation trigger.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    /// True when a periodic validation should run now; rearms itself.
    pub fn should_fire(&mut self) -> bool {
        self.should_fire_at(Instant::now())
    }

    fn reset_at(&mut self, now: Instant) {
        self.deadline = now + self.interval;
    }

    fn should_fire_at(&mut self, now: Instant) -> bool {
        if self.validating || !self.editing || now < self.deadline {
            return false;
        }
        self.reset_at(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn burst_of_edits_runs_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DebounceScheduler::new(Duration::from_millis(500));

        for _ in 0..3 {
            let runs = runs.clone();
            scheduler.schedule(move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        tokio::time::advance(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_action() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DebounceScheduler::new(Duration::from_millis(100));
        {
            let runs = runs.clone();
            scheduler.schedule(move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        scheduler.cancel();

        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_edits_each_save() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DebounceScheduler::new(Duration::from_millis(100));

        for _ in 0..2 {
            let runs = runs.clone();
            scheduler.schedule(move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::advance(Duration::from_millis(200)).await;
            tokio::task::yield_now().await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_waits_for_quiet_and_edit_mode() {
        let start = Instant::now();
        let mut timer = AutoValidationTimer::new(Duration::from_secs(30));

        assert!(!timer.should_fire_at(start + Duration::from_secs(10)));
        assert!(timer.should_fire_at(start + Duration::from_secs(31)));
        // Rearmed: not due again immediately.
        assert!(!timer.should_fire_at(start + Duration::from_secs(32)));

        timer.set_validating(true);
        assert!(!timer.should_fire_at(start + Duration::from_secs(120)));
        timer.set_validating(false);
        timer.set_editing(false);
        assert!(!timer.should_fire_at(start + Duration::from_secs(120)));
        timer.set_editing(true);
        assert!(timer.should_fire_at(start + Duration::from_secs(120)));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_trigger_resets_the_countdown() {
        let start = Instant::now();
        let mut timer = AutoValidationTimer::new(Duration::from_secs(30));
        timer.reset_at(start + Duration::from_secs(25));
        assert!(!timer.should_fire_at(start + Duration::from_secs(31)));
        assert!(timer.should_fire_at(start + Duration::from_secs(56)));
    }
}
