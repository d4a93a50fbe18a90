use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest period a loop runs at; zero would spin.
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Periodic read-only refresh (dashboard, kitchen display). Stops when
/// `stop` is called or the handle is dropped, so a torn-down view never
/// leaves a timer behind.
pub struct RefreshLoop {
    task: Option<JoinHandle<()>>,
}

impl RefreshLoop {
    /// Run `tick` every `period`, first after one full period. Periods
    /// shorter than `MIN_PERIOD` are raised to it.
    pub fn spawn<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                tick();
            }
        });
        tracing::debug!(?period, "refresh loop started");

        RefreshLoop { task: Some(task) }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("refresh loop stopped");
        }
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
