use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: String },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskAdvance { completed: u64, total_steps: u64 },
    TaskFinish,

    Message(String),
}

impl Progress {
    pub fn fraction(&self) -> Option<f64> {
        match *self {
            Progress::TaskAdvance {
                completed,
                total_steps,
            } if total_steps > 0 => Some(completed as f64 / total_steps as f64),
            _ => None,
        }
    }
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

/// Counts completed steps and forwards at most one update per percent.
#[derive(Debug)]
pub struct ProgressThrottle {
    total: u64,
    stride: u64,
    completed: AtomicU64,
}

impl ProgressThrottle {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            stride: total.div_ceil(100).max(1),
            completed: AtomicU64::new(0),
        }
    }

    /// Records one finished step; safe to call from several threads.
    pub fn advance(&self, reporter: &ProgressReporter) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if completed % self.stride == 0 || completed == self.total {
            reporter.report(Progress::TaskAdvance {
                completed,
                total_steps: self.total,
            });
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn throttle_reports_at_most_once_per_percent() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            events.lock().unwrap().push(p);
        }));
        let throttle = ProgressThrottle::new(1000);
        for _ in 0..1000 {
            throttle.advance(&reporter);
        }
        drop(reporter);
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 100);
        assert_eq!(events.last().and_then(Progress::fraction), Some(1.0));
    }

    #[test]
    fn throttle_always_reports_the_final_step() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            events.lock().unwrap().push(p);
        }));
        let throttle = ProgressThrottle::new(7);
        for _ in 0..7 {
            throttle.advance(&reporter);
        }
        assert_eq!(throttle.completed(), 7);
        drop(reporter);
        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 7);
        assert_eq!(
            events.last(),
            Some(&Progress::TaskAdvance {
                completed: 7,
                total_steps: 7
            })
        );
    }

    #[test]
    fn reporter_without_callback_is_silent() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn fraction_is_only_defined_for_task_advance() {
        assert_eq!(Progress::TaskStart { total_steps: 4 }.fraction(), None);
        assert_eq!(
            Progress::TaskAdvance {
                completed: 1,
                total_steps: 4
            }
            .fraction(),
            Some(0.25)
        );
    }
}
