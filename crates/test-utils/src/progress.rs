use std::sync::{Arc, Mutex};

use taskflow::{Opts, Stats};

/// Collects every progress snapshot of a run.
#[derive(Debug, Clone, Default)]
pub struct ProgressRecorder {
    snapshots: Arc<Mutex<Vec<Stats>>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach this recorder to `opts`.
    pub fn attach(&self, opts: Opts) -> Opts {
        let snapshots = Arc::clone(&self.snapshots);
        opts.with_progress_reporter(move |stats| snapshots.lock().unwrap().push(stats))
    }

    /// Fresh options with only this recorder attached.
    pub fn opts(&self) -> Opts {
        self.attach(Opts::new())
    }

    pub fn snapshots(&self) -> Vec<Stats> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn last(&self) -> Stats {
        self.snapshots
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no progress snapshot recorded")
    }

    /// Panics unless every snapshot partitions `all` and progress never
    /// goes down.
    pub fn assert_consistent(&self) {
        let mut last_percent = 0;
        for (idx, s) in self.snapshots().iter().enumerate() {
            let sets = [&s.succeeded, &s.failed, &s.running, &s.pending];
            let total: usize = sets.iter().map(|set| set.len()).sum();
            assert_eq!(total, s.all.len(), "snapshot {idx} does not partition all: {s:?}");

            for (i, a) in sets.iter().enumerate() {
                assert!(a.difference(&s.all).is_empty(), "snapshot {idx} has unknown ids: {s:?}");
                for b in sets.iter().skip(i + 1) {
                    assert!(a.is_disjoint(b), "snapshot {idx} overlaps: {s:?}");
                }
            }

            let percent = s.progress_percent();
            assert!(percent >= last_percent, "progress went down at snapshot {idx}");
            last_percent = percent;
        }
    }
}
