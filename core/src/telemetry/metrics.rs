use std::sync::Mutex;

/// Counters collected while a dataset is synthesized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub runs: usize,
    pub windows: usize,
    pub samples: usize,
    pub errors: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_run(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.runs += 1;
        }
    }

    pub fn record_window(&self, samples: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.windows += 1;
            metrics.samples += samples;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_accumulates_windows_and_errors() {
        let recorder = MetricsRecorder::new();
        recorder.record_run();
        recorder.record_window(128);
        recorder.record_window(128);
        recorder.record_error();
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.runs, 1);
        assert_eq!(snapshot.windows, 2);
        assert_eq!(snapshot.samples, 256);
        assert_eq!(snapshot.errors, 1);
    }
}
