/// Aggregate view of past generation latencies for the stats panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencySummary {
    pub average_ms: f64,
    pub total: usize,
}

impl LatencySummary {
    pub fn average_secs(&self) -> f64 {
        self.average_ms / 1000.0
    }
}

/// `None` when there is nothing to average; the panel is skipped rather than
/// showing a zero.
pub fn summarize(latencies: &[i64]) -> Option<LatencySummary> {
    if latencies.is_empty() {
        return None;
    }
    let sum: i64 = latencies.iter().sum();
    Some(LatencySummary {
        average_ms: sum as f64 / latencies.len() as f64,
        total: latencies.len(),
    })
}
