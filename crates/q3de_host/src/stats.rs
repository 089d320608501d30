//! Commit latency statistics for buffer and horizon sizing.
//!
//! Latencies are measured in decoder cycles: the distance between the decode
//! horizon at commit time and the detection cycle of the older participant.

const BUCKETS: usize = 20;

/// Tracks latency statistics with minimal overhead.
///
/// Accumulates commit latencies and computes min, max, average and a
/// one-cycle-wide histogram. Statistics from parallel workers are combined
/// with [`merge`](Self::merge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyStats {
    pub min: u64,
    pub max: u64,
    pub sum: u64,
    pub count: u64,
    pub buckets: [u64; BUCKETS],
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyStats {
    pub fn new() -> Self {
        Self {
            min: u64::MAX,
            max: 0,
            sum: 0,
            count: 0,
            buckets: [0; BUCKETS],
        }
    }

    /// Records a latency in cycles. The last bucket collects everything beyond it.
    pub fn update(&mut self, cycles: u64) {
        self.min = self.min.min(cycles);
        self.max = self.max.max(cycles);
        self.sum += cycles;
        self.count += 1;

        let idx = cycles.min(BUCKETS as u64 - 1) as usize;
        self.buckets[idx] += 1;
    }

    pub fn merge(mut self, other: &Self) -> Self {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
        for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets.iter()) {
            *mine += theirs;
        }
        self
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    /// Smallest latency that at least `fraction` of the commits stay within.
    ///
    /// Resolution is one cycle up to the last bucket; beyond it the maximum
    /// is reported.
    pub fn quantile(&self, fraction: f64) -> u64 {
        if self.count == 0 {
            return 0;
        }
        let target = (fraction.clamp(0.0, 1.0) * self.count as f64).ceil() as u64;
        let mut seen = 0;
        for (cycles, &count) in self.buckets.iter().enumerate().take(BUCKETS - 1) {
            seen += count;
            if seen >= target {
                return cycles as u64;
            }
        }
        self.max
    }

    pub fn print_report(&self) {
        println!("\nCommit Latency (cycles)");
        println!("Count: {}", self.count);
        if self.count == 0 {
            return;
        }
        println!("Min:   {}", self.min);
        println!("Avg:   {:.2}", self.avg());
        println!("Max:   {}", self.max);
        println!("p99:   {}", self.quantile(0.99));

        println!("Distribution (1-cycle buckets):");
        for (i, &count) in self.buckets.iter().enumerate() {
            if count > 0 {
                let open = if i == BUCKETS - 1 { "+" } else { " " };
                println!("[{:3}{}]: {}", i, open, count);
            }
        }
    }
}
