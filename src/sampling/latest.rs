use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Most recent accepted temperature, shared between the sampler (the only
/// writer) and request handlers.
///
/// The `f64` is stored as its bit pattern in one atomic word, so readers get
/// either the old or the new value, never a mix. NaN until the first sample
/// is accepted.
#[derive(Debug, Clone)]
pub struct LatestReading {
    bits: Arc<AtomicU64>,
}

impl Default for LatestReading {
    fn default() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(f64::NAN.to_bits())),
        }
    }
}

impl LatestReading {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, celsius: f64) {
        self.bits.store(celsius.to_bits(), Ordering::Release);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// `None` while nothing has been sampled yet.
    pub fn celsius(&self) -> Option<f64> {
        let value = self.get();
        (!value.is_nan()).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unknown() {
        let latest = LatestReading::new();
        assert!(latest.get().is_nan());
        assert_eq!(latest.celsius(), None);
    }

    #[test]
    fn test_clones_share_value() {
        let latest = LatestReading::new();
        let reader = latest.clone();
        latest.set(21.5);
        assert_eq!(reader.celsius(), Some(21.5));
        latest.set(-3.2);
        assert_eq!(reader.get(), -3.2);
    }

    #[test]
    fn test_concurrent_reads_never_tear() {
        let latest = LatestReading::new();
        let values = [12.3, -45.6];

        let writer = {
            let latest = latest.clone();
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    latest.set(values[i % 2]);
                }
            })
        };

        for _ in 0..10_000 {
            let seen = latest.get();
            assert!(seen.is_nan() || values.contains(&seen), "torn value {seen}");
        }
        writer.join().unwrap();
    }
}
