/// `(id, status)` pair for one casualty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CasualtyStatus {
    pub id: u32,
    pub status: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CasualtyLayer {
    pub entries: Vec<CasualtyStatus>,
}

/// Behavioural channels for one trainee. Pose channels are time-ordered samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraineeChannels {
    pub trainee_id: u32,
    pub communicating: bool,
    pub watched_objects: Vec<u32>,
    pub watched_regions: Vec<u32>,
    pub head: Vec<f64>,
    pub hand: Vec<f64>,
    pub foot: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TraineeLayer {
    pub trainees: Vec<TraineeChannels>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timer {
    pub elapsed_ms: u64,
    pub casualty_layer: CasualtyLayer,
    pub trainee_layer: TraineeLayer,
}

/// Batch of timer records with a declared, advisory size.
#[derive(Clone, Debug, PartialEq)]
pub struct TimerBatch {
    pub timestamp: u64,
    pub data_size: u32,
    pub timers: Vec<Timer>,
}

/// Declared batch size disagrees with the number of timers carried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeDiscrepancy {
    pub declared: u32,
    pub actual: usize,
}

impl TimerBatch {
    /// Builds a batch whose declared size matches its contents. The declared
    /// size saturates at `u32::MAX`; a larger batch then reports a discrepancy.
    pub fn new(timestamp: u64, timers: Vec<Timer>) -> Self {
        Self {
            timestamp,
            data_size: declared_size(timers.len()),
            timers,
        }
    }

    pub fn size_discrepancy(&self) -> Option<SizeDiscrepancy> {
        (self.data_size as usize != self.timers.len()).then_some(SizeDiscrepancy {
            declared: self.data_size,
            actual: self.timers.len(),
        })
    }
}

fn declared_size(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrepancy_is_reported_not_fixed() {
        let mut batch = TimerBatch::new(10, vec![Timer::default(), Timer::default()]);
        assert_eq!(batch.size_discrepancy(), None);
        batch.data_size = 5;
        assert_eq!(
            batch.size_discrepancy(),
            Some(SizeDiscrepancy {
                declared: 5,
                actual: 2
            })
        );
        assert_eq!(batch.timers.len(), 2);
    }

    #[test]
    fn declared_size_saturates() {
        assert_eq!(declared_size(3), 3);
        assert_eq!(declared_size(u32::MAX as usize), u32::MAX);
        assert_eq!(declared_size(usize::MAX), u32::MAX);
    }
}
