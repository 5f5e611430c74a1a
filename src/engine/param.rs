//! Automatable node parameter with a set-value timeline.

/// Scalar parameter that can be written now or scheduled for later
#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f32,
    /// Pending `(time_s, value)` events, sorted by time
    events: Vec<(f64, f32)>,
}

impl AudioParam {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            events: Vec::new(),
        }
    }

    /// Value currently in effect
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Overwrite the value immediately, dropping anything scheduled
    pub fn set_value(&mut self, value: f32) {
        self.events.clear();
        self.value = value;
    }

    /// Schedule a jump to `value` at `time_s`.
    ///
    /// An event at the same time as an existing one replaces it.
    pub fn set_value_at_time(&mut self, value: f32, time_s: f64) {
        match self.events.iter().position(|&(t, _)| t >= time_s) {
            Some(i) if self.events[i].0 == time_s => self.events[i].1 = value,
            Some(i) => self.events.insert(i, (time_s, value)),
            None => self.events.push((time_s, value)),
        }
    }

    /// Apply every event due at or before `now_s`. Returns true if the value changed.
    pub fn advance(&mut self, now_s: f64) -> bool {
        let due = self.events.partition_point(|&(t, _)| t <= now_s);
        if due == 0 {
            return false;
        }
        let previous = self.value;
        self.value = self.events[due - 1].1;
        self.events.drain(..due);
        previous.to_bits() != self.value.to_bits()
    }
}
