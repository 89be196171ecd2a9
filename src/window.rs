use std::collections::VecDeque;

use crate::constants::WINDOW_CAPACITY;
use crate::sample::Sample;

/// Arrival-ordered, fixed-capacity history of the most recent samples.
///
/// Eviction is strict FIFO by arrival: a late sample carrying an old
/// timestamp still pushes out the head, and nothing is ever re-sorted.
#[derive(Debug)]
pub struct WindowBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl WindowBuffer {
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append at the tail, evicting at most one sample from the head.
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            return self.samples.pop_front();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Sample with the highest reading; the earliest arrival wins ties.
    pub fn peak(&self) -> Option<&Sample> {
        self.samples.iter().fold(None, |best: Option<&Sample>, s| match best {
            Some(b) if b.memory_kb >= s.memory_kb => Some(b),
            _ => Some(s),
        })
    }

    /// Mean over the current window, summed fresh so evicted samples
    /// leave no trace.
    pub fn average_kb(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f64 = self.samples.iter().map(|s| s.memory_kb).sum();
        Some(total / self.samples.len() as f64)
    }

    /// Plot points in arrival order.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(Sample::point).collect()
    }
}

impl Default for WindowBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> Sample {
        Sample::new(1000.0 + i as f64, (i * 10) as f64)
    }

    #[test]
    fn length_is_min_of_pushes_and_capacity() {
        let mut window = WindowBuffer::new();
        for i in 1..=300 {
            window.push(sample(i));
            assert!(window.len() <= WINDOW_CAPACITY);
            assert_eq!(window.len(), i.min(WINDOW_CAPACITY));
        }
    }

    #[test]
    fn evicts_oldest_arrival_first() {
        let mut window = WindowBuffer::new();
        for i in 1..=120 {
            assert_eq!(window.push(sample(i)), None);
        }
        assert_eq!(window.push(sample(121)), Some(sample(1)));

        let kept: Vec<Sample> = window.iter().copied().collect();
        let expected: Vec<Sample> = (2..=121).map(sample).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn keeps_arrival_order_for_out_of_order_timestamps() {
        let mut window = WindowBuffer::new();
        for ts in [10.0, 5.0, 20.0] {
            window.push(Sample::new(ts, 1.0));
        }
        let order: Vec<f64> = window.iter().map(|s| s.timestamp).collect();
        assert_eq!(order, vec![10.0, 5.0, 20.0]);
    }

    #[test]
    fn late_old_sample_still_evicts_by_arrival() {
        let mut window = WindowBuffer::with_capacity(2);
        window.push(Sample::new(100.0, 1.0));
        window.push(Sample::new(200.0, 2.0));
        let evicted = window.push(Sample::new(50.0, 3.0));
        assert_eq!(evicted, Some(Sample::new(100.0, 1.0)));
        let order: Vec<f64> = window.iter().map(|s| s.timestamp).collect();
        assert_eq!(order, vec![200.0, 50.0]);
    }

    #[test]
    fn stats_track_the_window() {
        let mut window = WindowBuffer::with_capacity(3);
        assert!(window.peak().is_none());
        assert!(window.average_kb().is_none());

        for (ts, kb) in [(1.0, 900.0), (2.0, 300.0), (3.0, 600.0)] {
            window.push(Sample::new(ts, kb));
        }
        assert_eq!(window.peak().map(|s| s.timestamp), Some(1.0));
        assert_eq!(window.average_kb(), Some(600.0));

        // the old peak falls out of the window
        window.push(Sample::new(4.0, 0.0));
        assert_eq!(window.peak().map(|s| s.timestamp), Some(3.0));
        assert_eq!(window.average_kb(), Some(300.0));
        assert_eq!(window.latest(), Some(&Sample::new(4.0, 0.0)));
    }

    #[test]
    fn average_recovers_after_extreme_sample_is_evicted() {
        let mut window = WindowBuffer::with_capacity(2);
        window.push(Sample::new(1.0, 1.7e308));
        window.push(Sample::new(2.0, 1.7e308));
        for ts in 3..=6 {
            window.push(Sample::new(ts as f64, 100.0));
        }
        assert_eq!(window.average_kb(), Some(100.0));

        let mut window = WindowBuffer::with_capacity(2);
        for (ts, kb) in [(1.0, 1e17), (2.0, 3.0), (3.0, 5.0), (4.0, 7.0)] {
            window.push(Sample::new(ts, kb));
        }
        assert_eq!(window.average_kb(), Some(6.0));
    }

    #[test]
    fn points_follow_arrival_order() {
        let mut window = WindowBuffer::new();
        window.push(Sample::new(2.0, 20.0));
        window.push(Sample::new(1.0, 10.0));
        assert_eq!(window.points(), vec![(2000.0, 20.0), (1000.0, 10.0)]);
    }
}
