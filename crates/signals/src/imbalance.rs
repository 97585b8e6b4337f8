//! Volume imbalance from tick depth.

use std::collections::VecDeque;

use algo_core::{Level, SequenceNumber, Tick};

/// Sum of quantity over the first `depth` levels, widened so any valid tick fits.
fn depth_quantity(levels: &[Level], depth: usize) -> i128 {
    levels.iter().take(depth).map(|l| i128::from(l.quantity)).sum()
}

/// Calculate volume imbalance: (bid_qty - ask_qty) / (bid_qty + ask_qty).
///
/// Quantities are summed over the top `depth` levels of each side; `depth = 1`
/// is top of book. Returns `None` when the combined quantity is zero, otherwise
/// a value in [-1, 1].
pub fn volume_imbalance(tick: &Tick, depth: usize) -> Option<f64> {
    let bid_qty = depth_quantity(tick.bids(), depth);
    let ask_qty = depth_quantity(tick.asks(), depth);
    let total = bid_qty + ask_qty;
    if total > 0 {
        Some((bid_qty - ask_qty) as f64 / total as f64)
    } else {
        None
    }
}

/// Top-of-book volume imbalance.
pub fn top_of_book_imbalance(tick: &Tick) -> Option<f64> {
    volume_imbalance(tick, 1)
}

/// Rolling history of per-tick volume imbalance.
pub struct ImbalanceTracker {
    /// Recent (seq, imbalance) values, oldest first.
    values: VecDeque<(SequenceNumber, f64)>,
    /// Maximum values to keep.
    max_values: usize,
    /// Levels per side summed for each reading.
    depth: usize,
    /// EMA decay factor.
    ema_alpha: f64,
}

impl ImbalanceTracker {
    /// Create a new imbalance tracker.
    ///
    /// # Arguments
    /// * `max_values` - Maximum readings to keep
    /// * `depth` - Levels per side per reading
    /// * `ema_span` - EMA span in ticks (alpha = 2 / (span + 1))
    pub fn new(max_values: usize, depth: usize, ema_span: u32) -> Self {
        Self {
            values: VecDeque::with_capacity(max_values),
            max_values: max_values.max(1),
            depth: depth.max(1),
            ema_alpha: 2.0 / (ema_span as f64 + 1.0),
        }
    }

    /// Record the imbalance of a tick. Degenerate ticks are skipped.
    ///
    /// Returns the recorded value.
    pub fn observe(&mut self, tick: &Tick) -> Option<f64> {
        let value = volume_imbalance(tick, self.depth)?;
        if self.values.len() >= self.max_values {
            self.values.pop_front();
        }
        self.values.push_back((tick.seq(), value));
        Some(value)
    }

    /// Get the latest value.
    pub fn latest(&self) -> Option<f64> {
        self.values.back().map(|(_, v)| *v)
    }

    /// EMA over the retained values, oldest first.
    pub fn ema(&self) -> Option<f64> {
        let mut iter = self.values.iter().map(|(_, v)| *v);
        let first = iter.next()?;
        Some(iter.fold(first, |ema, v| self.ema_alpha * v + (1.0 - self.ema_alpha) * ema))
    }

    /// Simple average over the retained values.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let sum: f64 = self.values.iter().map(|(_, v)| v).sum();
        Some(sum / self.values.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algo_core::{Price, Quantity};
    use approx::assert_relative_eq;

    fn make_tick(seq: u64, bids: Vec<(Price, Quantity)>, asks: Vec<(Price, Quantity)>) -> Tick {
        Tick::new(seq, 0, bids, asks).unwrap()
    }

    #[test]
    fn test_top_of_book() {
        let tick = make_tick(1, vec![(99, 100), (98, 500)], vec![(101, 200), (102, 10)]);
        // (100 - 200) / 300
        assert_relative_eq!(top_of_book_imbalance(&tick).unwrap(), -1.0 / 3.0);
    }

    #[test]
    fn test_multi_level() {
        let tick = make_tick(1, vec![(99, 100), (98, 500)], vec![(101, 200), (102, 10)]);
        // (600 - 210) / 810
        assert_relative_eq!(volume_imbalance(&tick, 2).unwrap(), 390.0 / 810.0);
        // Depth beyond the book just uses what is there
        assert_relative_eq!(volume_imbalance(&tick, 10).unwrap(), 390.0 / 810.0);
    }

    #[test]
    fn test_zero_quantity_sentinel() {
        let tick = make_tick(1, vec![(99, 0)], vec![(101, 0)]);
        assert_eq!(top_of_book_imbalance(&tick), None);
    }

    #[test]
    fn test_bounds() {
        // One-sided depth hits the bounds exactly
        let all_bid = make_tick(1, vec![(99, 50)], vec![(101, 0)]);
        assert_relative_eq!(top_of_book_imbalance(&all_bid).unwrap(), 1.0);
        let all_ask = make_tick(1, vec![(99, 0)], vec![(101, 50)]);
        assert_relative_eq!(top_of_book_imbalance(&all_ask).unwrap(), -1.0);

        for bid in 0..40i64 {
            for ask in 0..40i64 {
                if bid + ask == 0 {
                    continue;
                }
                let tick = make_tick(1, vec![(99, bid * 7)], vec![(101, ask * 11)]);
                let imb = top_of_book_imbalance(&tick).unwrap();
                assert!((-1.0..=1.0).contains(&imb), "imbalance {imb} out of range");
            }
        }
    }

    #[test]
    fn test_large_quantities() {
        let huge = i64::MAX / 2 + 1;
        let balanced = make_tick(1, vec![(99, huge)], vec![(101, huge)]);
        assert_relative_eq!(top_of_book_imbalance(&balanced).unwrap(), 0.0);

        let skewed = make_tick(2, vec![(99, i64::MAX), (98, i64::MAX)], vec![(101, huge)]);
        let imb = volume_imbalance(&skewed, 2).unwrap();
        assert!((-1.0..=1.0).contains(&imb), "imbalance {imb} out of range");
        assert!(imb > 0.0);

        let one_sided = make_tick(3, vec![(99, i64::MAX)], vec![(101, 0)]);
        assert_relative_eq!(top_of_book_imbalance(&one_sided).unwrap(), 1.0);
    }

    #[test]
    fn test_tracker() {
        let mut tracker = ImbalanceTracker::new(2, 1, 3);
        assert!(tracker.ema().is_none());

        tracker.observe(&make_tick(1, vec![(99, 100)], vec![(101, 100)])); // 0.0
        tracker.observe(&make_tick(2, vec![(99, 300)], vec![(101, 100)])); // 0.5
        assert_relative_eq!(tracker.mean().unwrap(), 0.25);
        // alpha = 0.5 -> 0.5 * 0.5 + 0.5 * 0.0
        assert_relative_eq!(tracker.ema().unwrap(), 0.25);

        tracker.observe(&make_tick(3, vec![(99, 100)], vec![(101, 300)])); // -0.5
        assert_eq!(tracker.len(), 2);
        assert_relative_eq!(tracker.latest().unwrap(), -0.5);
        assert_relative_eq!(tracker.mean().unwrap(), 0.0);
    }

    #[test]
    fn test_tracker_skips_degenerate() {
        let mut tracker = ImbalanceTracker::new(10, 1, 5);
        assert!(tracker.observe(&make_tick(1, vec![(99, 0)], vec![(101, 0)])).is_none());
        assert!(tracker.is_empty());
    }
}
