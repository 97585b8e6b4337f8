//! Volume-weighted average price over child orders.

use algo_core::{AlgoState, ChildOrder, Price, Quantity};

/// Running price x quantity and quantity sums.
///
/// Addition is commutative, so the result does not depend on the order in
/// which fills are added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VwapAccumulator {
    notional: i128,
    volume: i128,
}

impl VwapAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add quantity traded at a price. Non-positive quantities are ignored.
    pub fn add(&mut self, price: Price, quantity: Quantity) {
        if quantity <= 0 {
            return;
        }
        self.notional += price as i128 * quantity as i128;
        self.volume += quantity as i128;
    }

    /// Merge another accumulator into this one.
    pub fn merge(&mut self, other: &VwapAccumulator) {
        self.notional += other.notional;
        self.volume += other.volume;
    }

    /// Total quantity added so far.
    pub fn volume(&self) -> i128 {
        self.volume
    }

    /// VWAP, or `None` when no quantity has been added.
    pub fn value(&self) -> Option<f64> {
        if self.volume > 0 {
            Some(self.notional as f64 / self.volume as f64)
        } else {
            None
        }
    }
}

/// VWAP over orders' limit prices weighted by their filled quantity.
///
/// Returns `None` when total filled quantity is zero.
pub fn vwap<'a>(orders: impl IntoIterator<Item = &'a ChildOrder>) -> Option<f64> {
    let mut acc = VwapAccumulator::new();
    for order in orders {
        acc.add(order.price(), order.filled_quantity());
    }
    acc.value()
}

/// VWAP over the actual execution prices of the orders' fills.
///
/// Returns `None` when nothing has filled.
pub fn execution_vwap<'a>(orders: impl IntoIterator<Item = &'a ChildOrder>) -> Option<f64> {
    let mut acc = VwapAccumulator::new();
    for fill in orders.into_iter().flat_map(ChildOrder::fills) {
        acc.add(fill.price, fill.quantity);
    }
    acc.value()
}

/// VWAP over every child order in the state.
pub fn state_vwap(state: &AlgoState) -> Option<f64> {
    vwap(state.child_orders())
}

#[cfg(test)]
mod tests {
    use super::*;
    use algo_core::{Fill, Side};
    use approx::assert_relative_eq;

    fn filled_state(orders: &[(Side, Price, Quantity, Quantity)]) -> AlgoState {
        let mut state = AlgoState::new();
        for &(side, price, quantity, filled) in orders {
            let id = state.add_child_order(side, price, quantity, 1).unwrap();
            state.accept(id).unwrap();
            if filled > 0 {
                state
                    .apply_fill(
                        id,
                        Fill {
                            seq: 1,
                            price,
                            quantity: filled,
                        },
                    )
                    .unwrap();
            }
        }
        state
    }

    #[test]
    fn test_vwap_weighted_by_filled() {
        let state = filled_state(&[
            (Side::Buy, 100, 100, 100),
            (Side::Buy, 101, 100, 50),
            (Side::Sell, 99, 100, 0), // no fill, no weight
        ]);
        // (100 * 100 + 101 * 50) / 150
        assert_relative_eq!(state_vwap(&state).unwrap(), 15050.0 / 150.0);
    }

    #[test]
    fn test_vwap_sentinel_when_nothing_filled() {
        assert_eq!(state_vwap(&AlgoState::new()), None);

        let state = filled_state(&[(Side::Buy, 100, 100, 0), (Side::Sell, 101, 10, 0)]);
        assert_eq!(state_vwap(&state), None);
        assert_eq!(execution_vwap(state.child_orders()), None);
    }

    #[test]
    fn test_vwap_independent_of_order() {
        let fills: [(Price, Quantity); 5] = [(100, 10), (101, 3), (98, 25), (102, 1), (99, 7)];

        let mut forward = VwapAccumulator::new();
        fills.iter().for_each(|&(p, q)| forward.add(p, q));

        // Every rotation and the reverse must agree exactly
        for shift in 0..fills.len() {
            let mut rotated = VwapAccumulator::new();
            for i in 0..fills.len() {
                let (p, q) = fills[(i + shift) % fills.len()];
                rotated.add(p, q);
            }
            assert_eq!(rotated, forward);
        }

        let mut reversed = VwapAccumulator::new();
        fills.iter().rev().for_each(|&(p, q)| reversed.add(p, q));
        assert_eq!(reversed.value(), forward.value());
    }

    #[test]
    fn test_merge() {
        let mut a = VwapAccumulator::new();
        a.add(100, 10);
        let mut b = VwapAccumulator::new();
        b.add(110, 10);
        a.merge(&b);
        assert_eq!(a.volume(), 20);
        assert_relative_eq!(a.value().unwrap(), 105.0);
    }

    #[test]
    fn test_execution_vwap_uses_fill_prices() {
        let mut state = AlgoState::new();
        let id = state.add_child_order(Side::Buy, 105, 30, 1).unwrap();
        state.accept(id).unwrap();
        let fill = |seq, price, quantity| Fill {
            seq,
            price,
            quantity,
        };
        state.apply_fill(id, fill(1, 100, 10)).unwrap();
        state.apply_fill(id, fill(2, 103, 20)).unwrap();

        assert_relative_eq!(state_vwap(&state).unwrap(), 105.0);
        // (100 * 10 + 103 * 20) / 30 = 102
        assert_relative_eq!(execution_vwap(state.child_orders()).unwrap(), 102.0);
    }
}
