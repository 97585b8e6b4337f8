//! Algo State: the per-run record of every child order.

use tracing::debug;

use crate::error::{Error, Result};
use crate::order::{ChildOrder, OrderId, OrderState};
use crate::types::{Fill, Price, Quantity, SequenceNumber, Side};

/// All child orders created during one backtest run, in creation order.
///
/// The order list only grows. Algorithms only ever see `&AlgoState`; the
/// mutating methods are driven by the backtest simulator.
#[derive(Debug, Clone, Default)]
pub struct AlgoState {
    orders: Vec<ChildOrder>,
    next_id: u64,
}

impl AlgoState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a new child order, returning its id.
    pub fn add_child_order(
        &mut self,
        side: Side,
        price: Price,
        quantity: Quantity,
        created_seq: SequenceNumber,
    ) -> Result<OrderId> {
        let id = OrderId(self.next_id + 1);
        let order = ChildOrder::new(id, side, price, quantity, created_seq)?;
        self.next_id += 1;
        self.orders.push(order);
        debug!(%id, ?side, price, quantity, created_seq, "child order added");
        Ok(id)
    }

    /// Every child order ever created, in insertion order.
    pub fn child_orders(&self) -> &[ChildOrder] {
        &self.orders
    }

    /// Orders in `Active` or `PartiallyFilled`.
    pub fn active_child_orders(&self) -> Vec<&ChildOrder> {
        self.orders.iter().filter(|o| o.is_working()).collect()
    }

    /// Look up an order by id.
    pub fn child_order(&self, id: OrderId) -> Option<&ChildOrder> {
        self.index_of(id).map(|i| &self.orders[i])
    }

    /// Accept a new order into the book.
    pub fn accept(&mut self, id: OrderId) -> Result<()> {
        self.order_mut(id)?.accept()
    }

    /// Apply a fill to a working order.
    pub fn apply_fill(&mut self, id: OrderId, fill: Fill) -> Result<()> {
        let order = self.order_mut(id)?;
        order.apply_fill(fill)?;
        debug!(
            %id,
            price = fill.price,
            quantity = fill.quantity,
            state = ?order.state(),
            "fill applied"
        );
        Ok(())
    }

    /// Cancel an order that is not yet terminal.
    pub fn cancel(&mut self, id: OrderId) -> Result<()> {
        self.order_mut(id)?.cancel()
    }

    /// Sum of filled quantity across all orders, cancelled ones included.
    pub fn total_filled_quantity(&self) -> Quantity {
        self.orders.iter().map(ChildOrder::filled_quantity).sum()
    }

    /// Filled quantity for one side.
    pub fn filled_quantity_for(&self, side: Side) -> Quantity {
        self.orders
            .iter()
            .filter(|o| o.side() == side)
            .map(ChildOrder::filled_quantity)
            .sum()
    }

    /// Number of orders currently in `state`.
    pub fn count_in_state(&self, state: OrderState) -> usize {
        self.orders.iter().filter(|o| o.state() == state).count()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn index_of(&self, id: OrderId) -> Option<usize> {
        // Ids are handed out sequentially from 1, so the id doubles as an index.
        let idx = usize::try_from(id.0).ok()?.checked_sub(1)?;
        (idx < self.orders.len()).then_some(idx)
    }

    fn order_mut(&mut self, id: OrderId) -> Result<&mut ChildOrder> {
        let idx = self.index_of(id).ok_or(Error::UnknownOrder(id))?;
        Ok(&mut self.orders[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(quantity: Quantity) -> Fill {
        Fill {
            seq: 1,
            price: 100,
            quantity,
        }
    }

    #[test]
    fn test_ids_unique_and_sequential() {
        let mut state = AlgoState::new();
        let a = state.add_child_order(Side::Buy, 100, 10, 1).unwrap();
        let b = state.add_child_order(Side::Sell, 101, 10, 1).unwrap();
        assert_eq!(a, OrderId(1));
        assert_eq!(b, OrderId(2));
        assert_eq!(state.child_order(b).unwrap().side(), Side::Sell);
        assert!(state.child_order(OrderId(0)).is_none());
        assert!(state.child_order(OrderId(3)).is_none());
    }

    #[test]
    fn test_rejected_order_does_not_consume_id() {
        let mut state = AlgoState::new();
        assert!(state.add_child_order(Side::Buy, 100, 0, 1).is_err());
        assert!(state.is_empty());

        let id = state.add_child_order(Side::Buy, 100, 5, 1).unwrap();
        assert_eq!(id, OrderId(1));
    }

    #[test]
    fn test_active_child_orders() {
        let mut state = AlgoState::new();
        let a = state.add_child_order(Side::Buy, 100, 10, 1).unwrap();
        let b = state.add_child_order(Side::Buy, 100, 10, 1).unwrap();
        let c = state.add_child_order(Side::Sell, 102, 10, 1).unwrap();
        let d = state.add_child_order(Side::Sell, 103, 10, 1).unwrap();

        // New orders are not active yet
        assert!(state.active_child_orders().is_empty());

        for id in [a, b, c, d] {
            state.accept(id).unwrap();
        }
        state.apply_fill(a, fill(4)).unwrap();
        state.apply_fill(b, fill(10)).unwrap();
        state.cancel(c).unwrap();

        let active: Vec<OrderId> = state.active_child_orders().iter().map(|o| o.id()).collect();
        assert_eq!(active, vec![a, d]);
        assert_eq!(state.len(), 4);
        assert_eq!(state.count_in_state(OrderState::Filled), 1);
        assert_eq!(state.count_in_state(OrderState::Cancelled), 1);
    }

    #[test]
    fn test_totals() {
        let mut state = AlgoState::new();
        let a = state.add_child_order(Side::Buy, 100, 10, 1).unwrap();
        let b = state.add_child_order(Side::Sell, 100, 10, 1).unwrap();
        state.accept(a).unwrap();
        state.accept(b).unwrap();
        state.apply_fill(a, fill(7)).unwrap();
        state.apply_fill(b, fill(2)).unwrap();
        state.cancel(b).unwrap();

        assert_eq!(state.total_filled_quantity(), 9);
        assert_eq!(state.filled_quantity_for(Side::Buy), 7);
        assert_eq!(state.filled_quantity_for(Side::Sell), 2);
    }

    #[test]
    fn test_unknown_order() {
        let mut state = AlgoState::new();
        assert!(matches!(state.cancel(OrderId(9)), Err(Error::UnknownOrder(OrderId(9)))));
        assert!(state.accept(OrderId(0)).is_err());
    }

    #[test]
    fn test_failed_transition_leaves_state_intact() {
        let mut state = AlgoState::new();
        let id = state.add_child_order(Side::Buy, 100, 10, 1).unwrap();
        state.accept(id).unwrap();
        state.apply_fill(id, fill(10)).unwrap();

        let before = state.child_orders().to_vec();
        assert!(state.cancel(id).unwrap_err().is_invalid_transition());
        assert_eq!(state.child_orders(), before.as_slice());
    }
}
