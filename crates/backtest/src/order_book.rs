//! Simulated order book.
//!
//! Holds the current tick's depth plus whatever liquidity is left after
//! matches on that tick, so a tick can never be matched beyond what it
//! advertises.

use algo_core::{ChildOrder, Level, Price, Quantity, Side, Tick};
use serde::Serialize;

/// Quantity matched at one price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelMatch {
    pub price: Price,
    pub quantity: Quantity,
}

/// Outcome of walking an order through a side of the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sweep {
    /// Matches in price-priority order.
    pub matches: Vec<LevelMatch>,
    /// The walked levels with matched quantity removed, same order and length.
    pub remaining_levels: Vec<Level>,
}

impl Sweep {
    /// Total matched quantity.
    pub fn matched_quantity(&self) -> Quantity {
        self.matches.iter().map(|m| m.quantity).sum()
    }
}

/// Greedily match `remaining` quantity of a `side` order limited at `limit`
/// against resting `levels` (opposite side, best price first).
///
/// Pure: the input levels are untouched and the residual book is returned.
pub fn sweep(levels: &[Level], side: Side, limit: Price, remaining: Quantity) -> Sweep {
    let mut left = remaining.max(0);
    let mut matches = Vec::new();

    let remaining_levels = levels
        .iter()
        .map(|level| {
            if left == 0 || !side.accepts(limit, level.price) {
                return *level;
            }
            let take = left.min(level.quantity);
            left -= take;
            if take > 0 {
                matches.push(LevelMatch {
                    price: level.price,
                    quantity: take,
                });
            }
            Level::new(level.price, level.quantity - take)
        })
        .collect();

    Sweep {
        matches,
        remaining_levels,
    }
}

/// Order book for one backtest run.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// Tick currently applied, if any.
    tick: Option<Tick>,
    /// Bid liquidity left on the current tick.
    bids: Vec<Level>,
    /// Ask liquidity left on the current tick.
    asks: Vec<Level>,
}

impl OrderBook {
    /// Create an empty order book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the book with a new tick and reset consumed liquidity.
    pub fn apply_tick(&mut self, tick: Tick) -> &Tick {
        self.bids = tick.bids().to_vec();
        self.asks = tick.asks().to_vec();
        self.tick.insert(tick)
    }

    /// Remove the current tick. Matching returns nothing until the next tick.
    pub fn withdraw(&mut self) {
        self.tick = None;
        self.bids.clear();
        self.asks.clear();
    }

    /// Current tick.
    pub fn tick(&self) -> Option<&Tick> {
        self.tick.as_ref()
    }

    /// Remaining liquidity resting on a side, best price first.
    pub fn available(&self, side: Side) -> &[Level] {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Quantity consumed from a side on the current tick, saturating at
    /// `Quantity::MAX`.
    pub fn consumed(&self, side: Side) -> Quantity {
        let Some(tick) = &self.tick else {
            return 0;
        };
        let consumed: i128 = tick
            .levels(side)
            .iter()
            .zip(self.available(side))
            .map(|(advertised, left)| i128::from(advertised.quantity - left.quantity))
            .sum();
        Quantity::try_from(consumed).unwrap_or(Quantity::MAX)
    }

    /// Best bid with liquidity left.
    pub fn best_bid(&self) -> Option<&Level> {
        self.bids.iter().find(|l| l.quantity > 0)
    }

    /// Best ask with liquidity left.
    pub fn best_ask(&self) -> Option<&Level> {
        self.asks.iter().find(|l| l.quantity > 0)
    }

    /// Match a working order against the opposite side of the current tick.
    ///
    /// Fills up to the order's remaining quantity within its limit price and
    /// consumes the matched liquidity. Returns the quantity matched per price;
    /// empty when nothing crosses, the order is not working, or no tick is
    /// applied.
    pub fn match_order(&mut self, order: &ChildOrder) -> Vec<LevelMatch> {
        if self.tick.is_none() || !order.is_working() {
            return Vec::new();
        }

        let levels = match order.side().opposite() {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };

        let result = sweep(levels, order.side(), order.price(), order.remaining_quantity());
        *levels = result.remaining_levels;
        result.matches
    }
}
