//! Market data types for the backtest core.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Price in integer ticks.
pub type Price = i64;

/// Size/quantity in integer lots.
pub type Quantity = i64;

/// Monotonically increasing tick sequence number.
pub type SequenceNumber = u64;

/// Order or book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an order of this side trades against.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Get sign: +1 for buy, -1 for sell.
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    /// Does a resting level at `level_price` satisfy a limit of `limit` on this side?
    ///
    /// A buy accepts asks at or below its limit, a sell accepts bids at or above it.
    #[inline]
    pub fn accepts(self, limit: Price, level_price: Price) -> bool {
        match self {
            Side::Buy => level_price <= limit,
            Side::Sell => level_price >= limit,
        }
    }
}

/// One price level of market depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Level price.
    pub price: Price,
    /// Quantity available at this price.
    pub quantity: Quantity,
}

impl Level {
    pub fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

impl From<(Price, Quantity)> for Level {
    fn from((price, quantity): (Price, Quantity)) -> Self {
        Level { price, quantity }
    }
}

/// Immutable snapshot of bid/ask depth at one simulated instant.
///
/// Levels on each side are ordered best price first. Construction validates
/// the snapshot, so every `Tick` in circulation is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tick {
    seq: SequenceNumber,
    ts_ms: TimestampMs,
    bids: Vec<Level>,
    asks: Vec<Level>,
}

impl Tick {
    /// Build a tick, rejecting locked or crossed books.
    pub fn new(
        seq: SequenceNumber,
        ts_ms: TimestampMs,
        bids: impl IntoIterator<Item = impl Into<Level>>,
        asks: impl IntoIterator<Item = impl Into<Level>>,
    ) -> Result<Self> {
        let tick = Self::build(seq, ts_ms, bids, asks)?;
        let (bid, ask) = (tick.best_bid().price, tick.best_ask().price);
        if bid >= ask {
            return Err(Error::validation(format!(
                "tick {seq}: best bid {bid} must be below best ask {ask}"
            )));
        }
        Ok(tick)
    }

    /// Build a tick that is allowed to be locked or crossed.
    ///
    /// All other validation still applies.
    pub fn new_crossed(
        seq: SequenceNumber,
        ts_ms: TimestampMs,
        bids: impl IntoIterator<Item = impl Into<Level>>,
        asks: impl IntoIterator<Item = impl Into<Level>>,
    ) -> Result<Self> {
        Self::build(seq, ts_ms, bids, asks)
    }

    fn build(
        seq: SequenceNumber,
        ts_ms: TimestampMs,
        bids: impl IntoIterator<Item = impl Into<Level>>,
        asks: impl IntoIterator<Item = impl Into<Level>>,
    ) -> Result<Self> {
        let bids: Vec<Level> = bids.into_iter().map(Into::into).collect();
        let asks: Vec<Level> = asks.into_iter().map(Into::into).collect();

        validate_side(seq, "bid", &bids, |prev, next| next < prev)?;
        validate_side(seq, "ask", &asks, |prev, next| next > prev)?;

        Ok(Self {
            seq,
            ts_ms,
            bids,
            asks,
        })
    }

    /// Sequence number.
    #[inline]
    pub fn seq(&self) -> SequenceNumber {
        self.seq
    }

    /// Timestamp in milliseconds.
    #[inline]
    pub fn ts_ms(&self) -> TimestampMs {
        self.ts_ms
    }

    /// Best (highest) bid level.
    #[inline]
    pub fn best_bid(&self) -> &Level {
        &self.bids[0]
    }

    /// Best (lowest) ask level.
    #[inline]
    pub fn best_ask(&self) -> &Level {
        &self.asks[0]
    }

    /// All bid levels, best first.
    pub fn bids(&self) -> &[Level] {
        &self.bids
    }

    /// All ask levels, best first.
    pub fn asks(&self) -> &[Level] {
        &self.asks
    }

    /// Levels resting on the given side.
    pub fn levels(&self, side: Side) -> &[Level] {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Calculate mid price.
    #[inline]
    pub fn mid(&self) -> f64 {
        (self.best_bid().price + self.best_ask().price) as f64 / 2.0
    }

    /// Calculate spread. Negative for a crossed tick.
    #[inline]
    pub fn spread(&self) -> Price {
        self.best_ask().price - self.best_bid().price
    }
}

fn validate_side(
    seq: SequenceNumber,
    name: &str,
    levels: &[Level],
    in_priority: impl Fn(Price, Price) -> bool,
) -> Result<()> {
    if levels.is_empty() {
        return Err(Error::validation(format!("tick {seq}: no {name} levels")));
    }

    for (i, level) in levels.iter().enumerate() {
        if level.price <= 0 {
            return Err(Error::validation(format!(
                "tick {seq}: {name} level {i} has non-positive price {}",
                level.price
            )));
        }
        if level.quantity < 0 {
            return Err(Error::validation(format!(
                "tick {seq}: {name} level {i} has negative quantity {}",
                level.quantity
            )));
        }
    }

    if let Some(pair) = levels
        .windows(2)
        .find(|pair| !in_priority(pair[0].price, pair[1].price))
    {
        return Err(Error::validation(format!(
            "tick {seq}: {name} levels out of price priority ({} then {})",
            pair[0].price, pair[1].price
        )));
    }

    Ok(())
}

/// Raw tick data as it arrives from a feed or fixture, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTick {
    /// Sequence number.
    pub seq: SequenceNumber,
    /// Timestamp in milliseconds.
    #[serde(default)]
    pub ts_ms: TimestampMs,
    /// Bid levels as (price, quantity), best first.
    pub bids: Vec<(Price, Quantity)>,
    /// Ask levels as (price, quantity), best first.
    pub asks: Vec<(Price, Quantity)>,
    /// Whether a locked/crossed book is intentional.
    #[serde(default)]
    pub crossed: bool,
}

impl TryFrom<RawTick> for Tick {
    type Error = Error;

    fn try_from(raw: RawTick) -> Result<Self> {
        if raw.crossed {
            Tick::new_crossed(raw.seq, raw.ts_ms, raw.bids, raw.asks)
        } else {
            Tick::new(raw.seq, raw.ts_ms, raw.bids, raw.asks)
        }
    }
}

/// A single execution of a child order against one book level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Sequence number of the tick the fill happened on.
    pub seq: SequenceNumber,
    /// Execution price (the level's price).
    pub price: Price,
    /// Executed quantity.
    pub quantity: Quantity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(bids: Vec<(Price, Quantity)>, asks: Vec<(Price, Quantity)>) -> Result<Tick> {
        Tick::new(1, 0, bids, asks)
    }

    #[test]
    fn test_best_levels() {
        let t = tick(vec![(99, 200), (98, 300)], vec![(101, 200), (102, 50)]).unwrap();
        assert_eq!(*t.best_bid(), Level::new(99, 200));
        assert_eq!(*t.best_ask(), Level::new(101, 200));
        assert_eq!(t.spread(), 2);
        assert!((t.mid() - 100.0).abs() < 1e-10);
        assert_eq!(t.levels(Side::Sell).len(), 2);
    }

    #[test]
    fn test_empty_side_rejected() {
        let err = tick(vec![], vec![(101, 200)]).unwrap_err();
        assert!(err.is_validation());
        let err = tick(vec![(99, 200)], vec![]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(tick(vec![(-99, 200)], vec![(101, 200)]).unwrap_err().is_validation());
        assert!(tick(vec![(99, -1)], vec![(101, 200)]).unwrap_err().is_validation());
        assert!(tick(vec![(99, 1)], vec![(0, 200)]).unwrap_err().is_validation());
    }

    #[test]
    fn test_zero_quantity_allowed() {
        let t = tick(vec![(99, 0)], vec![(101, 0)]).unwrap();
        assert_eq!(t.best_bid().quantity, 0);
    }

    #[test]
    fn test_price_priority_enforced() {
        // Bids must descend
        assert!(tick(vec![(98, 1), (99, 1)], vec![(101, 1)]).is_err());
        // Asks must ascend
        assert!(tick(vec![(99, 1)], vec![(102, 1), (101, 1)]).is_err());
        // Duplicate prices are not allowed either
        assert!(tick(vec![(99, 1), (99, 1)], vec![(101, 1)]).is_err());
    }

    #[test]
    fn test_crossed_book() {
        assert!(tick(vec![(101, 1)], vec![(100, 1)]).is_err());
        assert!(tick(vec![(100, 1)], vec![(100, 1)]).is_err());

        let crossed =
            Tick::new_crossed(1, 0, vec![Level::new(101, 1)], vec![Level::new(100, 1)]).unwrap();
        assert_eq!(crossed.spread(), -1);
    }

    #[test]
    fn test_raw_tick_conversion() {
        let raw: RawTick = serde_json::from_str(
            r#"{"seq": 7, "bids": [[99, 10]], "asks": [[101, 20]]}"#,
        )
        .unwrap();
        let t = Tick::try_from(raw).unwrap();
        assert_eq!(t.seq(), 7);
        assert_eq!(t.best_ask().quantity, 20);

        let raw = RawTick {
            seq: 8,
            bids: vec![(102, 1)],
            asks: vec![(100, 1)],
            crossed: true,
            ..Default::default()
        };
        assert!(Tick::try_from(raw).is_ok());
    }

    #[test]
    fn test_side_accepts() {
        assert!(Side::Buy.accepts(101, 100));
        assert!(Side::Buy.accepts(101, 101));
        assert!(!Side::Buy.accepts(101, 102));
        assert!(Side::Sell.accepts(99, 100));
        assert!(!Side::Sell.accepts(99, 98));
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.sign(), -1);
    }
}
