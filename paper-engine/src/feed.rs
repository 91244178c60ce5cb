use crate::models::{MarketBoard, Quote};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest per-tick move, as a fraction of the current price.
const MAX_TICK_DELTA: f64 = 0.015;
/// Prices never reach zero or below.
const PRICE_FLOOR: f64 = 0.01;

/// Source of price ticks for the whole instrument table. The engine
/// owns one; swapping in a scripted source is how tests steer prices.
pub trait TickSource: Send {
    fn apply_tick(&mut self, board: &mut MarketBoard);
}

/// The production tick source: an independent uniform random walk per
/// instrument.
pub struct PriceFeed {
    rng: StdRng,
}

impl PriceFeed {
    /// Entropy-seeded feed for normal runs.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic feed for reproducible demos and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for PriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for PriceFeed {
    /// One tick: every instrument takes a uniform step in +-1.5%,
    /// rounded to the paise, floored at the minimum price.
    fn apply_tick(&mut self, board: &mut MarketBoard) {
        for entry in board.entries_mut() {
            let delta = self.rng.gen_range(-MAX_TICK_DELTA..=MAX_TICK_DELTA);
            let stepped = entry.quote.current_price * (1.0 + delta);
            apply_price(&mut entry.quote, stepped);
        }
    }
}

/// Moves a quote to a new price the way a tick does: round to the
/// paise, floor at the minimum price, re-derive change against the
/// previous close, and only ever widen the day range.
pub(crate) fn apply_price(quote: &mut Quote, raw: f64) {
    let price = round_paise(raw).max(PRICE_FLOOR);
    quote.current_price = price;
    quote.change = round_paise(price - quote.previous_close);
    quote.change_percent =
        round_paise((price - quote.previous_close) / quote.previous_close * 100.0);
    quote.day_high = quote.day_high.max(price);
    quote.day_low = quote.day_low.min(price);
}

fn round_paise(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
