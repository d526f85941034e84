//! Dutch-auction pricing: a piecewise-linear decay from `start_price`
//! at `auction_start` to `end_price` at `auction_end`, with optional
//! intermediate breakpoints carried in `extraData` (the `rate_bump`
//! curve of the host limit-order protocol's auction extension).

use serde::{Deserialize, Serialize};

/// One intermediate breakpoint: `delay` seconds after `auction_start`,
/// `price` the absolute taking amount at that instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionPoint {
    pub delay: u32,
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfig {
    pub auction_start: u64,
    pub auction_end: u64,
    pub start_price: u64,
    pub end_price: u64,
    pub points: Vec<AuctionPoint>,
}

impl AuctionConfig {
    /// `f(now)`, clamped outside `[auction_start, auction_end]` and
    /// piecewise-linear in between, walking through `points` in order.
    pub fn effective_taking_amount(&self, now: u64) -> u64 {
        if now <= self.auction_start {
            return self.start_price;
        }
        if now >= self.auction_end {
            return self.end_price;
        }

        let elapsed = now - self.auction_start;
        let duration = self.auction_end - self.auction_start;

        let mut prev = (0u64, self.start_price);
        for point in &self.points {
            let delay = point.delay as u64;
            if delay >= duration {
                break;
            }
            if elapsed <= delay {
                return interpolate(prev, (delay, point.price), elapsed);
            }
            prev = (delay, point.price);
        }
        interpolate(prev, (duration, self.end_price), elapsed)
    }
}

fn interpolate(a: (u64, u64), b: (u64, u64), x: u64) -> u64 {
    let (x0, y0) = a;
    let (x1, y1) = b;
    if x1 == x0 {
        return y0;
    }
    let span = (x1 - x0) as i128;
    let num = y0 as i128 * (x1 - x) as i128 + y1 as i128 * (x - x0) as i128;
    (num / span) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuctionConfig {
        AuctionConfig {
            auction_start: 1_000,
            auction_end: 2_000,
            start_price: 1_100,
            end_price: 1_000,
            points: vec![],
        }
    }

    #[test]
    fn price_at_start_and_end_match_the_endpoints() {
        let cfg = config();
        assert_eq!(cfg.effective_taking_amount(1_000), 1_100);
        assert_eq!(cfg.effective_taking_amount(2_000), 1_000);
    }

    #[test]
    fn price_is_clamped_outside_the_auction_window() {
        let cfg = config();
        assert_eq!(cfg.effective_taking_amount(500), 1_100);
        assert_eq!(cfg.effective_taking_amount(5_000), 1_000);
    }

    #[test]
    fn price_decays_linearly_at_the_midpoint() {
        let cfg = config();
        assert_eq!(cfg.effective_taking_amount(1_500), 1_050);
    }

    #[test]
    fn price_is_monotonic_across_the_window() {
        let cfg = config();
        let mut prev = cfg.effective_taking_amount(1_000);
        for t in (1_050..=2_000).step_by(50) {
            let price = cfg.effective_taking_amount(t);
            assert!(price <= prev);
            prev = price;
        }
    }

    #[test]
    fn intermediate_points_bend_the_curve() {
        let mut cfg = config();
        cfg.points = vec![AuctionPoint { delay: 500, price: 1_090 }];
        // Sharp early drop to 1_090 at t=1_500, then a flatter decay to 1_000 by t=2_000.
        assert_eq!(cfg.effective_taking_amount(1_500), 1_090);
        assert_eq!(cfg.effective_taking_amount(1_750), 1_045);
    }
}
