//! Universal dividend schedule.
//!
//! ```text
//! UD(0)   = ud0, base 0
//! UD(t+1) = max(UD(t), ceil(UD(t) + c² · M(t) / N(t)))
//! ```
//!
//! The amount is kept below one million units by raising the unit base.

use shared_types::{ConsensusParams, MonetaryState};

/// Amounts at or above this move to the next unit base.
pub const MAX_DIVIDEND_DIGITS: u64 = 1_000_000;

/// A dividend amount with its unit base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dividend {
    pub amount: u64,
    pub base: u32,
}

/// Dividend due for the next block carrying one.
pub fn expected_dividend(params: &ConsensusParams, state: &MonetaryState) -> Dividend {
    let Some(previous) = state.last_dividend else {
        return Dividend {
            amount: params.ud0,
            base: 0,
        };
    };

    let previous_value = previous.amount as f64 * 10f64.powi(previous.base as i32);
    let growth = if state.members_count > 0 {
        params.c * params.c * state.mass as f64 / state.members_count as f64
    } else {
        0.0
    };
    let value = ceil_exact(previous_value + growth).max(previous_value);

    let mut base = previous.base;
    let mut amount = ceil_exact(value / 10f64.powi(base as i32));
    while amount >= MAX_DIVIDEND_DIGITS as f64 {
        amount = (amount / 10.0).ceil();
        base += 1;
    }
    Dividend {
        amount: amount as u64,
        base,
    }
}

/// Ceiling that ignores floating point noise around integers.
fn ceil_exact(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= 1e-9 * value.abs().max(1.0) {
        rounded
    } else {
        value.ceil()
    }
}

/// Whether a block at `median_time` must carry a dividend.
pub fn dividend_due(state: &MonetaryState, median_time: u64) -> bool {
    state
        .next_dividend_time
        .map(|next| median_time >= next)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::DividendRecord;

    fn params() -> ConsensusParams {
        ConsensusParams {
            c: 0.1,
            ud0: 100,
            ..ConsensusParams::default()
        }
    }

    #[test]
    fn test_first_dividend_is_ud0() {
        let state = MonetaryState::default();
        assert_eq!(
            expected_dividend(&params(), &state),
            Dividend {
                amount: 100,
                base: 0
            }
        );
    }

    #[test]
    fn test_dividend_grows_with_mass() {
        let state = MonetaryState {
            last_dividend: Some(DividendRecord {
                amount: 100,
                base: 0,
                time: 0,
            }),
            next_dividend_time: Some(100),
            mass: 30_000,
            members_count: 3,
        };
        // 100 + 0.01 * 30000 / 3 = 200
        assert_eq!(expected_dividend(&params(), &state).amount, 200);
    }

    #[test]
    fn test_dividend_never_decreases() {
        let state = MonetaryState {
            last_dividend: Some(DividendRecord {
                amount: 150,
                base: 0,
                time: 0,
            }),
            next_dividend_time: Some(100),
            mass: 0,
            members_count: 0,
        };
        assert_eq!(expected_dividend(&params(), &state).amount, 150);
    }

    #[test]
    fn test_base_bump() {
        let state = MonetaryState {
            last_dividend: Some(DividendRecord {
                amount: 999_999,
                base: 0,
                time: 0,
            }),
            next_dividend_time: Some(100),
            mass: 300,
            members_count: 1,
        };
        // 999999 + 3 = 1000002, shown as 100001 at base 1
        assert_eq!(
            expected_dividend(&params(), &state),
            Dividend {
                amount: 100_001,
                base: 1
            }
        );
    }

    #[test]
    fn test_due() {
        let state = MonetaryState {
            next_dividend_time: Some(1000),
            ..MonetaryState::default()
        };
        assert!(!dividend_due(&state, 999));
        assert!(dividend_due(&state, 1000));
        assert!(!dividend_due(&MonetaryState::default(), u64::MAX));
    }
}
