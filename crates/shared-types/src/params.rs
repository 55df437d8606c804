//! # Consensus Parameters
//!
//! Currency-wide constants fixed by the root block. Every rule evaluation
//! reads them; nothing in the core ever mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ratio between the maximum and the average block generation time.
const MAX_GEN_TIME_RATIO: f64 = 1.189;

/// Consensus parameters of a currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Dividend growth factor per time step.
    pub c: f64,
    /// Time step between two dividends (seconds).
    pub dt: u64,
    /// Initial dividend amount.
    pub ud0: u64,
    /// Minimum number of certifications to become a member.
    pub sig_qty: u32,
    /// Lifetime of a certification (seconds).
    pub sig_validity: u64,
    /// Lifetime of a membership (seconds).
    pub ms_validity: u64,
    /// Minimum proof-of-work difficulty.
    pub pow_min: u32,
    /// Number of blocks between two difficulty adjustments. Carried in the
    /// root parameters line only; difficulty is not adjusted.
    pub pow_period: u32,
    /// Minimum date increment between two blocks (seconds). Carried in the
    /// root parameters line only; block times are bounded by the median
    /// time rules instead.
    pub inc_date_min: u64,
    /// Average block generation time target (seconds).
    pub avg_gen_time: u64,
    /// Number of previous blocks used to compute the median time.
    pub median_time_blocks: u64,
    /// Maximum age of a transaction's blockstamp (seconds).
    pub tx_window: u64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            c: 0.0488,
            dt: 86_400,
            ud0: 1_000,
            sig_qty: 5,
            sig_validity: 63_115_200,
            ms_validity: 31_557_600,
            pow_min: 70,
            pow_period: 18,
            inc_date_min: 10,
            avg_gen_time: 300,
            median_time_blocks: 24,
            tx_window: 604_800,
        }
    }
}

impl ConsensusParams {
    /// Maximum allowed gap between a block's `time` and its `median_time`.
    pub fn max_acceleration(&self) -> u64 {
        let max_gen_time = (self.avg_gen_time as f64 * MAX_GEN_TIME_RATIO).ceil();
        (max_gen_time * self.median_time_blocks as f64).ceil() as u64
    }

    /// Canonical single-line rendering used in the root block.
    pub fn to_compact(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.c,
            self.dt,
            self.ud0,
            self.sig_qty,
            self.sig_validity,
            self.ms_validity,
            self.pow_min,
            self.pow_period,
            self.inc_date_min,
            self.avg_gen_time,
            self.median_time_blocks,
            self.tx_window
        )
    }
}

impl fmt::Display for ConsensusParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_acceleration() {
        let params = ConsensusParams {
            avg_gen_time: 60,
            median_time_blocks: 20,
            ..ConsensusParams::default()
        };
        assert_eq!(params.max_acceleration(), 1440);
    }

    #[test]
    fn test_compact_has_every_field() {
        let compact = ConsensusParams::default().to_compact();
        assert_eq!(compact.split(':').count(), 12);
    }
}
