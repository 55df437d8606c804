//! Whole flows over the in-memory node.

pub mod flows;
pub mod scenarios;
