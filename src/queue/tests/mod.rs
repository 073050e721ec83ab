//! Test modules for the multi-channel queue
//!
//! Suites are organised by functional area: core operations, channel
//! lifecycle, delivery fairness, concurrent stress and edge cases.

mod lifecycle;
