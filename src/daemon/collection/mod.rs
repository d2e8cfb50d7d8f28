//! Sampling side of the daemon: asks the [ForegroundSampler](crate::window_api::ForegroundSampler)
//! what is in front and turns the answers into usage intervals.

pub mod collector;
pub mod ignored;
pub mod tracker;
