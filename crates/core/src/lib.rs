#![forbid(unsafe_code)]

pub mod catalog;
pub mod ledger;
pub mod metrics;
pub mod migrate;
pub mod model;
pub mod navigation;
pub mod time;

pub use time::Clock;
