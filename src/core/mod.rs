pub mod fund;
pub mod metrics;
pub mod nav;
