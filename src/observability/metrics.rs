//! Metrics for configuration loads and the handle registry.
//!
//! # Metrics
//! - `blockconf_loads_total` (counter): opens by `outcome` (`ok`/`error`)
//! - `blockconf_reloads_total` (counter): reloads by `outcome`
//! - `blockconf_registered_handles` (gauge): live handles in the registry

pub const LOADS_TOTAL: &str = "blockconf_loads_total";
pub const RELOADS_TOTAL: &str = "blockconf_reloads_total";
pub const REGISTERED_HANDLES: &str = "blockconf_registered_handles";

pub fn record_load(outcome: &'static str) {
    ::metrics::counter!(LOADS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_reload(outcome: &'static str) {
    ::metrics::counter!(RELOADS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn set_registered_handles(count: usize) {
    ::metrics::gauge!(REGISTERED_HANDLES).set(count as f64);
}
