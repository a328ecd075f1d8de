//! Wei denomination helpers

use num_bigint::BigUint;
use num_traits::ToPrimitive;

const WEI_PER_ETHER: f64 = 1e18;
const WEI_PER_GWEI: f64 = 1e9;

/// Converts a wei amount to ether. Precision is whatever f64 gives;
/// exported balance gauges do not need more.
pub fn wei_to_ether(wei: &BigUint) -> f64 {
    wei.to_f64().unwrap_or(f64::INFINITY) / WEI_PER_ETHER
}

/// Converts a wei amount to gwei.
pub fn wei_to_gwei(wei: &BigUint) -> f64 {
    wei.to_f64().unwrap_or(f64::INFINITY) / WEI_PER_GWEI
}
