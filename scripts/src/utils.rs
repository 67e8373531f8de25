//! Utilities for the deploy scripts.

use std::str::FromStr;

use alloy_primitives::Address;
use itertools::Itertools;

use crate::{errors::ScriptError, types::MethodCall};

/// Scale `value` by `percent` / 100, flooring the result
pub fn apply_gas_buffer(value: u128, percent: u64) -> u128 {
    value.saturating_mul(percent as u128) / 100
}

/// Scale a gas limit by `percent` / 100, flooring and saturating at `u64::MAX`
pub fn buffered_gas_limit(estimate: u64, percent: u64) -> u64 {
    u64::try_from(apply_gas_buffer(estimate as u128, percent)).unwrap_or(u64::MAX)
}

/// Parse a hex address supplied on the command line
pub fn parse_address(address: &str) -> Result<Address, ScriptError> {
    Address::from_str(address).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Build an optional method call from a command line method name and its arguments
pub fn method_call(method: Option<String>, args: Vec<String>) -> Option<MethodCall> {
    method.map(|method| MethodCall::new(method, args))
}

/// Format a list of addresses as an `address[]` argument
pub fn address_array_arg(addresses: &[Address]) -> String {
    format!("[{}]", addresses.iter().map(|a| a.to_string()).join(","))
}
