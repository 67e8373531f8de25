//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy_primitives::{Address, Bytes, B256};

use crate::constants::{
    GAS_BUFFER_PERCENT, NUM_DEPLOY_CONFIRMATIONS, PROXY_ADMIN_KEY, PROXY_CONTRACT_NAME,
};

/// A contract method to call, with its arguments in their string form.
///
/// Arguments are coerced to the method's parameter types by the encoder, so
/// e.g. an `address[]` argument is written as `[0x.., 0x..]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodCall {
    /// The name of the method
    pub method: String,
    /// The method arguments
    pub args: Vec<String>,
}

impl MethodCall {
    /// Construct a call of `method` with the given arguments
    pub fn new(method: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// How a component should be deployed
#[derive(Clone, Debug, Default)]
pub struct DeployOptions {
    /// Deploy the component behind an upgradeable proxy
    pub upgradeable: Option<UpgradeableOptions>,
    /// The address the caller computed ahead of time for this component.
    ///
    /// The deployment is rejected if it would land, or landed, anywhere else.
    pub expected_address: Option<Address>,
}

impl DeployOptions {
    /// Deploy behind a proxy, optionally initializing it through `init`
    pub fn upgradeable(init: Option<MethodCall>) -> Self {
        Self {
            upgradeable: Some(UpgradeableOptions { init }),
            ..Default::default()
        }
    }

    /// Require the deployment to land at `address`
    pub fn expecting(address: Address) -> Self {
        Self {
            expected_address: Some(address),
            ..Default::default()
        }
    }
}

/// Options for a proxied deployment
#[derive(Clone, Debug, Default)]
pub struct UpgradeableOptions {
    /// The initializer the proxy calls on its implementation when constructed
    pub init: Option<MethodCall>,
}

/// Gas parameters attached to a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasParams {
    /// The gas limit
    pub gas_limit: u64,
    /// The legacy gas price, in wei
    pub gas_price: u128,
}

/// A contract creation transaction
#[derive(Clone, Debug)]
pub struct DeployTransaction {
    /// The account sending the transaction
    pub from: Address,
    /// The nonce the transaction is pinned to
    pub nonce: u64,
    /// The creation code, with constructor arguments appended
    pub code: Bytes,
    /// The gas parameters, absent while the transaction is being estimated
    pub gas: Option<GasParams>,
}

/// The confirmed result of a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// The hash of the transaction
    pub tx_hash: B256,
    /// The address of the created contract, for creation transactions
    pub contract_address: Option<Address>,
}

/// Run-level settings of a deployment session
#[derive(Clone, Debug)]
pub struct DeployConfig {
    /// The buffer applied to gas estimates and prices, in percent
    pub gas_buffer_percent: u64,
    /// The number of confirmations to wait for on each transaction
    pub confirmations: u64,
    /// The ledger key of the proxy admin that owns every deployed proxy
    pub proxy_admin_key: String,
    /// The artifact name of the upgradeable proxy
    pub proxy_contract: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            gas_buffer_percent: GAS_BUFFER_PERCENT,
            confirmations: NUM_DEPLOY_CONFIRMATIONS,
            proxy_admin_key: PROXY_ADMIN_KEY.to_string(),
            proxy_contract: PROXY_CONTRACT_NAME.to_string(),
        }
    }
}

/// The deployment lifecycle of a single component
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentState {
    /// Nothing has been recorded for the component
    NotDeployed,
    /// The component's creation transaction is in flight
    Deploying,
    /// The component is live and recorded in the ledger
    Deployed,
    /// An upgradeable component's implementation is deployed, its proxy is not
    ImplementationStaged,
    /// The proxy is being deployed or pointed at a new implementation
    Wiring,
    /// The proxy has been pointed at a new implementation
    Upgraded,
}

impl Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentState::NotDeployed => write!(f, "not-deployed"),
            DeploymentState::Deploying => write!(f, "deploying"),
            DeploymentState::Deployed => write!(f, "deployed"),
            DeploymentState::ImplementationStaged => write!(f, "implementation-staged"),
            DeploymentState::Wiring => write!(f, "wiring"),
            DeploymentState::Upgraded => write!(f, "upgraded"),
        }
    }
}
