//! The chain capabilities a deployment session depends on.
//!
//! The orchestrator only ever talks to the chain through these traits, so the
//! same flows run against a live RPC endpoint or an in-memory test chain.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use crate::{
    errors::ScriptError,
    types::{DeployTransaction, MethodCall, Receipt},
};

/// Signs, submits and waits on transactions from the deployer account
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// The deployer account
    fn address(&self) -> Address;

    /// The number of transactions the deployer has sent so far
    async fn nonce(&self) -> Result<u64, ScriptError>;

    /// The deployer's balance, in wei
    async fn balance(&self) -> Result<U256, ScriptError>;

    /// Submit a creation transaction and wait for it to be confirmed
    async fn submit(&self, tx: DeployTransaction) -> Result<Receipt, ScriptError>;

    /// Call a method on a deployed contract and wait for it to be confirmed
    async fn send(&self, to: Address, calldata: Bytes) -> Result<Receipt, ScriptError>;
}

/// Estimates gas for creation transactions
#[async_trait]
pub trait GasOracle: Send + Sync {
    /// Estimate the gas used by a creation transaction
    async fn estimate_gas(&self, tx: &DeployTransaction) -> Result<u64, ScriptError>;

    /// The current gas price, in wei
    async fn gas_price(&self) -> Result<u128, ScriptError>;
}

/// Calls on the proxy admin contract that owns the upgradeable proxies
#[async_trait]
pub trait ProxyAdministrator: Send + Sync {
    /// The implementation `proxy` currently delegates to
    async fn implementation(&self, admin: Address, proxy: Address)
        -> Result<Address, ScriptError>;

    /// Point `proxy` at `implementation`
    async fn upgrade(
        &self,
        admin: Address,
        proxy: Address,
        implementation: Address,
    ) -> Result<Receipt, ScriptError>;

    /// Point `proxy` at `implementation` and call it with `data` through the proxy
    async fn upgrade_and_call(
        &self,
        admin: Address,
        proxy: Address,
        implementation: Address,
        data: Bytes,
    ) -> Result<Receipt, ScriptError>;
}

/// Encodes creation code and calldata against a contract's interface
pub trait CallEncoder: Send + Sync {
    /// The creation code of `contract` with `args` ABI-encoded as constructor arguments
    fn encode_deploy(&self, contract: &str, args: &[String]) -> Result<Bytes, ScriptError>;

    /// Calldata for `call` against the interface of `contract`
    fn encode_call(&self, contract: &str, call: &MethodCall) -> Result<Bytes, ScriptError>;
}

/// Everything a deployment session needs from the chain
pub trait ChainClient: Broadcaster + GasOracle + ProxyAdministrator {}

impl<T: Broadcaster + GasOracle + ProxyAdministrator> ChainClient for T {}
