//! Chain capabilities backed by a JSON-RPC endpoint and a local signer

use std::str::FromStr;

use alloy::{
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    providers::{Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use crate::{
    client::{Broadcaster, GasOracle, ProxyAdministrator},
    errors::ScriptError,
    solidity::IProxyAdmin,
    types::{DeployConfig, DeployTransaction, Receipt},
    utils::{apply_gas_buffer, buffered_gas_limit},
};

/// A deployer account connected to an RPC endpoint
pub struct RpcClient<P> {
    /// The provider, with the deployer's wallet attached
    provider: P,
    /// The deployer account
    sender: Address,
    /// The chain ID transactions are signed for
    chain_id: u64,
    /// The number of confirmations to wait for on each transaction
    confirmations: u64,
    /// The buffer applied to the gas of contract calls, in percent
    gas_buffer_percent: u64,
}

/// Sets up a client signing with `priv_key` against the node at `rpc_url`,
/// confirming and buffering transactions as `config` says
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
    config: &DeployConfig,
) -> Result<RpcClient<impl Provider>, ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let sender = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .on_builtin(rpc_url)
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    Ok(RpcClient {
        provider,
        sender,
        chain_id,
        confirmations: config.confirmations,
        gas_buffer_percent: config.gas_buffer_percent,
    })
}

impl<P: Provider> RpcClient<P> {
    /// The chain ID the client signs for
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Build a creation request from a deploy transaction
    fn deploy_request(&self, tx: &DeployTransaction) -> TransactionRequest {
        let request = TransactionRequest::default()
            .with_from(tx.from)
            .with_nonce(tx.nonce)
            .with_chain_id(self.chain_id)
            .with_deploy_code(tx.code.clone());

        match tx.gas {
            Some(gas) => request
                .with_gas_limit(gas.gas_limit)
                .with_gas_price(gas.gas_price),
            None => request,
        }
    }

    /// Send a request and wait for it to be confirmed successfully
    async fn send_request(&self, request: TransactionRequest) -> Result<Receipt, ScriptError> {
        let receipt: TransactionReceipt = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| ScriptError::Broadcast(e.to_string()))?
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| ScriptError::Broadcast(e.to_string()))?;

        if !ReceiptResponse::status(&receipt) {
            return Err(ScriptError::Broadcast(format!(
                "transaction {} reverted",
                receipt.transaction_hash
            )));
        }

        Ok(Receipt {
            tx_hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
        })
    }

    /// Send a contract call from the deployer, pinning its nonce and buffering its gas
    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<Receipt, ScriptError> {
        let nonce = self.nonce().await?;
        let request = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id)
            .with_input(calldata);

        let gas_price = apply_gas_buffer(self.gas_price().await?, self.gas_buffer_percent);
        let estimate = self
            .provider
            .estimate_gas(&request)
            .await
            .map_err(|e| ScriptError::Broadcast(e.to_string()))?;
        let gas_limit = buffered_gas_limit(estimate, self.gas_buffer_percent);
        debug!("Calling {to} with gas limit {gas_limit} at price {gas_price}");

        self.send_request(
            request
                .with_gas_limit(gas_limit)
                .with_gas_price(gas_price),
        )
        .await
    }
}

#[async_trait]
impl<P: Provider> Broadcaster for RpcClient<P> {
    fn address(&self) -> Address {
        self.sender
    }

    async fn nonce(&self) -> Result<u64, ScriptError> {
        self.provider
            .get_transaction_count(self.sender)
            .await
            .map_err(|e| ScriptError::NonceFetching(e.to_string()))
    }

    async fn balance(&self) -> Result<U256, ScriptError> {
        self.provider
            .get_balance(self.sender)
            .await
            .map_err(|e| ScriptError::Broadcast(e.to_string()))
    }

    async fn submit(&self, tx: DeployTransaction) -> Result<Receipt, ScriptError> {
        let request = self.deploy_request(&tx);
        self.send_request(request).await
    }

    async fn send(&self, to: Address, calldata: Bytes) -> Result<Receipt, ScriptError> {
        self.send_call(to, calldata).await
    }
}

#[async_trait]
impl<P: Provider> GasOracle for RpcClient<P> {
    async fn estimate_gas(&self, tx: &DeployTransaction) -> Result<u64, ScriptError> {
        let request = self.deploy_request(tx);
        self.provider
            .estimate_gas(&request)
            .await
            .map_err(|e| ScriptError::Broadcast(e.to_string()))
    }

    async fn gas_price(&self) -> Result<u128, ScriptError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ScriptError::Broadcast(e.to_string()))
    }
}

#[async_trait]
impl<P: Provider> ProxyAdministrator for RpcClient<P> {
    async fn implementation(
        &self,
        admin: Address,
        proxy: Address,
    ) -> Result<Address, ScriptError> {
        let proxy_admin = IProxyAdmin::new(admin, &self.provider);
        let implementation = proxy_admin
            .getProxyImplementation(proxy)
            .call()
            .await
            .map_err(|e| ScriptError::Introspection(e.to_string()))?
            ._0;

        Ok(implementation)
    }

    async fn upgrade(
        &self,
        admin: Address,
        proxy: Address,
        implementation: Address,
    ) -> Result<Receipt, ScriptError> {
        let calldata = IProxyAdmin::upgradeCall {
            proxy,
            implementation,
        }
        .abi_encode();
        self.send_call(admin, calldata.into()).await
    }

    async fn upgrade_and_call(
        &self,
        admin: Address,
        proxy: Address,
        implementation: Address,
        data: Bytes,
    ) -> Result<Receipt, ScriptError> {
        let calldata = IProxyAdmin::upgradeAndCallCall {
            proxy,
            implementation,
            data,
        }
        .abi_encode();
        self.send_call(admin, calldata.into()).await
    }
}
