//! The deployment orchestrator: deploys each named component at most once,
//! records it in the ledger, and drives proxied deployments and upgrades.
//!
//! A session owns the network's [`Ledger`] for its whole lifetime and flushes
//! it when dropped, so an error anywhere in a deploy script still leaves the
//! ledger describing every step that was confirmed before it. Re-running the
//! script then skips those steps.

use alloy_primitives::{hex, utils::format_ether, Address, Bytes};
use tracing::{debug, error, info, warn};

use crate::{
    client::{CallEncoder, ChainClient},
    errors::ScriptError,
    ledger::{implementation_key, Ledger},
    predict::predict_address,
    types::{
        DeployConfig, DeployOptions, DeployTransaction, DeploymentState, GasParams, MethodCall,
        Receipt,
    },
    utils::{apply_gas_buffer, buffered_gas_limit},
};

/// A deployment session against a single network
pub struct DeploymentOrchestrator<C: ChainClient, E: CallEncoder> {
    /// The chain the session deploys to
    client: C,
    /// The encoder for creation code and calldata
    encoder: E,
    /// The network's deployments ledger
    ledger: Ledger,
    /// The session settings
    config: DeployConfig,
}

impl<C: ChainClient, E: CallEncoder> DeploymentOrchestrator<C, E> {
    /// Start a session over an already loaded ledger
    pub fn new(client: C, encoder: E, ledger: Ledger, config: DeployConfig) -> Self {
        Self {
            client,
            encoder,
            ledger,
            config,
        }
    }

    /// The chain client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The session's ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The deployer account
    pub fn signer_address(&self) -> Address {
        self.client.address()
    }

    /// The deployer's current nonce
    pub async fn nonce(&self) -> Result<u64, ScriptError> {
        self.client.nonce().await
    }

    /// The address of a deployed component, failing if it was never deployed
    pub fn address(&self, name: &str) -> Result<Address, ScriptError> {
        self.ledger.must_get(name)
    }

    /// Forget a component so that the next deploy of it starts from scratch
    pub fn remove_address(&mut self, name: &str) -> Option<Address> {
        self.ledger.remove(name)
    }

    /// Record `address` under `name` without deploying anything
    pub fn record_address(&mut self, name: &str, address: Address) {
        self.ledger.set(name, address);
    }

    /// The persisted deployment state of a component
    pub fn state(&self, name: &str) -> DeploymentState {
        if self.ledger.has(name) {
            DeploymentState::Deployed
        } else if self.ledger.has(&implementation_key(name)) {
            DeploymentState::ImplementationStaged
        } else {
            DeploymentState::NotDeployed
        }
    }

    /// Flush the ledger to disk
    pub fn save(&mut self) -> Result<(), ScriptError> {
        self.ledger.persist()
    }

    // --------------
    // | Deployment |
    // --------------

    /// Ensure `name` is deployed, deploying it with constructor `args` if the
    /// ledger has no record of it, and return its address.
    ///
    /// Upgradeable components are deployed as an implementation followed by
    /// a proxy. If a previous session deployed the implementation but failed
    /// before the proxy, the staged implementation is reused.
    pub async fn deploy(
        &mut self,
        name: &str,
        args: &[String],
        options: DeployOptions,
    ) -> Result<Address, ScriptError> {
        if let Some(address) = self.ledger.get(name) {
            info!("{name} already deployed with {address}");
            return Ok(address);
        }

        self.log_deployer().await?;
        let address = match &options.upgradeable {
            Some(upgradeable) => {
                self.deploy_proxied(name, args, upgradeable.init.as_ref(), options.expected_address)
                    .await?
            }
            None => {
                info!("Deploying {name}...");
                let code = self.encoder.encode_deploy(name, args)?;
                let (address, receipt) =
                    self.send_deploy(name, code, options.expected_address).await?;
                info!("Deployed {name}: {address} on tx {}", receipt.tx_hash);
                self.ledger.set(name, address);
                address
            }
        };

        debug!("{name}: {}", DeploymentState::Deployed);
        if let Some(expected) = options.expected_address {
            check_address(name, expected, address)?;
        }

        Ok(address)
    }

    /// Deploy an implementation and a proxy in front of it
    async fn deploy_proxied(
        &mut self,
        name: &str,
        args: &[String],
        init: Option<&MethodCall>,
        expected_address: Option<Address>,
    ) -> Result<Address, ScriptError> {
        info!("Deploying {name} with Proxy...");

        // Encode everything up front so a bad initializer spends nothing
        let init_data = match init {
            Some(call) => self.encoder.encode_call(name, call)?,
            None => Bytes::new(),
        };
        let proxy_admin = self.ledger.must_get(&self.config.proxy_admin_key)?;

        let impl_key = implementation_key(name);
        let implementation = match self.ledger.get(&impl_key) {
            Some(implementation) => {
                warn!("{name} Implementation Already Deployed with: {implementation}");
                implementation
            }
            None => {
                let code = self.encoder.encode_deploy(name, args)?;
                let (implementation, receipt) = self.send_deploy(name, code, None).await?;
                info!(
                    "Deployed {name} Implementation: {implementation} on tx {}",
                    receipt.tx_hash
                );
                self.ledger.set(&impl_key, implementation);
                implementation
            }
        };
        debug!("{name}: {}", DeploymentState::ImplementationStaged);

        info!("Deploying Proxy...");
        debug!("{name}: {}", DeploymentState::Wiring);
        let proxy_args = [
            implementation.to_string(),
            proxy_admin.to_string(),
            hex::encode_prefixed(&init_data),
        ];
        let proxy_contract = self.config.proxy_contract.clone();
        let code = self.encoder.encode_deploy(&proxy_contract, &proxy_args)?;
        let (proxy, receipt) = self.send_deploy(name, code, expected_address).await?;
        info!("Deployed {name}: {proxy} on tx {}", receipt.tx_hash);

        self.ledger.set(name, proxy);
        self.ledger.remove(&impl_key);
        Ok(proxy)
    }

    /// Upgrade the proxied component `name` to a new implementation, deploying
    /// one with constructor `args` unless `new_implementation` is given, and
    /// return the implementation the proxy now points at.
    ///
    /// The ledger entry of `name` keeps pointing at the proxy.
    pub async fn upgrade(
        &mut self,
        name: &str,
        args: &[String],
        new_implementation: Option<Address>,
        call: Option<MethodCall>,
    ) -> Result<Address, ScriptError> {
        let proxy = self
            .ledger
            .get(name)
            .ok_or_else(|| ScriptError::NotDeployed(name.to_string()))?;
        let proxy_admin = self.ledger.must_get(&self.config.proxy_admin_key)?;

        let past_implementation = match self.client.implementation(proxy_admin, proxy).await {
            Ok(implementation) => implementation,
            Err(e) => {
                error!("Failed to load implementation of {name}({proxy})");
                return Err(match e {
                    ScriptError::Introspection(_) => e,
                    other => ScriptError::Introspection(other.to_string()),
                });
            }
        };

        let init_data = match &call {
            Some(call) => self.encoder.encode_call(name, call)?,
            None => Bytes::new(),
        };

        let implementation = match new_implementation {
            Some(implementation) => implementation,
            None => {
                self.log_deployer().await?;
                let code = self.encoder.encode_deploy(name, args)?;
                let (implementation, receipt) = self.send_deploy(name, code, None).await?;
                info!(
                    "Deployed {name} Implementation: {implementation} on tx {}",
                    receipt.tx_hash
                );
                implementation
            }
        };

        debug!("{name}: {}", DeploymentState::Wiring);
        let receipt = if init_data.is_empty() {
            self.client
                .upgrade(proxy_admin, proxy, implementation)
                .await?
        } else {
            self.client
                .upgrade_and_call(proxy_admin, proxy, implementation, init_data)
                .await?
        };
        info!(
            "Upgrade {name}({proxy}) from {past_implementation} to {implementation} on tx {}",
            receipt.tx_hash
        );
        debug!("{name}: {}", DeploymentState::Upgraded);

        Ok(implementation)
    }

    /// Call `call` on the deployed component `name`
    pub async fn call(&mut self, name: &str, call: &MethodCall) -> Result<Receipt, ScriptError> {
        let address = self.ledger.must_get(name)?;
        let calldata = self.encoder.encode_call(name, call)?;
        self.client.send(address, calldata).await
    }

    // -----------
    // | Helpers |
    // -----------

    /// Submit a creation transaction with buffered gas at the deployer's
    /// current nonce, returning the created contract's address
    async fn send_deploy(
        &self,
        name: &str,
        code: Bytes,
        expected_address: Option<Address>,
    ) -> Result<(Address, Receipt), ScriptError> {
        let from = self.client.address();
        let nonce = self.client.nonce().await?;
        let predicted = predict_address(from, nonce)?;
        debug!("{name}: {} at nonce {nonce}, predicted {predicted}", DeploymentState::Deploying);

        // Nothing has been sent yet, so a wrong forward reference costs nothing here
        if let Some(expected) = expected_address {
            check_address(name, expected, predicted)?;
        }

        let mut tx = DeployTransaction {
            from,
            nonce,
            code,
            gas: None,
        };
        let percent = self.config.gas_buffer_percent;
        let gas_price = apply_gas_buffer(self.client.gas_price().await?, percent);
        let gas_limit = buffered_gas_limit(self.client.estimate_gas(&tx).await?, percent);
        debug!("Deploying {name} with gas limit {gas_limit} at price {gas_price}");
        tx.gas = Some(GasParams {
            gas_limit,
            gas_price,
        });

        let receipt = self.client.submit(tx).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::Broadcast(format!(
                "receipt of tx {} carries no contract address",
                receipt.tx_hash
            ))
        })?;

        if address != predicted {
            warn!("{name} deployed at {address}, predicted {predicted}");
        }

        Ok((address, receipt))
    }

    /// Log the deployer account and its balance
    async fn log_deployer(&self) -> Result<(), ScriptError> {
        let balance = self.client.balance().await?;
        info!("Deployer: {}", self.client.address());
        info!("Balance : {}", format_ether(balance));
        Ok(())
    }
}

impl<C: ChainClient, E: CallEncoder> Drop for DeploymentOrchestrator<C, E> {
    fn drop(&mut self) {
        if !self.ledger.is_dirty() {
            return;
        }

        if let Err(e) = self.ledger.persist() {
            error!(
                "Failed to save deployments to {}: {e}",
                self.ledger.path().display()
            );
        }
    }
}

/// Fail if `name` was deployed, or is about to be deployed, somewhere other
/// than the caller expected
pub(crate) fn check_address(
    name: &str,
    expected: Address,
    actual: Address,
) -> Result<(), ScriptError> {
    // Addresses compare byte-wise, so hex casing never matters here
    if expected != actual {
        return Err(ScriptError::AddressMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }

    Ok(())
}
