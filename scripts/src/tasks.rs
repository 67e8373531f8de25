//! Deploy scripts for the market contracts.
//!
//! The market and price book deployers are constructed with the address of
//! the factory that will own them, before that factory exists. The factory's
//! address is predicted from the deployer's nonce, kept in the ledger until the
//! factory lands, and checked against wherever it actually landed.

use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use tracing::info;

use crate::{
    client::{CallEncoder, ChainClient},
    constants::{
        MARKET_DEPLOYER, MARKET_FACTORY, MARKET_ROUTER, ORDER_CANCELER, PRICE_BOOK_DEPLOYER,
    },
    errors::ScriptError,
    ledger::forward_reference_key,
    orchestrator::{check_address, DeploymentOrchestrator},
    predict::predict_address,
    solidity::prepareChangeOwnerCall,
    types::DeployOptions,
    utils::address_array_arg,
};

/// Parameters of the market factory deployment
#[derive(Clone, Debug, Default)]
pub struct FactoryParams {
    /// The DAO treasury receiving protocol fees, the deployer if absent
    pub treasury: Option<Address>,
    /// The quote tokens registered with the factory at construction
    pub quote_tokens: Vec<Address>,
    /// The account the factory's ownership is handed to once deployed
    pub owner: Option<Address>,
    /// The nonce the deployer must be at before anything is sent
    pub expected_nonce: Option<u64>,
}

/// Deploy the order canceler, the market and price book deployers, and the
/// market factory, returning the factory's address
pub async fn deploy_factory<C: ChainClient, E: CallEncoder>(
    orchestrator: &mut DeploymentOrchestrator<C, E>,
    params: FactoryParams,
) -> Result<Address, ScriptError> {
    if let Some(expected) = params.expected_nonce {
        let actual = orchestrator.nonce().await?;
        if actual != expected {
            return Err(ScriptError::NonceMismatch { expected, actual });
        }
    }

    let canceler = orchestrator
        .deploy(ORDER_CANCELER, &[], DeployOptions::default())
        .await?;

    let computed_factory = factory_forward_reference(orchestrator).await?;
    let factory_arg = [computed_factory.to_string()];
    let market_deployer = orchestrator
        .deploy(MARKET_DEPLOYER, &factory_arg, DeployOptions::default())
        .await?;
    let price_book_deployer = orchestrator
        .deploy(PRICE_BOOK_DEPLOYER, &factory_arg, DeployOptions::default())
        .await?;

    let factory_args = [
        market_deployer.to_string(),
        price_book_deployer.to_string(),
        params.treasury.unwrap_or(orchestrator.signer_address()).to_string(),
        canceler.to_string(),
        address_array_arg(&params.quote_tokens),
    ];
    let factory = orchestrator
        .deploy(
            MARKET_FACTORY,
            &factory_args,
            DeployOptions::expecting(computed_factory),
        )
        .await?;
    orchestrator.remove_address(&forward_reference_key(MARKET_FACTORY));

    if let Some(owner) = params.owner {
        let calldata = prepareChangeOwnerCall { newOwner: owner }.abi_encode();
        let receipt = orchestrator
            .client()
            .send(factory, calldata.into())
            .await?;
        info!("Prepare change owner to {owner} on tx {}", receipt.tx_hash);
    }

    Ok(factory)
}

/// The address the market factory must land at.
///
/// The factory is deployed after whichever of its deployers are still
/// missing, which are constructed with its address. The first prediction is
/// recorded in the ledger until the factory lands, so a resumed run builds the
/// remaining deployers against the same address and fails before sending
/// anything if the deployer's nonce no longer leads there. An already
/// recorded factory is checked against that prediction too.
async fn factory_forward_reference<C: ChainClient, E: CallEncoder>(
    orchestrator: &mut DeploymentOrchestrator<C, E>,
) -> Result<Address, ScriptError> {
    let key = forward_reference_key(MARKET_FACTORY);
    let stored = orchestrator.ledger().get(&key);

    if let Some(factory) = orchestrator.ledger().get(MARKET_FACTORY) {
        if let Some(computed) = stored {
            check_address(MARKET_FACTORY, computed, factory)?;
        }
        return Ok(factory);
    }

    let pending = [MARKET_DEPLOYER, PRICE_BOOK_DEPLOYER]
        .into_iter()
        .filter(|name| !orchestrator.ledger().has(name))
        .count() as u64;
    let nonce = orchestrator.nonce().await?;
    let factory_nonce = nonce.checked_add(pending).ok_or_else(|| {
        ScriptError::Prediction(format!("{nonce} + {pending} deployments overflows"))
    })?;
    let predicted = predict_address(orchestrator.signer_address(), factory_nonce)?;

    match stored {
        Some(computed) => {
            check_address(MARKET_FACTORY, computed, predicted)?;
            info!("Resuming with computed {MARKET_FACTORY} address: {computed}");
            Ok(computed)
        }
        None => {
            info!("Computed {MARKET_FACTORY} address: {predicted}");
            orchestrator.record_address(&key, predicted);
            Ok(predicted)
        }
    }
}

/// Deploy the market router against the recorded market factory
pub async fn deploy_router<C: ChainClient, E: CallEncoder>(
    orchestrator: &mut DeploymentOrchestrator<C, E>,
) -> Result<Address, ScriptError> {
    let factory = orchestrator.address(MARKET_FACTORY)?;
    orchestrator
        .deploy(
            MARKET_ROUTER,
            &[factory.to_string()],
            DeployOptions::default(),
        )
        .await
}

/// Deploy the factory and then the router
pub async fn deploy_all<C: ChainClient, E: CallEncoder>(
    orchestrator: &mut DeploymentOrchestrator<C, E>,
    params: FactoryParams,
) -> Result<(), ScriptError> {
    deploy_factory(orchestrator, params).await?;
    deploy_router(orchestrator).await?;
    Ok(())
}
