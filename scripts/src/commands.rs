//! Implementations of the various deploy scripts

use alloy::providers::Provider;
use tracing::info;

use crate::{
    artifacts::ArtifactEncoder,
    cli::{DeployArgs, FactoryArgs, PredictArgs, RemoveArgs, SessionArgs, UpgradeArgs},
    constants::PROD_FACTORY_DEPLOYER_NONCE,
    errors::ScriptError,
    ledger::Ledger,
    orchestrator::DeploymentOrchestrator,
    predict::predict_address,
    rpc::{setup_client, RpcClient},
    tasks::{self, FactoryParams},
    types::{DeployConfig, DeployOptions, UpgradeableOptions},
    utils::{method_call, parse_address},
};

/// Print the predicted deployment address
pub fn predict(args: PredictArgs) -> Result<(), ScriptError> {
    let sender = parse_address(&args.sender)?;
    let address = predict_address(sender, args.nonce)?;
    println!("{address}");
    Ok(())
}

/// Print every recorded deployment of the network
pub fn show(session: &SessionArgs) -> Result<(), ScriptError> {
    let ledger = Ledger::load(&session.deployments_dir, &session.network)?;
    if ledger.is_empty() {
        info!("No deployments recorded for {}", session.network);
    }

    for (name, address) in ledger.entries() {
        println!("{name}: {address}");
    }
    Ok(())
}

/// Remove a ledger entry
pub fn remove(args: RemoveArgs, session: &SessionArgs) -> Result<(), ScriptError> {
    let mut ledger = Ledger::load(&session.deployments_dir, &session.network)?;
    match ledger.remove(&args.name) {
        Some(address) => info!("Removed {} ({address})", args.name),
        None => info!("{} is not recorded", args.name),
    }
    ledger.persist()
}

/// Deploy a single contract
pub async fn deploy(args: DeployArgs, session: &SessionArgs) -> Result<(), ScriptError> {
    let options = DeployOptions {
        upgradeable: args.upgradeable.then(|| UpgradeableOptions {
            init: method_call(args.init_method, args.init_args),
        }),
        expected_address: args
            .expect_address
            .as_deref()
            .map(parse_address)
            .transpose()?,
    };

    let mut orchestrator = open_session(session).await?;
    orchestrator
        .deploy(&args.contract, &args.args, options)
        .await?;
    orchestrator.save()
}

/// Upgrade a proxied contract
pub async fn upgrade(args: UpgradeArgs, session: &SessionArgs) -> Result<(), ScriptError> {
    let implementation = args
        .implementation
        .as_deref()
        .map(parse_address)
        .transpose()?;
    let call = method_call(args.call_method, args.call_args);

    let mut orchestrator = open_session(session).await?;
    orchestrator
        .upgrade(&args.contract, &args.args, implementation, call)
        .await?;
    orchestrator.save()
}

/// Deploy the market factory and its deployers
pub async fn deploy_factory(args: FactoryArgs, session: &SessionArgs) -> Result<(), ScriptError> {
    let params = factory_params(args)?;
    let mut orchestrator = open_session(session).await?;
    tasks::deploy_factory(&mut orchestrator, params).await?;
    orchestrator.save()
}

/// Deploy the market router
pub async fn deploy_router(session: &SessionArgs) -> Result<(), ScriptError> {
    let mut orchestrator = open_session(session).await?;
    tasks::deploy_router(&mut orchestrator).await?;
    orchestrator.save()
}

/// Deploy every market contract
pub async fn deploy_all(args: FactoryArgs, session: &SessionArgs) -> Result<(), ScriptError> {
    let params = factory_params(args)?;
    let mut orchestrator = open_session(session).await?;
    tasks::deploy_all(&mut orchestrator, params).await?;
    orchestrator.save()
}

/// Connect to the network and load its ledger.
///
/// The ledger is saved when the returned session is dropped, whichever way
/// the command exits.
async fn open_session(
    session: &SessionArgs,
) -> Result<DeploymentOrchestrator<RpcClient<impl Provider>, ArtifactEncoder>, ScriptError> {
    let priv_key = session.priv_key.as_deref().ok_or_else(|| {
        ScriptError::ClientInitialization("no deployer private key provided".to_string())
    })?;

    let config = DeployConfig::default();
    let ledger = Ledger::load(&session.deployments_dir, &session.network)?;
    let client = setup_client(priv_key, &session.rpc_url, &config).await?;
    info!(
        "Deploying to {} (chain {}), recording in {}",
        session.network,
        client.chain_id(),
        ledger.path().display()
    );

    let encoder = ArtifactEncoder::new(&session.artifacts_dir);
    Ok(DeploymentOrchestrator::new(client, encoder, ledger, config))
}

/// Resolve the factory deployment parameters, applying the production checks
fn factory_params(args: FactoryArgs) -> Result<FactoryParams, ScriptError> {
    let owner = args.owner.as_deref().map(parse_address).transpose()?;
    if args.prod && owner.is_none() {
        return Err(ScriptError::CalldataConstruction(
            "--owner is required for production deployments".to_string(),
        ));
    }

    let expected_nonce = match args.expect_nonce {
        Some(nonce) => Some(nonce),
        None if args.prod => Some(PROD_FACTORY_DEPLOYER_NONCE),
        None => None,
    };

    Ok(FactoryParams {
        treasury: args.treasury.as_deref().map(parse_address).transpose()?,
        quote_tokens: args
            .quote_tokens
            .iter()
            .map(|token| parse_address(token))
            .collect::<Result<_, _>>()?,
        owner,
        expected_nonce,
    })
}
