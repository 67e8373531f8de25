use alloy_primitives::Address;
use deploy_scripts::{
    errors::ScriptError,
    predict::predict_address,
    types::{DeployConfig, DeployOptions, DeploymentState},
};
use eyre::Result;
use tests::{
    mock_chain::{MockChain, ESTIMATED_GAS, GAS_PRICE},
    utils::{
        global_setup, open_session, open_session_with_config, random_address, read_ledger,
        read_ledger_json,
    },
};

// ---------------
// | IDEMPOTENCE |
// ---------------

#[tokio::test]
async fn test_deploy_records_address() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let address = session
        .deploy("OrderCanceler", &[], DeployOptions::default())
        .await?;

    assert_eq!(address, chain.sender().create(0));
    assert_eq!(session.address("OrderCanceler")?, address);
    assert_eq!(session.state("OrderCanceler"), DeploymentState::Deployed);
    assert!(session.ledger().is_dirty());

    Ok(())
}

#[tokio::test]
async fn test_deploy_twice_submits_once() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let first = session
        .deploy("OrderCanceler", &[], DeployOptions::default())
        .await?;
    let second = session
        .deploy("OrderCanceler", &["ignored".to_string()], DeployOptions::default())
        .await?;

    assert_eq!(first, second);
    assert_eq!(chain.deployments().len(), 1);
    assert_eq!(chain.current_nonce(), 1);

    Ok(())
}

#[tokio::test]
async fn test_rerun_skips_recorded_components() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();

    let address = {
        let mut session = open_session(dir.path(), &chain)?;
        let address = session
            .deploy("OrderCanceler", &[], DeployOptions::default())
            .await?;
        session.save()?;
        address
    };

    let mut session = open_session(dir.path(), &chain)?;
    let skipped = session
        .deploy("OrderCanceler", &[], DeployOptions::default())
        .await?;

    assert_eq!(skipped, address);
    assert_eq!(chain.deployments().len(), 1);
    assert!(!session.ledger().is_dirty());

    Ok(())
}

#[tokio::test]
async fn test_removed_component_is_redeployed() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let first = session
        .deploy("OrderCanceler", &[], DeployOptions::default())
        .await?;
    assert_eq!(session.remove_address("OrderCanceler"), Some(first));
    assert_eq!(session.state("OrderCanceler"), DeploymentState::NotDeployed);

    let second = session
        .deploy("OrderCanceler", &[], DeployOptions::default())
        .await?;

    assert_ne!(first, second);
    assert_eq!(chain.deployments().len(), 2);

    Ok(())
}

// ---------------
// | TRANSACTION |
// ---------------

#[tokio::test]
async fn test_gas_is_buffered() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    session
        .deploy("OrderCanceler", &[], DeployOptions::default())
        .await?;

    let deployment = &chain.deployments()[0];
    assert_eq!(deployment.gas.gas_limit, ESTIMATED_GAS * 130 / 100);
    assert_eq!(deployment.gas.gas_price, GAS_PRICE * 130 / 100);

    Ok(())
}

#[tokio::test]
async fn test_gas_buffer_follows_config() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let config = DeployConfig {
        gas_buffer_percent: 150,
        ..Default::default()
    };
    let mut session = open_session_with_config(dir.path(), &chain, config)?;

    session
        .deploy("OrderCanceler", &[], DeployOptions::default())
        .await?;

    let deployment = &chain.deployments()[0];
    assert_eq!(deployment.gas.gas_limit, ESTIMATED_GAS * 150 / 100);
    assert_eq!(deployment.gas.gas_price, GAS_PRICE * 150 / 100);

    Ok(())
}

#[tokio::test]
async fn test_constructor_args_are_passed_through() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let factory = random_address().to_string();
    session
        .deploy("MarketRouter", &[factory.clone()], DeployOptions::default())
        .await?;

    let deployment = &chain.deployments()[0];
    assert_eq!(deployment.contract, "MarketRouter");
    assert_eq!(deployment.args, vec![factory]);

    Ok(())
}

// --------------------
// | EXPECTED ADDRESS |
// --------------------

#[tokio::test]
async fn test_forward_reference_resolves() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let nonce = session.nonce().await?;
    let computed = predict_address(session.signer_address(), nonce + 1)?;

    session
        .deploy("MarketDeployer", &[computed.to_string()], DeployOptions::default())
        .await?;
    let factory = session
        .deploy("MarketFactory", &[], DeployOptions::expecting(computed))
        .await?;

    assert_eq!(factory, computed);
    assert_eq!(chain.deployments()[0].args, vec![computed.to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_wrong_expected_address_sends_nothing() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let res = session
        .deploy(
            "MarketFactory",
            &[],
            DeployOptions::expecting(random_address()),
        )
        .await;

    assert!(matches!(res, Err(ScriptError::AddressMismatch { .. })));
    assert!(chain.deployments().is_empty());
    assert!(!session.ledger().has("MarketFactory"));

    Ok(())
}

#[tokio::test]
async fn test_intervening_transaction_is_caught() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let computed = predict_address(chain.sender(), 1)?;
    session
        .deploy("MarketDeployer", &[computed.to_string()], DeployOptions::default())
        .await?;

    // Another transaction from the deployer consumes the predicted nonce
    chain.bump_nonce(1);
    let res = session
        .deploy("MarketFactory", &[], DeployOptions::expecting(computed))
        .await;

    assert!(matches!(res, Err(ScriptError::AddressMismatch { .. })));
    assert_eq!(chain.deployments().len(), 1);
    assert!(session.ledger().has("MarketDeployer"));

    Ok(())
}

#[tokio::test]
async fn test_misplaced_deployment_is_recorded_and_reported() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let computed = predict_address(chain.sender(), 0)?;
    let actual = random_address();
    chain.displace_next_deployment(actual);

    {
        let mut session = open_session(dir.path(), &chain)?;
        let res = session
            .deploy("MarketFactory", &[], DeployOptions::expecting(computed))
            .await;

        match res {
            Err(ScriptError::AddressMismatch {
                name,
                expected,
                actual: landed,
            }) => {
                assert_eq!(name, "MarketFactory");
                assert_eq!(expected, computed.to_string());
                assert_eq!(landed, actual.to_string());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    // The contract exists on chain, so it stays recorded
    assert_eq!(read_ledger(dir.path())?.get("MarketFactory"), Some(actual));

    Ok(())
}

// ---------------
// | PERSISTENCE |
// ---------------

#[tokio::test]
async fn test_ledger_persisted_on_drop_after_failure() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    chain.fail_submission(1);

    let canceler = {
        let mut session = open_session(dir.path(), &chain)?;
        let canceler = session
            .deploy("OrderCanceler", &[], DeployOptions::default())
            .await?;
        let res = session
            .deploy("MarketRouter", &[], DeployOptions::default())
            .await;
        assert!(matches!(res, Err(ScriptError::Broadcast(_))));
        canceler
    };

    let ledger = read_ledger(dir.path())?;
    assert_eq!(ledger.get("OrderCanceler"), Some(canceler));
    assert!(!ledger.has("MarketRouter"));
    assert_eq!(ledger.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_clean_session_writes_nothing() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();

    {
        let session = open_session(dir.path(), &chain)?;
        assert!(session.ledger().is_empty());
    }

    assert!(!read_ledger(dir.path())?.path().exists());

    Ok(())
}

#[tokio::test]
async fn test_saved_ledger_is_flat_json() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let canceler = session
        .deploy("OrderCanceler", &[], DeployOptions::default())
        .await?;
    session.save()?;

    let json = read_ledger_json(dir.path());
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 1);
    let recorded: Address = object["OrderCanceler"].as_str().unwrap().parse()?;
    assert_eq!(recorded, canceler);

    Ok(())
}
