use alloy_primitives::keccak256;
use deploy_scripts::{
    constants::{
        MARKET_DEPLOYER, MARKET_FACTORY, MARKET_ROUTER, ORDER_CANCELER, PRICE_BOOK_DEPLOYER,
        PROD_FACTORY_DEPLOYER_NONCE,
    },
    errors::ScriptError,
    ledger::forward_reference_key,
    tasks::{deploy_all, deploy_factory, deploy_router, FactoryParams},
};
use eyre::Result;
use tests::{
    mock_chain::{Call, Deployment, MockChain},
    utils::{global_setup, open_session, random_address, read_ledger},
};

// -----------
// | Helpers |
// -----------

/// The deployment of `contract` on `chain`
fn deployment_of(chain: &MockChain, contract: &str) -> Deployment {
    chain
        .deployments()
        .into_iter()
        .find(|deployment| deployment.contract == contract)
        .unwrap()
}

// -----------
// | FACTORY |
// -----------

#[tokio::test]
async fn test_factory_lands_at_computed_address() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let factory = deploy_factory(&mut session, FactoryParams::default()).await?;

    // Canceler, the two deployers, then the factory
    assert_eq!(factory, chain.sender().create(3));

    let market_deployer = deployment_of(&chain, MARKET_DEPLOYER);
    let price_book_deployer = deployment_of(&chain, PRICE_BOOK_DEPLOYER);
    assert_eq!(market_deployer.args, vec![factory.to_string()]);
    assert_eq!(price_book_deployer.args, vec![factory.to_string()]);

    let factory_args = deployment_of(&chain, MARKET_FACTORY).args;
    assert_eq!(
        factory_args,
        vec![
            market_deployer.address.to_string(),
            price_book_deployer.address.to_string(),
            chain.sender().to_string(),
            session.address(ORDER_CANCELER)?.to_string(),
            "[]".to_string(),
        ]
    );
    assert!(!session.ledger().has(&forward_reference_key(MARKET_FACTORY)));

    Ok(())
}

#[tokio::test]
async fn test_factory_params_are_passed_through() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let treasury = random_address();
    let quote_tokens = vec![random_address(), random_address()];
    let params = FactoryParams {
        treasury: Some(treasury),
        quote_tokens: quote_tokens.clone(),
        ..Default::default()
    };
    deploy_factory(&mut session, params).await?;

    let factory_args = deployment_of(&chain, MARKET_FACTORY).args;
    assert_eq!(factory_args[2], treasury.to_string());
    assert_eq!(
        factory_args[4],
        format!("[{},{}]", quote_tokens[0], quote_tokens[1])
    );

    Ok(())
}

#[tokio::test]
async fn test_factory_resumes_after_failure() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    // The factory itself fails
    chain.fail_submission(3);

    {
        let mut session = open_session(dir.path(), &chain)?;
        let res = deploy_factory(&mut session, FactoryParams::default()).await;
        assert!(matches!(res, Err(ScriptError::Broadcast(_))));
    }

    let mut session = open_session(dir.path(), &chain)?;
    let factory = deploy_factory(&mut session, FactoryParams::default()).await?;

    // The deployers were built against the address the factory now lands at
    assert_eq!(chain.deployments().len(), 4);
    assert_eq!(
        deployment_of(&chain, MARKET_DEPLOYER).args,
        vec![factory.to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn test_factory_resume_detects_consumed_nonce() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    // The price book deployer fails after the market deployer landed
    chain.fail_submission(2);

    {
        let mut session = open_session(dir.path(), &chain)?;
        let res = deploy_factory(&mut session, FactoryParams::default()).await;
        assert!(matches!(res, Err(ScriptError::Broadcast(_))));
    }
    let computed = chain.sender().create(3);
    assert_eq!(
        deployment_of(&chain, MARKET_DEPLOYER).args,
        vec![computed.to_string()]
    );

    // A reverted transaction consumed a nonce in between
    chain.bump_nonce(1);
    let mut session = open_session(dir.path(), &chain)?;
    let res = deploy_factory(&mut session, FactoryParams::default()).await;

    match res {
        Err(ScriptError::AddressMismatch {
            name,
            expected,
            actual,
        }) => {
            assert_eq!(name, MARKET_FACTORY);
            assert_eq!(expected, computed.to_string());
            assert_eq!(actual, chain.sender().create(4).to_string());
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(chain.deployments().len(), 2);
    assert_eq!(
        session.ledger().get(&forward_reference_key(MARKET_FACTORY)),
        Some(computed)
    );

    Ok(())
}

#[tokio::test]
async fn test_misplaced_factory_is_reported_on_rerun() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    // The factory itself fails, then lands elsewhere on the next attempt
    chain.fail_submission(3);

    {
        let mut session = open_session(dir.path(), &chain)?;
        let res = deploy_factory(&mut session, FactoryParams::default()).await;
        assert!(matches!(res, Err(ScriptError::Broadcast(_))));
    }

    let misplaced = random_address();
    chain.displace_next_deployment(misplaced);
    for _ in 0..2 {
        let mut session = open_session(dir.path(), &chain)?;
        let res = deploy_factory(&mut session, FactoryParams::default()).await;
        assert!(matches!(res, Err(ScriptError::AddressMismatch { .. })));
    }

    // Recorded where it landed, deployed only once
    assert_eq!(read_ledger(dir.path())?.get(MARKET_FACTORY), Some(misplaced));
    assert_eq!(chain.deployments().len(), 4);

    Ok(())
}

#[tokio::test]
async fn test_factory_nonce_overflow() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    chain.bump_nonce(u64::MAX - 1);
    let mut session = open_session(dir.path(), &chain)?;

    let res = deploy_factory(&mut session, FactoryParams::default()).await;

    assert!(matches!(res, Err(ScriptError::Prediction(_))));
    assert_eq!(chain.deployments().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_prod_deploy_checks_nonce() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let params = FactoryParams {
        owner: Some(random_address()),
        expected_nonce: Some(PROD_FACTORY_DEPLOYER_NONCE),
        ..Default::default()
    };
    let res = deploy_factory(&mut session, params).await;

    assert!(matches!(
        res,
        Err(ScriptError::NonceMismatch {
            expected: PROD_FACTORY_DEPLOYER_NONCE,
            actual: 0,
        })
    ));
    assert!(chain.deployments().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_prod_deploy_hands_over_ownership() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    chain.bump_nonce(PROD_FACTORY_DEPLOYER_NONCE);
    let mut session = open_session(dir.path(), &chain)?;

    let owner = random_address();
    let params = FactoryParams {
        owner: Some(owner),
        expected_nonce: Some(PROD_FACTORY_DEPLOYER_NONCE),
        ..Default::default()
    };
    let factory = deploy_factory(&mut session, params).await?;
    assert_eq!(factory, chain.sender().create(PROD_FACTORY_DEPLOYER_NONCE + 3));

    let selector = keccak256("prepareChangeOwner(address)");
    match chain.calls().as_slice() {
        [Call::Send { to, calldata }] => {
            assert_eq!(*to, factory);
            assert_eq!(calldata.len(), 36);
            assert_eq!(calldata[..4], selector[..4]);
            assert_eq!(&calldata[16..], owner.as_slice());
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }

    Ok(())
}

// ----------
// | ROUTER |
// ----------

#[tokio::test]
async fn test_router_requires_factory() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();
    let mut session = open_session(dir.path(), &chain)?;

    let res = deploy_router(&mut session).await;

    assert!(matches!(res, Err(ScriptError::LedgerNotFound(_))));
    assert!(chain.deployments().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_deploy_all() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();

    {
        let mut session = open_session(dir.path(), &chain)?;
        deploy_all(&mut session, FactoryParams::default()).await?;
        session.save()?;
    }

    let ledger = read_ledger(dir.path())?;
    assert_eq!(ledger.len(), 5);
    let factory = ledger.must_get(MARKET_FACTORY)?;
    let router = ledger.must_get(MARKET_ROUTER)?;
    assert_eq!(
        deployment_of(&chain, MARKET_ROUTER).args,
        vec![factory.to_string()]
    );
    assert_eq!(router, chain.sender().create(4));

    Ok(())
}

#[tokio::test]
async fn test_deploy_all_rerun_is_a_no_op() -> Result<()> {
    let dir = global_setup();
    let chain = MockChain::random();

    for _ in 0..2 {
        let mut session = open_session(dir.path(), &chain)?;
        deploy_all(&mut session, FactoryParams::default()).await?;
        session.save()?;
    }

    assert_eq!(chain.deployments().len(), 5);
    assert_eq!(chain.current_nonce(), 5);

    Ok(())
}
