//! Definitions of CLI arguments and commands for deploy scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{
        deploy, deploy_all, deploy_factory, deploy_router, predict, remove, show, upgrade,
    },
    constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_DIR, DEFAULT_NETWORK, DEFAULT_RPC_URL},
    errors::ScriptError,
};

/// Deploy and upgrade contracts, recording them in a per-network ledger
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Clone)]
pub struct SessionArgs {
    /// Private key of the deployer
    #[arg(long = "pkey", env = "PKEY", global = true, hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", global = true, default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Name of the network, which scopes the deployments ledger
    #[arg(short, long, env = "NETWORK", global = true, default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Directory holding the per-network deployments ledgers
    #[arg(long, global = true, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_dir: PathBuf,

    /// Directory holding the compiled contract artifacts
    #[arg(long, global = true, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    Predict(PredictArgs),
    Show,
    Remove(RemoveArgs),
    Deploy(DeployArgs),
    Upgrade(UpgradeArgs),
    DeployFactory(FactoryArgs),
    DeployRouter,
    DeployAll(FactoryArgs),
}

impl Command {
    pub async fn run(self, session: SessionArgs) -> Result<(), ScriptError> {
        match self {
            Command::Predict(args) => predict(args),
            Command::Show => show(&session),
            Command::Remove(args) => remove(args, &session),
            Command::Deploy(args) => deploy(args, &session).await,
            Command::Upgrade(args) => upgrade(args, &session).await,
            Command::DeployFactory(args) => deploy_factory(args, &session).await,
            Command::DeployRouter => deploy_router(&session).await,
            Command::DeployAll(args) => deploy_all(args, &session).await,
        }
    }
}

/// Compute the address a creation transaction from `sender` at `nonce` deploys to
#[derive(Args)]
pub struct PredictArgs {
    /// The deploying account
    pub sender: String,

    /// The nonce of the creation transaction
    pub nonce: u64,
}

/// Forget a recorded component so that it is deployed again on the next run
#[derive(Args)]
pub struct RemoveArgs {
    /// The ledger key to remove
    pub name: String,
}

/// Deploy a contract unless the ledger already records it
#[derive(Args)]
pub struct DeployArgs {
    /// The contract to deploy, named as its artifact
    pub contract: String,

    /// Constructor arguments, in order
    #[arg(long = "arg")]
    pub args: Vec<String>,

    /// Deploy the contract behind a `TransparentUpgradeableProxy`
    #[arg(long)]
    pub upgradeable: bool,

    /// Initializer the proxy calls on the implementation when constructed
    #[arg(long, requires = "upgradeable")]
    pub init_method: Option<String>,

    /// Arguments of the initializer, in order
    #[arg(long = "init-arg", requires = "init_method")]
    pub init_args: Vec<String>,

    /// Fail unless the contract lands at this address
    #[arg(long)]
    pub expect_address: Option<String>,
}

/// Upgrade a proxied contract through the proxy admin
#[derive(Args)]
pub struct UpgradeArgs {
    /// The proxied contract, named as its artifact
    pub contract: String,

    /// Constructor arguments of the new implementation, in order
    #[arg(long = "arg")]
    pub args: Vec<String>,

    /// An already deployed implementation to upgrade to
    #[arg(short, long)]
    pub implementation: Option<String>,

    /// Method to call on the new implementation through the proxy when upgrading
    #[arg(long)]
    pub call_method: Option<String>,

    /// Arguments of the upgrade call, in order
    #[arg(long = "call-arg", requires = "call_method")]
    pub call_args: Vec<String>,
}

/// Deploy the market factory and its deployers
#[derive(Args)]
pub struct FactoryArgs {
    /// Production deployment: checks the deployer nonce and hands
    /// factory ownership to `--owner`
    #[arg(long)]
    pub prod: bool,

    /// The DAO treasury, the deployer if absent
    #[arg(long)]
    pub treasury: Option<String>,

    /// Quote tokens registered with the factory at construction
    #[arg(long = "quote-token")]
    pub quote_tokens: Vec<String>,

    /// The account the factory ownership is handed to
    #[arg(long)]
    pub owner: Option<String>,

    /// The nonce the deployer must be at before anything is sent
    #[arg(long)]
    pub expect_nonce: Option<u64>,
}
