//! Constants used in the deploy scripts

// ----------------------
// | ADDRESS PREDICTION |
// ----------------------

/// The smallest nonce for which no deployment address can be derived.
///
/// EIP-2681 caps an account nonce at `2^64 - 1`, and an account at the cap can
/// no longer send a creation transaction.
pub const MAX_NONCE: u64 = u64::MAX;

/// RLP header of a 20-byte string, i.e. the encoded sender address
pub const RLP_ADDRESS_PREFIX: u8 = 0x94;

/// RLP encoding of the empty string, which is how a zero nonce is encoded
pub const RLP_EMPTY_STRING: u8 = 0x80;

/// The largest value RLP encodes as a single byte with no header
pub const RLP_SINGLE_BYTE_MAX: u64 = 0x7f;

/// RLP list header for a `[sender, nonce]` payload where the nonce occupies one byte.
///
/// `0xc0 + 22`: 21 bytes of encoded address plus a single nonce byte.
pub const RLP_SHORT_LIST_PREFIX: u8 = 0xd6;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The number of bytes in a keccak256 digest
pub const NUM_BYTES_DIGEST: usize = 32;

// ----------
// | LEDGER |
// ----------

/// The file name under which a network's deployments are stored
pub const DEPLOYMENTS_FILE_NAME: &str = "address.json";

/// Suffix appended to a component name to form its staged implementation key
pub const IMPLEMENTATION_KEY_SUFFIX: &str = "$Implementation";

/// Suffix appended to a component name to form its forward reference key
pub const FORWARD_REFERENCE_KEY_SUFFIX: &str = "$Computed";

/// The default directory holding the per-network deployments
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The default directory holding compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The extension of a compiled contract artifact
pub const ARTIFACT_EXTENSION: &str = "json";

// ---------------
// | DEPLOYMENTS |
// ---------------

/// Buffer applied to both the estimated gas limit and the gas price, in percent.
///
/// Buffered values are floored, never rounded up.
pub const GAS_BUFFER_PERCENT: u64 = 130;

/// The number of confirmations to wait for each transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The ledger key of the proxy admin contract that owns every proxy
pub const PROXY_ADMIN_KEY: &str = "DefaultProxyAdmin";

/// The name of the upgradeable proxy artifact.
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v4.9.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const PROXY_CONTRACT_NAME: &str = "TransparentUpgradeableProxy";

/// The default RPC URL, a local development node
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The default network name, used to scope the deployments file
pub const DEFAULT_NETWORK: &str = "localhost";

// --------------------
// | MARKET CONTRACTS |
// --------------------

/// The order canceler contract
pub const ORDER_CANCELER: &str = "OrderCanceler";

/// The market deployer contract, constructed with the factory's address
pub const MARKET_DEPLOYER: &str = "MarketDeployer";

/// The price book deployer contract, constructed with the factory's address
pub const PRICE_BOOK_DEPLOYER: &str = "PriceBookDeployer";

/// The market factory contract
pub const MARKET_FACTORY: &str = "MarketFactory";

/// The market router contract
pub const MARKET_ROUTER: &str = "MarketRouter";

/// The nonce the production deployer must be at before deploying the factory
pub const PROD_FACTORY_DEPLOYER_NONCE: u64 = 2;
