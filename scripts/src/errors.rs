//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// The nonce is too large for a deployment address to be derived from it
    Prediction(String),
    /// A component required by the current step is missing from the ledger
    LedgerNotFound(String),
    /// The persisted deployments file could not be read or parsed
    Load(String),
    /// Error writing the deployments file
    WriteDeployments(String),
    /// A transaction failed to be submitted or confirmed
    Broadcast(String),
    /// A deployment landed at a different address than the one expected
    AddressMismatch {
        /// The name of the deployed component
        name: String,
        /// The address that was expected
        expected: String,
        /// The address the component was actually deployed at
        actual: String,
    },
    /// The proxy admin could not report a proxy's current implementation
    Introspection(String),
    /// Error encoding constructor or method calldata
    Encoding {
        /// The contract, or `contract.method`, whose encoding failed
        name: String,
        /// The arguments that failed to encode
        args: Vec<String>,
        /// The underlying encoder error
        reason: String,
    },
    /// An upgrade was requested for a component that was never deployed
    NotDeployed(String),
    /// The deployer's nonce is not the one the script was written against
    NonceMismatch {
        /// The nonce the script expects
        expected: u64,
        /// The deployer's actual nonce
        actual: u64,
    },
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error fetching the nonce of the deployer
    NonceFetching(String),
    /// Error parsing a compilation artifact
    ArtifactParsing(String),
    /// Error parsing user-supplied calldata or addresses
    CalldataConstruction(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Prediction(s) => write!(f, "unrepresentable nonce: {}", s),
            ScriptError::LedgerNotFound(s) => write!(f, "missing component: {}", s),
            ScriptError::Load(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::Broadcast(s) => write!(f, "error broadcasting transaction: {}", s),
            ScriptError::AddressMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "computed {} address is wrong, real: {}, computed: {}",
                name, actual, expected
            ),
            ScriptError::Introspection(s) => write!(f, "cannot introspect proxy: {}", s),
            ScriptError::Encoding { name, args, reason } => write!(
                f,
                "encoding failed for {} (args: [{}]): {}",
                name,
                args.join(", "),
                reason
            ),
            ScriptError::NotDeployed(s) => write!(f, "{} has not been deployed", s),
            ScriptError::NonceMismatch { expected, actual } => {
                write!(f, "nonce not matched: expected {}, got {}", expected, actual)
            }
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::NonceFetching(s) => write!(f, "error fetching nonce: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
        }
    }
}

impl Error for ScriptError {}
