//! Scripts for deploying and upgrading contracts, recording each deployment
//! in a per-network ledger so that re-runs pick up where they left off.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
#[allow(missing_docs, clippy::missing_docs_in_private_items)]
pub mod cli;
pub mod client;
mod commands;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod orchestrator;
pub mod predict;
pub mod rpc;
mod solidity;
pub mod tasks;
pub mod types;
pub mod utils;
