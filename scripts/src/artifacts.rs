//! Encoding of creation code and calldata from compiled contract artifacts.
//!
//! An artifact is the JSON emitted by the Solidity toolchain for a contract,
//! of which only the `abi` and `bytecode` fields are read. Artifacts are looked
//! up as `<artifacts dir>/<Contract>.json`, falling back to a recursive search
//! of the directory for the same file name.

use std::{
    fs,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::{JsonAbi, Param},
};
use alloy_primitives::Bytes;
use serde::Deserialize;
use tracing::error;

use crate::{
    client::CallEncoder, constants::ARTIFACT_EXTENSION, errors::ScriptError, types::MethodCall,
};

/// The fields of a compilation artifact used for deployment
#[derive(Deserialize)]
struct Artifact {
    /// The contract ABI
    abi: JsonAbi,
    /// The creation code
    bytecode: Bytes,
}

/// A [`CallEncoder`] backed by a directory of compilation artifacts
#[derive(Clone, Debug)]
pub struct ArtifactEncoder {
    /// The directory containing the artifacts
    dir: PathBuf,
}

impl ArtifactEncoder {
    /// Create an encoder reading artifacts from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the artifact of `contract`
    fn load(&self, contract: &str) -> Result<Artifact, ScriptError> {
        let file_name = format!("{contract}.{ARTIFACT_EXTENSION}");
        let flat = self.dir.join(&file_name);
        let path = if flat.is_file() {
            flat
        } else {
            find_file(&self.dir, &file_name).ok_or_else(|| {
                ScriptError::ArtifactParsing(format!(
                    "no artifact for {contract} under {}",
                    self.dir.display()
                ))
            })?
        };

        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))
    }
}

impl CallEncoder for ArtifactEncoder {
    fn encode_deploy(&self, contract: &str, args: &[String]) -> Result<Bytes, ScriptError> {
        let artifact = self.load(contract)?;
        let encoding_error = |reason: String| {
            error!("Encoding {contract}'s constructor arguments failed");
            ScriptError::Encoding {
                name: contract.to_string(),
                args: args.to_vec(),
                reason,
            }
        };

        let encoded_args = match &artifact.abi.constructor {
            Some(constructor) => {
                let values = coerce_args(&constructor.inputs, args).map_err(encoding_error)?;
                constructor
                    .abi_encode_input(&values)
                    .map_err(|e| encoding_error(e.to_string()))?
            }
            None if args.is_empty() => Vec::new(),
            None => {
                return Err(encoding_error(format!(
                    "{contract} has no constructor but {} arguments were given",
                    args.len()
                )))
            }
        };

        let mut code = artifact.bytecode.to_vec();
        code.extend(encoded_args);
        Ok(code.into())
    }

    fn encode_call(&self, contract: &str, call: &MethodCall) -> Result<Bytes, ScriptError> {
        let artifact = self.load(contract)?;
        let name = format!("{contract}.{}", call.method);
        let encoding_error = |reason: String| {
            error!("Encoding {contract}'s {} call failed", call.method);
            ScriptError::Encoding {
                name: name.clone(),
                args: call.args.clone(),
                reason,
            }
        };

        let function = artifact
            .abi
            .function(&call.method)
            .and_then(|overloads| {
                overloads
                    .iter()
                    .find(|f| f.inputs.len() == call.args.len())
            })
            .ok_or_else(|| {
                encoding_error(format!(
                    "no method {} taking {} arguments",
                    call.method,
                    call.args.len()
                ))
            })?;

        let values = coerce_args(&function.inputs, &call.args).map_err(encoding_error)?;
        function
            .abi_encode_input(&values)
            .map(Bytes::from)
            .map_err(|e| encoding_error(e.to_string()))
    }
}

/// Coerce string arguments into values of the given parameter types
fn coerce_args(params: &[Param], args: &[String]) -> Result<Vec<DynSolValue>, String> {
    if params.len() != args.len() {
        return Err(format!(
            "expected {} arguments, got {}",
            params.len(),
            args.len()
        ));
    }

    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param.resolve().map_err(|e| e.to_string())?;
            ty.coerce_str(arg)
                .map_err(|e| format!("argument {} ({}): {}", param.name, param.ty, e))
        })
        .collect()
}

/// Recursively search `dir` for a file named `file_name`
fn find_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().is_some_and(|name| name == file_name) {
            return Some(path);
        }
    }

    subdirs
        .into_iter()
        .find_map(|subdir| find_file(&subdir, file_name))
}
