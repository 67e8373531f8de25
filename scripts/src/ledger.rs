//! The deployments ledger: a persisted mapping from component name to the
//! address it was deployed at, scoped to a single network.
//!
//! The ledger is stored as a flat JSON object at
//! `<deployments dir>/<network>/address.json`. Besides the live component
//! entries, it may hold `<name>$Implementation` entries for upgradeable
//! components whose implementation was deployed but whose proxy was not yet
//! wired up, and `<name>$Computed` entries holding the address a component
//! was predicted at while contracts referencing it are being deployed.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy_primitives::Address;

use crate::{
    constants::{DEPLOYMENTS_FILE_NAME, FORWARD_REFERENCE_KEY_SUFFIX, IMPLEMENTATION_KEY_SUFFIX},
    errors::ScriptError,
};

/// A single ledger entry
#[derive(Clone, Debug)]
struct Entry {
    /// The parsed address, compared case-insensitively
    address: Address,
    /// The address as it was first observed, written back verbatim
    raw: String,
}

/// A network's deployments ledger
#[derive(Debug)]
pub struct Ledger {
    /// The file the ledger is persisted to
    path: PathBuf,
    /// The recorded deployments
    entries: BTreeMap<String, Entry>,
    /// Whether the in-memory ledger has diverged from the persisted one
    dirty: bool,
}

/// The ledger key under which an upgradeable component's implementation is
/// staged until its proxy is wired up
pub fn implementation_key(name: &str) -> String {
    format!("{name}{IMPLEMENTATION_KEY_SUFFIX}")
}

/// The ledger key holding the address a component was computed to land at
/// before anything depending on it was deployed
pub fn forward_reference_key(name: &str) -> String {
    format!("{name}{FORWARD_REFERENCE_KEY_SUFFIX}")
}

impl Ledger {
    /// Load the ledger for `network` from `deployments_dir`, starting empty if
    /// nothing has been persisted yet
    pub fn load(deployments_dir: impl AsRef<Path>, network: &str) -> Result<Self, ScriptError> {
        let path = deployments_dir
            .as_ref()
            .join(network)
            .join(DEPLOYMENTS_FILE_NAME);

        if !path.exists() {
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
                dirty: false,
            });
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::Load(format!("{}: {}", path.display(), e)))?;
        let raw: BTreeMap<String, String> = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::Load(format!("{}: {}", path.display(), e)))?;

        let entries = raw
            .into_iter()
            .map(|(name, raw)| {
                let address = Address::from_str(&raw).map_err(|e| {
                    ScriptError::Load(format!("invalid address {raw} for {name}: {e}"))
                })?;
                Ok((name, Entry { address, raw }))
            })
            .collect::<Result<_, ScriptError>>()?;

        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    /// The file this ledger persists to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether there are changes that have not been persisted
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a component is recorded under `name`
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The address recorded under `name`, if any
    pub fn get(&self, name: &str) -> Option<Address> {
        self.entries.get(name).map(|entry| entry.address)
    }

    /// The address recorded under `name`, failing if it is absent
    pub fn must_get(&self, name: &str) -> Result<Address, ScriptError> {
        self.get(name)
            .ok_or_else(|| ScriptError::LedgerNotFound(name.to_string()))
    }

    /// Record `address` under `name`, overwriting any previous entry
    pub fn set(&mut self, name: &str, address: Address) {
        let entry = Entry {
            address,
            raw: address.to_string(),
        };
        self.entries.insert(name.to_string(), entry);
        self.dirty = true;
    }

    /// Remove the entry recorded under `name`, returning its address
    pub fn remove(&mut self, name: &str) -> Option<Address> {
        let removed = self.entries.remove(name).map(|entry| entry.address);
        self.dirty |= removed.is_some();
        removed
    }

    /// Iterate over the recorded `(name, address)` pairs, with addresses in
    /// the casing they were recorded with
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.raw.as_str()))
    }

    /// The number of recorded entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the ledger to disk, creating its directory if needed.
    ///
    /// The contents are synced to a temporary file which then replaces the
    /// ledger, so a crash mid-write leaves the previous contents intact.
    pub fn persist(&mut self) -> Result<(), ScriptError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", dir.display(), e)))?;
        }

        let raw: BTreeMap<&str, &str> = self.entries().collect();
        let contents = serde_json::to_string_pretty(&raw)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let tmp_error =
            |e: io::Error| ScriptError::WriteDeployments(format!("{}: {}", tmp_path.display(), e));
        let mut file = File::create(&tmp_path).map_err(tmp_error)?;
        file.write_all(contents.as_bytes()).map_err(tmp_error)?;
        file.sync_all().map_err(tmp_error)?;

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", self.path.display(), e)))?;

        // Make the rename itself durable
        #[cfg(unix)]
        if let Some(dir) = self.path.parent().and_then(|dir| File::open(dir).ok()) {
            let _ = dir.sync_all();
        }

        self.dirty = false;
        Ok(())
    }
}
