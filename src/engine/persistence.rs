//! Links persistence to JSON
//!
//! The file is a flat, human-editable object mapping binding keys to
//! fully-qualified parameter paths:
//!
//! ```json
//! {
//!   "nanoKONTROL2:176:1:0": "lights/dimmer",
//!   "nanoKONTROL2:176:1:32": "lights/strobe"
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use super::error::LinkError;
use super::key::BindingKey;
use super::linker::LinkEngine;
use super::table::LinkTable;
use crate::params::ParameterGroup;

/// Default links file name
pub const DEFAULT_LINKS_FILE: &str = "links.json";

/// Serialize a link table to pretty JSON
pub fn encode_links(table: &LinkTable) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&table.to_names())
}

/// Parse links JSON into `key -> parameter path` pairs
pub fn decode_links(json: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    serde_json::from_str(json)
}

impl LinkEngine {
    /// Write the link table to `path`, returning the number of links saved
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<usize, LinkError> {
        let path = path.as_ref();
        let json = encode_links(self.links()).map_err(|source| LinkError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        fs::write(path, json).await.map_err(|source| LinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("💾 {} links saved to '{}'", self.links().len(), path.display());
        Ok(self.links().len())
    }

    /// Load links from `path`, resolving names against `root`
    ///
    /// All-or-nothing: if the file is missing or malformed, or any entry
    /// names a parameter `root` does not have (or one that cannot be linked),
    /// the current table is left untouched. Otherwise every entry overwrites
    /// the existing link for its key.
    pub async fn load(
        &mut self,
        root: &ParameterGroup,
        path: impl AsRef<Path>,
    ) -> Result<usize, LinkError> {
        let path = path.as_ref();

        let exists = fs::try_exists(path).await.map_err(|source| LinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !exists {
            warn!("💾 Links file '{}' not found, no links loaded", path.display());
            return Err(LinkError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let json = fs::read_to_string(path)
            .await
            .map_err(|source| LinkError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let entries = decode_links(&json).map_err(|source| LinkError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut staged = Vec::with_capacity(entries.len());
        for (key, name) in entries {
            let param = match root.find(&name) {
                Some(param) => param,
                None => {
                    warn!("Aborting load of '{}': no parameter named '{}'", path.display(), name);
                    return Err(LinkError::UnresolvedParameterName { key, name });
                }
            };

            let kind = param.kind();
            if !kind.is_linkable() {
                warn!("Aborting load of '{}': '{}' is a {} parameter", path.display(), name, kind);
                return Err(LinkError::UnsupportedParameterType { name, kind });
            }

            debug!("Restoring link {} <=> '{}'", key, name);
            staged.push((BindingKey::from(key), param.handle()));
        }

        let count = staged.len();
        self.install_all(staged);

        info!("💾 {} links loaded from '{}'", count, path.display());
        Ok(count)
    }
}
