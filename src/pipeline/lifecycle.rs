//! Index lifecycle: make a destination index ready for a fresh bulk load.
//!
//! The steps run strictly in order and each must succeed before the next:
//! ping, delete (a missing index is fine), create, then the optional mapping.
//! Nothing is retried.

use std::time::Duration;

use tracing::debug;

use crate::error::{ExportError, LifecycleStep};
use crate::index::SearchIndex;

use super::descriptor::ExportDescriptor;

/// Sequences the destination calls that reset one index
pub struct IndexLifecycle<'a> {
    index: &'a dyn SearchIndex,
    ping_timeout: Duration,
}

impl<'a> IndexLifecycle<'a> {
    pub fn new(index: &'a dyn SearchIndex, ping_timeout: Duration) -> Self {
        Self {
            index,
            ping_timeout,
        }
    }

    /// Run every step for `desc`
    pub async fn prepare(&self, desc: &ExportDescriptor) -> Result<(), ExportError> {
        self.check_connectivity().await?;
        self.reset_index(desc).await?;
        self.apply_mapping(desc).await
    }

    /// Fail fast when the destination does not answer in time
    pub async fn check_connectivity(&self) -> Result<(), ExportError> {
        debug!("----> checking connection to elastic");
        self.index
            .ping(self.ping_timeout)
            .await
            .map_err(|e| ExportError::Connectivity(e.to_string()))
    }

    /// Drop and recreate `desc.index`
    pub async fn reset_index(&self, desc: &ExportDescriptor) -> Result<(), ExportError> {
        debug!("----> dropping existing index [{}]", desc.index);
        match self.index.delete_index(&desc.index).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!("----> index [{}] did not exist", desc.index);
            }
            Err(e) => {
                return Err(ExportError::Lifecycle {
                    step: LifecycleStep::DeleteIndex,
                    cause: e.to_string(),
                });
            }
        }

        debug!("----> creating new index [{}]", desc.index);
        self.index
            .create_index(&desc.index)
            .await
            .map_err(|e| ExportError::Lifecycle {
                step: LifecycleStep::CreateIndex,
                cause: e.to_string(),
            })
    }

    /// Push `desc.mappings` for `desc.doc_type`; no-op without mappings
    pub async fn apply_mapping(&self, desc: &ExportDescriptor) -> Result<(), ExportError> {
        let Some(mappings) = &desc.mappings else {
            debug!("----> no mapping configured for [{}]", desc.index);
            return Ok(());
        };

        debug!("----> initialize index mapping");
        self.index
            .put_mapping(&desc.index, &desc.doc_type, mappings)
            .await
            .map_err(|e| ExportError::Lifecycle {
                step: LifecycleStep::PutMapping,
                cause: e.to_string(),
            })
    }
}
