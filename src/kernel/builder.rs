//! Construction-time kernel selection.

use serde::{Deserialize, Serialize};

use super::{EngineAdapter, KernelKind, PendingEngine, PerformantKernel, ReferenceKernel};
use crate::error::{LayoutError, Result};
use crate::sim::SimulationConfig;

/// What to do when the performant kernel cannot be initialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackPolicy {
    /// Return `KernelUnavailable`.
    #[default]
    FailFast,
    /// Log a warning and build the reference kernel instead.
    Reference,
}

/// Builds an adapter for an explicitly chosen kernel.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    kind: KernelKind,
    fallback: FallbackPolicy,
    capacity: usize,
    config: SimulationConfig,
}

impl EngineBuilder {
    pub fn new(kind: KernelKind) -> Self {
        Self {
            kind,
            fallback: FallbackPolicy::default(),
            capacity: 0,
            config: SimulationConfig::default(),
        }
    }

    pub fn fallback(mut self, policy: FallbackPolicy) -> Self {
        self.fallback = policy;
        self
    }

    /// Expected node count; the performant kernel reserves buffers up front.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Box<dyn EngineAdapter>> {
        match self.kind {
            KernelKind::Reference => Ok(Box::new(ReferenceKernel::new(self.config)?)),
            KernelKind::Performant => {
                match PerformantKernel::with_capacity(self.config.clone(), self.capacity) {
                    Ok(kernel) => Ok(Box::new(kernel)),
                    Err(err @ LayoutError::KernelUnavailable { .. }) => match self.fallback {
                        FallbackPolicy::FailFast => Err(err),
                        FallbackPolicy::Reference => {
                            log::warn!("{err}; falling back to the reference kernel");
                            Ok(Box::new(ReferenceKernel::new(self.config)?))
                        }
                    },
                    Err(err) => Err(err),
                }
            }
        }
    }

    /// An adapter that queues calls until a kernel is attached.
    pub fn pending(self) -> Result<PendingEngine> {
        PendingEngine::new(self.kind, self.config)
    }
}
