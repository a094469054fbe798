// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `EngineServices`: the bundle of shared, cross-stage dependencies every
//! Stage Task is handed — the LLM gateway, the event bus, the persistence
//! store, a clock, resolved config, and the project's working directory.

use std::path::PathBuf;
use std::sync::Arc;

use forge_core::{Clock, EngineConfig, EventBus};
use forge_gateway::Gateway;
use forge_storage::Store;

/// Object-safe wrapper around [`Clock`]; `Clock` itself requires `Clone`,
/// which rules out `dyn Clock`, so this is what `EngineServices` actually
/// stores.
trait DynClock: Send + Sync {
    fn now_ms(&self) -> u64;
}

impl<C: Clock> DynClock for C {
    fn now_ms(&self) -> u64 {
        Clock::now_ms(self)
    }
}

#[derive(Clone)]
pub struct EngineServices {
    pub gateway: Arc<Gateway>,
    pub bus: EventBus,
    pub store: Arc<Store>,
    pub config: EngineConfig,
    pub project_root: PathBuf,
    clock: Arc<dyn DynClock>,
}

impl EngineServices {
    pub fn new(
        gateway: Arc<Gateway>,
        bus: EventBus,
        store: Arc<Store>,
        config: EngineConfig,
        project_root: PathBuf,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            gateway,
            bus,
            store,
            config,
            project_root,
            clock: Arc::new(clock),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}
