//! Shared application state.

use crate::config::Config;
use anyhow::Context;
use relay_core::{Planner, PlannerConfig, StaticInventory, TowerRecord};

/// Immutable per-process state: one inventory snapshot and the planner over it.
pub struct AppState {
    planner: Planner<StaticInventory>,
}

impl AppState {
    pub fn new(inventory: StaticInventory, planner_config: PlannerConfig) -> Self {
        Self {
            planner: Planner::with_config(inventory, planner_config),
        }
    }

    /// Load the configured tower file, or start empty when none is set.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config
            .planner
            .validate()
            .context("invalid planner configuration")?;

        let inventory = match &config.towers_path {
            Some(path) => StaticInventory::load_from_path(path)
                .with_context(|| format!("failed to load towers from {}", path.display()))?,
            None => {
                tracing::warn!("RELAY_TOWERS_PATH not set, starting with an empty tower inventory");
                StaticInventory::empty()
            }
        };
        Ok(Self::new(inventory, config.planner.clone()))
    }

    pub fn planner(&self) -> &Planner<StaticInventory> {
        &self.planner
    }

    pub fn towers(&self) -> &[TowerRecord] {
        self.planner.inventory().towers()
    }
}
