//! Experiment configuration store
//!
//! Holds the wizard's draft experiment, the wizard position, the dashboard
//! experiment list and the UI preferences. Only the preferences and saved
//! configurations are written to durable storage.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::observable::{Store, Subscription};
use crate::domain::{
    DataSourcePatch, DeploymentPatch, EnvironmentPatch, Experiment, ExperimentDraft,
    ExperimentStatus, ExperimentSummary, FeaturesPatch, HyperparametersPatch, IctFeaturesPatch,
    ModelPatch, Preset, ResourcePatch, RewardPatch, Timeframe, TimeframeConfig, TimeframePatch,
};
use crate::persistence::{load_json, store_json, LocalStorage};

/// First wizard step
pub const FIRST_STEP: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentState {
    pub current_step: u32,
    #[serde(flatten)]
    pub draft: ExperimentDraft,
    pub experiments: Vec<ExperimentSummary>,
    pub saved_configs: Vec<Experiment>,
    pub is_dark_mode: bool,
    pub sidebar_collapsed: bool,
}

impl Default for ExperimentState {
    fn default() -> Self {
        let prefs = PersistedPreferences::default();
        Self {
            current_step: FIRST_STEP,
            draft: ExperimentDraft::default(),
            experiments: ExperimentSummary::demo_list(),
            saved_configs: prefs.saved_configs,
            is_dark_mode: prefs.is_dark_mode,
            sidebar_collapsed: prefs.sidebar_collapsed,
        }
    }
}

/// The blob kept in durable storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedPreferences {
    pub is_dark_mode: bool,
    pub sidebar_collapsed: bool,
    pub saved_configs: Vec<Experiment>,
}

impl Default for PersistedPreferences {
    fn default() -> Self {
        Self {
            is_dark_mode: true,
            sidebar_collapsed: false,
            saved_configs: Vec::new(),
        }
    }
}

impl From<&ExperimentState> for PersistedPreferences {
    fn from(state: &ExperimentState) -> Self {
        Self {
            is_dark_mode: state.is_dark_mode,
            sidebar_collapsed: state.sidebar_collapsed,
            saved_configs: state.saved_configs.clone(),
        }
    }
}

pub struct ExperimentStore {
    state: Store<ExperimentState>,
    storage: Arc<dyn LocalStorage>,
    key: String,
}

impl ExperimentStore {
    /// Create the store, rehydrating preferences stored under `key`
    pub fn new(storage: Arc<dyn LocalStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let prefs: PersistedPreferences = load_json(storage.as_ref(), &key).unwrap_or_default();
        debug!(
            key = %key,
            dark_mode = prefs.is_dark_mode,
            saved = prefs.saved_configs.len(),
            "Rehydrated experiment preferences"
        );

        let state = ExperimentState {
            saved_configs: prefs.saved_configs,
            is_dark_mode: prefs.is_dark_mode,
            sidebar_collapsed: prefs.sidebar_collapsed,
            ..ExperimentState::default()
        };

        Self {
            state: Store::new(state),
            storage,
            key,
        }
    }

    pub fn snapshot(&self) -> ExperimentState {
        self.state.get()
    }

    pub fn store(&self) -> &Store<ExperimentState> {
        &self.state
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ExperimentState) + Send + Sync + 'static,
    {
        self.state.subscribe(listener)
    }

    // Wizard navigation and identity

    pub fn set_current_step(&self, step: u32) {
        self.state.update(|s| s.current_step = step);
    }

    pub fn set_experiment_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.state.update(|s| s.draft.name = name);
    }

    pub fn set_experiment_description(&self, description: impl Into<String>) {
        let description = description.into();
        self.state.update(|s| s.draft.description = description);
    }

    // Subtree patches

    pub fn update_features(&self, patch: FeaturesPatch) {
        self.state.update(|s| patch.apply(&mut s.draft.features));
    }

    pub fn update_data_source(&self, patch: DataSourcePatch) {
        self.state.update(|s| patch.apply(&mut s.draft.features.data_source));
    }

    pub fn update_ict_features(&self, patch: IctFeaturesPatch) {
        self.state.update(|s| patch.apply(&mut s.draft.features.ict_features));
    }

    pub fn update_model(&self, patch: ModelPatch) {
        self.state.update(|s| patch.apply(&mut s.draft.model));
    }

    pub fn update_hyperparameters(&self, patch: HyperparametersPatch) {
        self.state.update(|s| patch.apply(&mut s.draft.hyperparameters));
    }

    pub fn update_reward(&self, patch: RewardPatch) {
        self.state.update(|s| patch.apply(&mut s.draft.reward));
    }

    pub fn update_environment(&self, patch: EnvironmentPatch) {
        self.state.update(|s| patch.apply(&mut s.draft.environment));
    }

    pub fn update_resources(&self, patch: ResourcePatch) {
        self.state.update(|s| patch.apply(&mut s.draft.resources));
    }

    pub fn update_deployment(&self, patch: DeploymentPatch) {
        self.state.update(|s| patch.apply(&mut s.draft.deployment));
    }

    // Timeframes

    /// Append a 15m timeframe with the default indicator set; returns its id
    pub fn add_timeframe(&self) -> String {
        let id = format!("tf-{}", Uuid::new_v4().simple());
        let timeframe = TimeframeConfig {
            id: id.clone(),
            timeframe: Timeframe::M15,
            ..TimeframeConfig::default()
        };
        self.state.update(|s| s.draft.features.timeframes.push(timeframe));
        id
    }

    /// Remove the timeframe with `id`; unknown ids are a no-op. Returns whether anything was removed.
    pub fn remove_timeframe(&self, id: &str) -> bool {
        let mut removed = false;
        self.state.update(|s| {
            let before = s.draft.features.timeframes.len();
            s.draft.features.timeframes.retain(|tf| tf.id != id);
            removed = s.draft.features.timeframes.len() != before;
        });
        removed
    }

    /// Merge `patch` into the timeframe with `id`; unknown ids are a no-op
    pub fn update_timeframe(&self, id: &str, patch: TimeframePatch) -> bool {
        let mut found = false;
        self.state.update(|s| {
            if let Some(tf) = s.draft.features.timeframes.iter_mut().find(|tf| tf.id == id) {
                patch.apply(tf);
                found = true;
            }
        });
        found
    }

    // Whole-tree operations

    /// Overwrite the preset-controlled hyperparameters and record the preset
    pub fn apply_preset(&self, preset: Preset) {
        self.state.update(|s| {
            s.draft.hyperparameters.apply_preset(preset);
            s.draft.model.preset = preset;
        });
        info!(preset = %preset, "Applied hyperparameter preset");
    }

    /// Restore the draft to its defaults and go back to the first step
    pub fn reset_wizard(&self) {
        self.state.update(|s| {
            s.current_step = FIRST_STEP;
            s.draft = ExperimentDraft::default();
        });
        info!("Experiment wizard reset");
    }

    pub fn experiment_config(&self) -> ExperimentDraft {
        self.state.read(|s| s.draft.clone())
    }

    pub fn experiments(&self) -> Vec<ExperimentSummary> {
        self.state.read(|s| s.experiments.clone())
    }

    // Persisted fields

    pub fn toggle_dark_mode(&self) -> bool {
        let mut now = false;
        self.state.update(|s| {
            s.is_dark_mode = !s.is_dark_mode;
            now = s.is_dark_mode;
        });
        self.persist();
        now
    }

    pub fn toggle_sidebar(&self) -> bool {
        let mut now = false;
        self.state.update(|s| {
            s.sidebar_collapsed = !s.sidebar_collapsed;
            now = s.sidebar_collapsed;
        });
        self.persist();
        now
    }

    /// Save the current draft as a new experiment in `draft` status
    pub fn save_current_config(&self) -> Experiment {
        let now = Utc::now();
        let experiment = Experiment {
            id: Uuid::new_v4().to_string(),
            status: ExperimentStatus::Draft,
            created_at: now,
            updated_at: now,
            config: self.experiment_config(),
            metrics: None,
        };

        let saved = experiment.clone();
        self.state.update(|s| s.saved_configs.push(saved));
        self.persist();
        info!(id = %experiment.id, name = %experiment.config.name, "Saved experiment configuration");
        experiment
    }

    pub fn remove_saved_config(&self, id: &str) -> bool {
        let mut removed = false;
        self.state.update(|s| {
            let before = s.saved_configs.len();
            s.saved_configs.retain(|e| e.id != id);
            removed = s.saved_configs.len() != before;
        });
        if removed {
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        let prefs = self.state.read(|s| PersistedPreferences::from(s));
        if let Err(e) = store_json(self.storage.as_ref(), &self.key, &prefs) {
            warn!(key = %self.key, error = %e, "Failed to persist experiment preferences");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Algorithm;
    use crate::persistence::MemoryStorage;

    fn store() -> ExperimentStore {
        ExperimentStore::new(Arc::new(MemoryStorage::new()), "experiment-store")
    }

    #[test]
    fn test_initial_state() {
        let s = store().snapshot();
        assert_eq!(s.current_step, 1);
        assert_eq!(s.draft.name, "PPO_BTCUSDT_v1");
        assert!(s.is_dark_mode);
        assert!(!s.sidebar_collapsed);
        assert_eq!(s.experiments.len(), 6);
        assert_eq!(s.draft.features.timeframes.len(), 1);
    }

    #[test]
    fn test_patch_leaves_other_fields() {
        let store = store();
        store.update_model(ModelPatch {
            algorithm: Some(Algorithm::Sac),
            ..Default::default()
        });
        let model = store.experiment_config().model;
        assert_eq!(model.algorithm, Algorithm::Sac);
        assert_eq!(model.hidden_size, 256);
    }

    #[test]
    fn test_timeframe_lifecycle() {
        let store = store();
        let id = store.add_timeframe();
        let second = store.add_timeframe();
        assert_ne!(id, second);

        assert!(store.update_timeframe(&id, TimeframePatch {
            lookback: Some(48),
            ..Default::default()
        }));
        let tfs = store.experiment_config().features.timeframes;
        assert_eq!(tfs.len(), 3);
        assert_eq!(tfs[1].timeframe, Timeframe::M15);
        assert_eq!(tfs[1].lookback, 48);
        assert_eq!(tfs[2].lookback, 168);

        assert!(!store.update_timeframe("tf-missing", TimeframePatch::default()));
        assert!(store.remove_timeframe(&id));
        assert_eq!(store.experiment_config().features.timeframes.len(), 2);
    }

    #[test]
    fn test_apply_preset_records_preset() {
        let store = store();
        store.apply_preset(Preset::Conservative);
        let draft = store.experiment_config();
        assert_eq!(draft.model.preset, Preset::Conservative);
        assert_eq!(draft.hyperparameters.learning_rate, 0.0001);
        assert_eq!(draft.hyperparameters.clip_ratio, 0.1);
    }

    #[test]
    fn test_toggles_persist() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ExperimentStore::new(storage.clone(), "prefs");
        assert!(!store.toggle_dark_mode());
        assert!(store.toggle_sidebar());

        let raw = storage.get_item("prefs").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["isDarkMode"], false);
        assert_eq!(json["sidebarCollapsed"], true);
        assert!(json["savedConfigs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_session_fields_are_not_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let store = ExperimentStore::new(storage.clone(), "prefs");
        store.set_experiment_name("Changed");
        store.set_current_step(4);
        assert!(storage.get_item("prefs").unwrap().is_none());
    }
}
