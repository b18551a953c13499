//! Registry of license type strategies, populated at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::licensing::{License, LicenseError, LicenseFields};

use super::{LicenseTypeDescriptor, LicenseTypeStrategy};

/// Strategies keyed by license kind.
#[derive(Default, Clone)]
pub struct LicenseTypeRegistry {
    strategies: BTreeMap<String, Arc<dyn LicenseTypeStrategy>>,
}

impl LicenseTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy under its descriptor id.
    ///
    /// # Errors
    ///
    /// `InvalidStrategy` when the id or label is blank or the id is taken.
    pub fn register(&mut self, strategy: Arc<dyn LicenseTypeStrategy>) -> Result<(), LicenseError> {
        let descriptor = strategy.descriptor();
        if descriptor.id.trim().is_empty() {
            return Err(LicenseError::invalid_strategy(descriptor.id, "missing id"));
        }
        if descriptor.label.trim().is_empty() {
            return Err(LicenseError::invalid_strategy(descriptor.id, "missing label"));
        }
        if self.strategies.contains_key(&descriptor.id) {
            return Err(LicenseError::invalid_strategy(descriptor.id, "already registered"));
        }

        tracing::debug!(kind = %descriptor.id, label = %descriptor.label, "Registered license type");
        self.strategies.insert(descriptor.id, strategy);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, strategy: Arc<dyn LicenseTypeStrategy>) -> Result<Self, LicenseError> {
        self.register(strategy)?;
        Ok(self)
    }

    /// Returns the strategy for `kind`.
    pub fn get(&self, kind: &str) -> Result<Arc<dyn LicenseTypeStrategy>, LicenseError> {
        self.strategies
            .get(kind)
            .cloned()
            .ok_or_else(|| LicenseError::unknown_kind(kind))
    }

    /// Descriptors of every registered kind, ordered by id.
    pub fn list(&self) -> Vec<LicenseTypeDescriptor> {
        self.strategies.values().map(|s| s.descriptor()).collect()
    }

    /// Pairs the strategy for `kind` with offering settings.
    pub fn configure(
        &self,
        kind: &str,
        settings: LicenseFields,
    ) -> Result<ConfiguredLicenseType, LicenseError> {
        ConfiguredLicenseType::new(self.get(kind)?, settings)
    }

    /// Display label of a license.
    pub fn label_for(&self, license: &License) -> Result<String, LicenseError> {
        Ok(self.get(license.kind())?.label(license))
    }
}

impl std::fmt::Debug for LicenseTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseTypeRegistry")
            .field("kinds", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A strategy bound to the settings an offering was designed with.
#[derive(Clone)]
pub struct ConfiguredLicenseType {
    strategy: Arc<dyn LicenseTypeStrategy>,
    settings: LicenseFields,
}

impl ConfiguredLicenseType {
    /// Validates `settings` against the strategy's field schema.
    pub fn new(
        strategy: Arc<dyn LicenseTypeStrategy>,
        settings: LicenseFields,
    ) -> Result<Self, LicenseError> {
        strategy.field_schema().validate(&settings)?;
        Ok(Self { strategy, settings })
    }

    pub fn descriptor(&self) -> LicenseTypeDescriptor {
        self.strategy.descriptor()
    }

    pub fn strategy(&self) -> &Arc<dyn LicenseTypeStrategy> {
        &self.strategy
    }

    pub fn settings(&self) -> &LicenseFields {
        &self.settings
    }

    /// Default field values a new license of this offering starts with.
    pub fn default_fields(&self) -> LicenseFields {
        self.settings.clone()
    }
}

impl std::fmt::Debug for ConfiguredLicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredLicenseType")
            .field("kind", &self.strategy.descriptor().id)
            .field("settings", &self.settings)
            .finish()
    }
}
