//! Rule catalog construction and the memoized, process-wide registry.
//!
//! Rules register through an explicit list of constructors
//! (`builtin::all_rules`). The catalog is built from that list on first use,
//! cached, and rebuilt only on `reload` or `reload_with`, both of which
//! discard earlier overrides.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{debug, info};

use super::executor::{self, ExecutorOptions};
use super::overrides::{self, CustomRuleOverride, OverrideReport};
use super::score;
use super::{builtin, Evaluation, Rule, RuleDescriptor};
use crate::error::{PostureError, Result, RuleError};
use crate::snapshot::TenantSnapshot;

/// Constructor for one rule type.
#[derive(Clone, Copy)]
pub struct RuleRegistration {
    pub type_name: &'static str,
    pub build: fn() -> std::result::Result<Box<dyn Rule>, RuleError>,
}

impl RuleRegistration {
    pub fn new(
        type_name: &'static str,
        build: fn() -> std::result::Result<Box<dyn Rule>, RuleError>,
    ) -> Self {
        Self { type_name, build }
    }

    /// Register a rule type constructible through `Default`.
    pub fn of<T: Rule + Default + 'static>() -> Self {
        Self {
            type_name: short_type_name::<T>(),
            build: build_default::<T>,
        }
    }
}

impl std::fmt::Debug for RuleRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RuleRegistration").field(&self.type_name).finish()
    }
}

fn build_default<T: Rule + Default + 'static>() -> std::result::Result<Box<dyn Rule>, RuleError> {
    Ok(Box::new(T::default()))
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// A live rule instance bound to its resolved descriptor.
pub struct CatalogEntry {
    rule_type: &'static str,
    rule: Box<dyn Rule>,
    descriptor: RuleDescriptor,
}

impl CatalogEntry {
    pub fn rule_type(&self) -> &'static str {
        self.rule_type
    }

    pub fn rule(&self) -> &dyn Rule {
        self.rule.as_ref()
    }

    /// Descriptor after overrides.
    pub fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    pub(crate) fn descriptor_mut(&mut self) -> &mut RuleDescriptor {
        &mut self.descriptor
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("rule_type", &self.rule_type)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Ordered set of rule instances keyed by risk id.
#[derive(Debug, Default)]
pub struct RuleCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl RuleCatalog {
    /// Instantiate every registration exactly once.
    ///
    /// Fails on the first constructor error, empty risk id, or duplicate
    /// risk id. A broken rule type never silently drops out of the catalog.
    pub fn build(registrations: &[RuleRegistration]) -> Result<Self> {
        let mut catalog = Self::default();

        for registration in registrations {
            let rule = (registration.build)().map_err(|source| {
                PostureError::CatalogConstruction {
                    rule_type: registration.type_name.to_string(),
                    source,
                }
            })?;
            let descriptor = rule.descriptor();

            if descriptor.risk_id.trim().is_empty() {
                return Err(PostureError::CatalogConstruction {
                    rule_type: registration.type_name.to_string(),
                    source: RuleError::InvalidDescriptor("empty risk id".into()),
                });
            }

            if let Some(&existing) = catalog.index.get(&descriptor.risk_id) {
                return Err(PostureError::DuplicateRiskId {
                    risk_id: descriptor.risk_id,
                    first: catalog.entries[existing].rule_type.to_string(),
                    second: registration.type_name.to_string(),
                });
            }

            debug!(risk_id = %descriptor.risk_id, rule_type = registration.type_name, "registered rule");
            catalog
                .index
                .insert(descriptor.risk_id.clone(), catalog.entries.len());
            catalog.entries.push(CatalogEntry {
                rule_type: registration.type_name,
                rule,
                descriptor,
            });
        }

        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    pub fn get(&self, risk_id: &str) -> Option<&CatalogEntry> {
        self.index.get(risk_id).map(|&i| &self.entries[i])
    }

    pub(crate) fn get_mut(&mut self, risk_id: &str) -> Option<&mut CatalogEntry> {
        match self.index.get(risk_id) {
            Some(&i) => self.entries.get_mut(i),
            None => None,
        }
    }

    pub fn descriptor(&self, risk_id: &str) -> Option<&RuleDescriptor> {
        self.get(risk_id).map(CatalogEntry::descriptor)
    }

    pub fn risk_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.descriptor.risk_id.as_str())
    }
}

static GLOBAL: Lazy<RuleRegistry> = Lazy::new(RuleRegistry::builtin);

/// Lazily built, memoized rule catalog.
///
/// Evaluations share the catalog under a read lock. Overrides and reloads
/// take the write lock.
#[derive(Debug)]
pub struct RuleRegistry {
    registrations: Vec<RuleRegistration>,
    catalog: RwLock<Option<RuleCatalog>>,
}

impl RuleRegistry {
    pub fn new(registrations: Vec<RuleRegistration>) -> Self {
        Self {
            registrations,
            catalog: RwLock::new(None),
        }
    }

    /// Registry over the built-in rule set.
    pub fn builtin() -> Self {
        Self::new(builtin::all_rules())
    }

    /// Process-wide registry over the built-in rule set.
    pub fn global() -> &'static RuleRegistry {
        &GLOBAL
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.read().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Run `f` against the catalog, building it first if needed.
    pub fn with_catalog<R>(&self, f: impl FnOnce(&RuleCatalog) -> R) -> Result<R> {
        {
            let guard = self.catalog.read().map_err(poisoned)?;
            if let Some(catalog) = guard.as_ref() {
                return Ok(f(catalog));
            }
        }

        let mut guard = self.catalog.write().map_err(poisoned)?;
        self.ensure_built(&mut guard)?;
        guard
            .as_ref()
            .map(f)
            .ok_or_else(|| PostureError::Internal("rule catalog missing after build".into()))
    }

    pub fn with_catalog_mut<R>(&self, f: impl FnOnce(&mut RuleCatalog) -> R) -> Result<R> {
        let mut guard = self.catalog.write().map_err(poisoned)?;
        self.ensure_built(&mut guard)?;
        guard
            .as_mut()
            .map(f)
            .ok_or_else(|| PostureError::Internal("rule catalog missing after build".into()))
    }

    /// Rebuild the catalog from the registrations, dropping overrides.
    pub fn reload(&self) -> Result<()> {
        let catalog = RuleCatalog::build(&self.registrations)?;
        let mut guard = self.catalog.write().map_err(poisoned)?;
        info!(rules = catalog.len(), "rule catalog reloaded");
        *guard = Some(catalog);
        Ok(())
    }

    /// Apply overrides on top of the current catalog, including any earlier
    /// overrides.
    pub fn apply_overrides(&self, overrides: &[CustomRuleOverride]) -> Result<OverrideReport> {
        self.with_catalog_mut(|catalog| overrides::apply(catalog, overrides))
    }

    /// Rebuild the catalog and apply `overrides` to the fresh copy, swapping
    /// it in under one write lock. Nothing from an earlier configuration
    /// survives.
    pub fn reload_with(&self, overrides: &[CustomRuleOverride]) -> Result<OverrideReport> {
        let mut catalog = RuleCatalog::build(&self.registrations)?;
        let report = overrides::apply(&mut catalog, overrides);
        let mut guard = self.catalog.write().map_err(poisoned)?;
        debug!(
            rules = catalog.len(),
            applied = report.applied.len(),
            "rule catalog rebuilt with overrides"
        );
        *guard = Some(catalog);
        Ok(report)
    }

    /// Title of a rule, or an empty string for unknown ids.
    pub fn rule_description(&self, risk_id: &str) -> Result<String> {
        self.with_catalog(|catalog| {
            catalog
                .descriptor(risk_id)
                .map(|d| d.title.clone())
                .unwrap_or_default()
        })
    }

    /// Resolved descriptor of a rule, if it exists.
    pub fn rule_from_id(&self, risk_id: &str) -> Result<Option<RuleDescriptor>> {
        self.with_catalog(|catalog| catalog.descriptor(risk_id).cloned())
    }

    /// All resolved descriptors in catalog order.
    pub fn descriptors(&self) -> Result<Vec<RuleDescriptor>> {
        self.with_catalog(|catalog| catalog.iter().map(|e| e.descriptor().clone()).collect())
    }

    /// Run the catalog against `snapshot` and write the score summary back.
    ///
    /// Execution and aggregation take the catalog separately; aggregation
    /// sees any override applied in between.
    pub fn evaluate(
        &self,
        snapshot: &mut TenantSnapshot,
        options: &ExecutorOptions,
    ) -> Result<Evaluation> {
        let outcome = self.with_catalog(|catalog| executor::run(catalog, snapshot, options))?;
        let score = self.with_catalog(|catalog| score::aggregate(catalog, &outcome.matches))?;
        score.write_to(snapshot);

        info!(
            tenant = %snapshot.tenant_name,
            matched = outcome.matches.len(),
            failed = outcome.failures.len(),
            global_score = score.global_score,
            maturity_level = score.maturity_level,
            "evaluation complete"
        );

        Ok(Evaluation {
            matches: outcome.matches,
            failures: outcome.failures,
            skipped: outcome.skipped,
            score,
        })
    }

    fn ensure_built(&self, slot: &mut Option<RuleCatalog>) -> Result<()> {
        if slot.is_none() {
            let catalog = RuleCatalog::build(&self.registrations)?;
            info!(rules = catalog.len(), "rule catalog built");
            *slot = Some(catalog);
        }
        Ok(())
    }
}

fn poisoned<T>(_: PoisonError<T>) -> PostureError {
    PostureError::Internal("rule catalog lock poisoned".into())
}
