//! Provider registry with ranked, flag-aware candidate selection.
//!
//! Registered providers carry two independent flags: `enabled` is the
//! operator switch (admin API), `active` reflects whether the adapter has
//! working credentials. Selection reads both at call time, so a toggle is
//! visible to the very next request. Ranking is per category; a provider
//! with no rank for the requested category borrows its rank for
//! [`DEFAULT_RANK_CATEGORY`], and one with no rank at all sorts last.
//! Ties keep registration order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tryfit_core::Category;

use crate::provider::TryOnProvider;

/// Category whose rank is borrowed when a provider has no rank for the
/// requested one.
pub const DEFAULT_RANK_CATEGORY: Category = Category::UpperBody;

/// Rank assigned to providers with no priority entry at all. Sorts last.
const UNRANKED: u32 = u32::MAX;

/// Runtime switches for a registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderFlags {
    /// Operator switch. Disabled providers are never invoked, not even by
    /// an explicit override.
    pub enabled: bool,
    /// Credential health. Inactive providers are skipped by ranked
    /// selection but still honored by an explicit override.
    pub active: bool,
}

impl Default for ProviderFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            active: true,
        }
    }
}

/// A provider plus its selection metadata, handed to [`ProviderRegistry::register`].
pub struct Registration {
    /// The adapter implementation.
    pub provider: Arc<dyn TryOnProvider>,
    /// Per-attempt deadline for this provider.
    pub timeout: Duration,
    /// Category ranks. Lower wins.
    pub priorities: HashMap<Category, u32>,
    /// Initial operator switch.
    pub enabled: bool,
    /// Initial credential health.
    pub active: bool,
}

impl Registration {
    /// Registration with default flags and no ranks.
    #[must_use]
    pub fn new(provider: Arc<dyn TryOnProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            priorities: HashMap::new(),
            enabled: true,
            active: true,
        }
    }

    /// Set this provider's rank for one category.
    #[must_use]
    pub fn with_priority(mut self, category: Category, rank: u32) -> Self {
        self.priorities.insert(category, rank);
        self
    }

    /// Set the initial credential-health flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the initial operator switch.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A selected provider ready to be attempted.
#[derive(Clone)]
pub struct Candidate {
    /// Registered provider name.
    pub name: String,
    /// The adapter to invoke.
    pub provider: Arc<dyn TryOnProvider>,
    /// Per-attempt deadline.
    pub timeout: Duration,
}

/// Serializable snapshot of one registration, for the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Registered provider name.
    pub name: String,
    /// Operator switch.
    pub enabled: bool,
    /// Credential health.
    pub active: bool,
    /// Per-attempt deadline in seconds.
    pub timeout_secs: u64,
    /// Category ranks, keyed by category name.
    pub priorities: BTreeMap<String, u32>,
}

/// Selection failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    /// Every registered provider is switched off or unhealthy.
    #[error("no provider available for category {category}")]
    NoProviderAvailable {
        /// The category that was requested.
        category: Category,
    },

    /// An explicitly named provider exists but is switched off.
    #[error("provider {name} is disabled")]
    ProviderDisabled {
        /// The provider that was named.
        name: String,
    },

    /// No provider is registered under the requested name.
    #[error("unknown provider {name}")]
    UnknownProvider {
        /// The provider that was named.
        name: String,
    },
}

struct RegistryEntry {
    provider: Arc<dyn TryOnProvider>,
    timeout: Duration,
    priorities: HashMap<Category, u32>,
    flags: RwLock<ProviderFlags>,
}

impl RegistryEntry {
    fn flags(&self) -> ProviderFlags {
        *self.flags.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn rank_for(&self, category: Category) -> u32 {
        self.priorities
            .get(&category)
            .or_else(|| self.priorities.get(&DEFAULT_RANK_CATEGORY))
            .copied()
            .unwrap_or(UNRANKED)
    }

    fn candidate(&self) -> Candidate {
        Candidate {
            name: self.provider.name().to_string(),
            provider: Arc::clone(&self.provider),
            timeout: self.timeout,
        }
    }
}

/// Ordered collection of registered providers.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<RegistryEntry>,
}

impl ProviderRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Re-registering a name replaces the earlier
    /// entry in place, keeping its position in the tie-break order.
    pub fn register(&mut self, registration: Registration) {
        let entry = RegistryEntry {
            provider: registration.provider,
            timeout: registration.timeout,
            priorities: registration.priorities,
            flags: RwLock::new(ProviderFlags {
                enabled: registration.enabled,
                active: registration.active,
            }),
        };

        let name = entry.provider.name();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.provider.name() == name)
        {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Number of registered providers, regardless of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Eligible providers for `category`, best first.
    ///
    /// Flags are read per call, so admin toggles apply to the next request.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::NoProviderAvailable`] when no registered
    /// provider is both enabled and active.
    pub fn select_candidates(&self, category: Category) -> Result<Vec<Candidate>, SelectError> {
        let mut ranked: Vec<(u32, &RegistryEntry)> = self
            .entries
            .iter()
            .filter(|entry| {
                let flags = entry.flags();
                flags.enabled && flags.active
            })
            .map(|entry| (entry.rank_for(category), entry))
            .collect();

        if ranked.is_empty() {
            return Err(SelectError::NoProviderAvailable { category });
        }

        // Stable sort keeps registration order for equal ranks.
        ranked.sort_by_key(|(rank, _)| *rank);

        Ok(ranked.into_iter().map(|(_, e)| e.candidate()).collect())
    }

    /// Look up one provider by name for an explicit override.
    ///
    /// The `active` flag is ignored here: naming a provider means the caller
    /// wants it even if its credentials look unhealthy. The `enabled`
    /// operator switch still applies.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::UnknownProvider`] when the name is not
    /// registered and [`SelectError::ProviderDisabled`] when it is switched
    /// off.
    pub fn candidate_for(&self, name: &str) -> Result<Candidate, SelectError> {
        let entry = self.entry(name)?;
        if !entry.flags().enabled {
            return Err(SelectError::ProviderDisabled {
                name: name.to_string(),
            });
        }
        Ok(entry.candidate())
    }

    /// Update either flag for one provider, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::UnknownProvider`] when the name is not
    /// registered.
    pub fn set_flags(
        &self,
        name: &str,
        enabled: Option<bool>,
        active: Option<bool>,
    ) -> Result<ProviderFlags, SelectError> {
        let entry = self.entry(name)?;
        let mut flags = entry.flags.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(enabled) = enabled {
            flags.enabled = enabled;
        }
        if let Some(active) = active {
            flags.active = active;
        }
        Ok(*flags)
    }

    /// Snapshot of every registration, in registration order.
    #[must_use]
    pub fn statuses(&self) -> Vec<ProviderStatus> {
        self.entries
            .iter()
            .map(|entry| {
                let flags = entry.flags();
                ProviderStatus {
                    name: entry.provider.name().to_string(),
                    enabled: flags.enabled,
                    active: flags.active,
                    timeout_secs: entry.timeout.as_secs(),
                    priorities: entry
                        .priorities
                        .iter()
                        .map(|(category, rank)| (category.as_str().to_string(), *rank))
                        .collect(),
                }
            })
            .collect()
    }

    fn entry(&self, name: &str) -> Result<&RegistryEntry, SelectError> {
        self.entries
            .iter()
            .find(|e| e.provider.name() == name)
            .ok_or_else(|| SelectError::UnknownProvider {
                name: name.to_string(),
            })
    }
}
