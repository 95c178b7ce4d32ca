//! Active AI provider selection
//!
//! The registry holds exactly one committed [`ProviderSelection`] at any
//! instant. Readers clone an `Arc` to the committed value and keep using it
//! for the rest of their claim, so a switch never changes the trajectory of
//! work already in flight.
//!
//! Updates run as a compare-and-set loop over a version counter: the decision
//! is computed from a snapshot outside the lock, and committed only if no
//! other switch landed in between. On contention the whole decision is
//! recomputed from the fresh snapshot.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use core_kernel::Temperature;

use crate::error::RegistryError;
use crate::ports::{LlmPort, VectorIndexPort};

/// The closed set of supported AI backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Ollama,
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

impl AiProvider {
    pub const ALL: [AiProvider; 3] = [AiProvider::Ollama, AiProvider::Gemini, AiProvider::OpenAi];

    /// Lower-case name used by the configuration surface
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::Ollama => "ollama",
            AiProvider::Gemini => "gemini",
            AiProvider::OpenAi => "openai",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(AiProvider::Ollama),
            "gemini" => Ok(AiProvider::Gemini),
            "openai" => Ok(AiProvider::OpenAi),
            _ => Err(RegistryError::UnknownProvider(s.to_string())),
        }
    }
}

/// The LLM capability and vector index paired with one provider
#[derive(Clone)]
pub struct ProviderBinding {
    pub llm: Arc<dyn LlmPort>,
    pub index: Arc<dyn VectorIndexPort>,
}

impl ProviderBinding {
    pub fn new(llm: Arc<dyn LlmPort>, index: Arc<dyn VectorIndexPort>) -> Self {
        Self { llm, index }
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("llm", &self.llm.label())
            .field("index", &self.index.index_name())
            .finish()
    }
}

/// Static provider -> binding table
///
/// Adding a provider means adding a variant and a field here; call sites go
/// through [`ProviderBindings::get`].
#[derive(Debug, Clone)]
pub struct ProviderBindings {
    ollama: ProviderBinding,
    gemini: ProviderBinding,
    openai: ProviderBinding,
}

impl ProviderBindings {
    pub fn new(ollama: ProviderBinding, gemini: ProviderBinding, openai: ProviderBinding) -> Self {
        Self {
            ollama,
            gemini,
            openai,
        }
    }

    pub fn get(&self, provider: AiProvider) -> &ProviderBinding {
        match provider {
            AiProvider::Ollama => &self.ollama,
            AiProvider::Gemini => &self.gemini,
            AiProvider::OpenAi => &self.openai,
        }
    }
}

/// A complete, immutable `{provider, temperature, index}` tuple
#[derive(Clone)]
pub struct ProviderSelection {
    pub provider: AiProvider,
    pub temperature: Temperature,
    pub index: Arc<dyn VectorIndexPort>,
}

impl fmt::Debug for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSelection")
            .field("provider", &self.provider)
            .field("temperature", &self.temperature)
            .field("index", &self.index.index_name())
            .finish()
    }
}

/// Result of a successful `switch` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// A new selection was committed
    Switched { from: AiProvider, to: AiProvider },
    /// The requested provider was already active; nothing changed
    Unchanged(AiProvider),
}

impl SwitchOutcome {
    /// The provider active after the call
    pub fn provider(&self) -> AiProvider {
        match self {
            SwitchOutcome::Switched { to, .. } => *to,
            SwitchOutcome::Unchanged(provider) => *provider,
        }
    }
}

struct Committed {
    version: u64,
    selection: Arc<ProviderSelection>,
}

/// Holder of the active provider selection
pub struct ProviderRegistry {
    bindings: ProviderBindings,
    cell: RwLock<Committed>,
}

impl ProviderRegistry {
    /// Creates a registry with the given initial provider and temperature
    pub fn new(bindings: ProviderBindings, provider: AiProvider, temperature: Temperature) -> Self {
        let selection = Arc::new(ProviderSelection {
            provider,
            temperature,
            index: Arc::clone(&bindings.get(provider).index),
        });
        Self {
            bindings,
            cell: RwLock::new(Committed {
                version: 0,
                selection,
            }),
        }
    }

    /// Ollama at temperature 0.3
    pub fn with_defaults(bindings: ProviderBindings) -> Self {
        Self::new(bindings, AiProvider::Ollama, Temperature::DEFAULT)
    }

    pub fn bindings(&self) -> &ProviderBindings {
        &self.bindings
    }

    /// Latest committed selection
    pub fn current(&self) -> Arc<ProviderSelection> {
        Arc::clone(&self.cell.read().selection)
    }

    /// Switches the active provider
    ///
    /// Switching to the provider that is already active is a no-op, including
    /// for the temperature.
    pub fn switch(&self, name: &str, temperature: Temperature) -> Result<SwitchOutcome, RegistryError> {
        let provider = name.parse::<AiProvider>().map_err(|e| {
            warn!(requested = %name, "Rejected switch to unknown AI provider");
            e
        })?;

        loop {
            let (version, snapshot) = {
                let committed = self.cell.read();
                (committed.version, Arc::clone(&committed.selection))
            };

            if snapshot.provider == provider {
                debug!(provider = %provider, "Provider already active, switch is a no-op");
                return Ok(SwitchOutcome::Unchanged(provider));
            }

            let next = Arc::new(ProviderSelection {
                provider,
                temperature,
                index: Arc::clone(&self.bindings.get(provider).index),
            });

            let mut committed = self.cell.write();
            if committed.version != version {
                debug!("Concurrent provider switch detected, retrying");
                continue;
            }
            committed.version += 1;
            committed.selection = next;
            drop(committed);

            info!(
                from = %snapshot.provider,
                to = %provider,
                temperature = temperature.value(),
                "Switched active AI provider"
            );
            return Ok(SwitchOutcome::Switched {
                from: snapshot.provider,
                to: provider,
            });
        }
    }

    /// Index bound to `name`, or the active index if the name is unknown
    pub fn resolve_index(&self, name: &str) -> Arc<dyn VectorIndexPort> {
        match name.parse::<AiProvider>() {
            Ok(provider) => Arc::clone(&self.bindings.get(provider).index),
            Err(_) => {
                debug!(requested = %name, "Unknown provider requested, using active index");
                Arc::clone(&self.current().index)
            }
        }
    }

    /// LLM capability bound to `provider`
    pub fn llm_for(&self, provider: AiProvider) -> Arc<dyn LlmPort> {
        Arc::clone(&self.bindings.get(provider).llm)
    }

    /// Selection for one claim, starting from a snapshot taken at entry
    ///
    /// An unknown requested provider falls back to the snapshot's provider
    /// and index. A requested temperature outside `[0, 1]` is ignored.
    pub fn resolve_for_claim(
        &self,
        snapshot: &ProviderSelection,
        requested_provider: Option<&str>,
        requested_temperature: Option<f64>,
    ) -> ProviderSelection {
        let provider = match requested_provider.map(str::parse::<AiProvider>) {
            Some(Ok(provider)) => provider,
            Some(Err(_)) => {
                debug!(requested = ?requested_provider, "Unknown per-claim provider, using active");
                snapshot.provider
            }
            None => snapshot.provider,
        };

        let temperature = match requested_temperature.map(Temperature::new) {
            Some(Ok(temperature)) => temperature,
            Some(Err(e)) => {
                debug!(error = %e, "Ignoring per-claim temperature");
                snapshot.temperature
            }
            None => snapshot.temperature,
        };

        let index = if provider == snapshot.provider {
            Arc::clone(&snapshot.index)
        } else {
            Arc::clone(&self.bindings.get(provider).index)
        };

        ProviderSelection {
            provider,
            temperature,
            index,
        }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("current", &self.current())
            .finish()
    }
}
