use crate::config::{EngineConfig, SubsystemRule};
use crate::error::{Result, SearchError};
use crate::knowledge::KnowledgeBase;
use crate::stages::{default_stages, Stage, StageContext};
use crate::stats::{CascadeStats, CascadeStatsSnapshot, Tier};
use kconfig_indexer::{DefinitionIndex, Manifest, Workspace};
use kconfig_protocol::{SearchMethod, VerificationResult};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

const CONFIG_PREFIX: &str = "CONFIG_";

/// Presence of a subsystem root symbol, remembered for the verifier's lifetime
#[derive(Debug, Clone)]
struct RootStatus {
    available: bool,
    source: Option<String>,
}

/// Configuration-symbol verification engine bound to one workspace.
///
/// Tiers run in strict order and the first available result wins:
/// indexed → broad pattern → exhaustive → semantic. When all of them fail the
/// knowledge base and the subsystem heuristic annotate the unavailable result.
pub struct Verifier {
    workspace: Workspace,
    config: EngineConfig,
    knowledge: KnowledgeBase,
    manifest: Option<Manifest>,
    index: OnceCell<Arc<DefinitionIndex>>,
    stages: Vec<Box<dyn Stage>>,
    stats: CascadeStats,
    roots: Mutex<HashMap<String, RootStatus>>,
}

impl Verifier {
    pub fn new(workspace: Workspace, config: EngineConfig, knowledge: KnowledgeBase) -> Self {
        Self {
            workspace,
            config,
            knowledge,
            manifest: None,
            index: OnceCell::new(),
            stages: default_stages(),
            stats: CascadeStats::default(),
            roots: Mutex::new(HashMap::new()),
        }
    }

    /// Default configuration and the built-in knowledge base
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let workspace = Workspace::open(root)?;
        Ok(Self::new(
            workspace,
            EngineConfig::default(),
            KnowledgeBase::builtin()?,
        ))
    }

    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Reuse definition files discovered earlier; an empty index is rebuilt on first use
    pub fn with_index(self, index: DefinitionIndex) -> Self {
        if !index.is_empty() {
            let _ = self.index.set(Arc::new(index));
        }
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> CascadeStatsSnapshot {
        self.stats.snapshot()
    }

    /// Priority-directory index, built by the first caller
    pub async fn definition_index(&self) -> Arc<DefinitionIndex> {
        self.index
            .get_or_init(|| async {
                let index = DefinitionIndex::build(
                    &self.workspace,
                    &self.config.priority_dirs,
                    self.config.index_walk(),
                )
                .await;
                Arc::new(index)
            })
            .await
            .clone()
    }

    /// Verify one symbol. "Not found" is an `Ok` result with `available == false`.
    pub async fn verify(&self, name: &str) -> Result<VerificationResult> {
        let name = normalize_symbol(name)?;
        if let Some(result) = self.run_stages(&name).await {
            self.remember_root(&result);
            return Ok(result);
        }
        Ok(self.explain_failure(&name).await)
    }

    /// Verify several symbols concurrently; results keep the request order.
    ///
    /// An empty name yields an unavailable entry with a warning instead of failing the batch.
    pub async fn verify_all(self: &Arc<Self>, names: &[String]) -> Result<Vec<VerificationResult>> {
        // Build the shared index once before fanning out.
        self.definition_index().await;

        let mut tasks = JoinSet::new();
        for (idx, name) in names.iter().enumerate() {
            let verifier = Arc::clone(self);
            let name = name.clone();
            tasks.spawn(async move { (idx, verifier.verify(&name).await) });
        }

        let mut slots: Vec<Option<VerificationResult>> = vec![None; names.len()];
        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = joined?;
            let result = match result {
                Err(SearchError::EmptySymbol) => {
                    let mut empty = VerificationResult::unavailable(names[idx].trim());
                    empty.warning = Some(SearchError::EmptySymbol.to_string());
                    empty
                }
                other => other?,
            };
            slots[idx] = Some(result);
        }
        Ok(slots.into_iter().flatten().collect())
    }

    async fn run_stages(&self, name: &str) -> Option<VerificationResult> {
        let index = self.definition_index().await;
        let ctx = StageContext {
            name,
            workspace: &self.workspace,
            config: &self.config,
            index: &index,
            manifest: self.manifest.as_ref(),
            stats: &self.stats,
        };
        for stage in &self.stages {
            self.stats.record(stage.tier());
            if let Some(result) = stage.run(&ctx).await {
                log::debug!(
                    "{name}: resolved by {} ({:?})",
                    result.search_method.as_str(),
                    result.confidence
                );
                return Some(result);
            }
        }
        None
    }

    async fn explain_failure(&self, name: &str) -> VerificationResult {
        let mut result = VerificationResult::unavailable(name);

        self.stats.record(Tier::KnowledgeBase);
        if let Some(entry) = self.knowledge.lookup(name) {
            result.search_method = SearchMethod::KnowledgeBase;
            result.add_alternatives(entry.alternatives.iter().cloned());
            result.add_suggestions(entry.suggestions.iter().cloned());
            result.warning = entry.warning.clone();
        }

        if let Some(rule) = self.config.subsystem_for(name).cloned() {
            self.annotate_subsystem(&mut result, &rule).await;
        }

        log::info!("{name}: not found ({})", result.search_method.as_str());
        result
    }

    async fn annotate_subsystem(&self, result: &mut VerificationResult, rule: &SubsystemRule) {
        result.add_suggestions([format!(
            "Enable the {} subsystem with CONFIG_{}=y",
            rule.label, rule.root
        )]);

        let root = self.root_status(&rule.root).await;
        if root.available {
            let location = root.source.unwrap_or_default();
            result.add_suggestions([format!(
                "{} is declared in {location}; {} may belong to a newer or different SDK release",
                rule.root, result.name
            )]);
        } else if result.warning.is_none() {
            result.warning = Some(format!(
                "{} itself was not found; the {} subsystem may be missing from this workspace",
                rule.root, rule.label
            ));
        }
    }

    async fn root_status(&self, root: &str) -> RootStatus {
        let cached = self.lock_roots().get(root).cloned();
        if let Some(known) = cached {
            return known;
        }
        let status = match self.run_stages(root).await {
            Some(found) => RootStatus {
                available: true,
                source: found.source,
            },
            None => RootStatus {
                available: false,
                source: None,
            },
        };
        self.lock_roots()
            .insert(root.to_string(), status.clone());
        status
    }

    fn remember_root(&self, result: &VerificationResult) {
        let is_root = self
            .config
            .subsystems
            .iter()
            .any(|rule| rule.root == result.name);
        if is_root {
            self.lock_roots().insert(
                result.name.clone(),
                RootStatus {
                    available: result.available,
                    source: result.source.clone(),
                },
            );
        }
    }

    fn lock_roots(&self) -> std::sync::MutexGuard<'_, HashMap<String, RootStatus>> {
        self.roots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Trim and drop a leading `CONFIG_`
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let name = trimmed.strip_prefix(CONFIG_PREFIX).unwrap_or(trimmed);
    if name.is_empty() {
        return Err(SearchError::EmptySymbol);
    }
    Ok(name.to_string())
}
