use crate::config::EngineConfig;
use crate::locator::{locate_with, DeclarationPatterns, LocatedSymbol};
use crate::stats::{CascadeStats, Tier};
use crate::strategy::{best_match, word_parts, BroadLineMatcher, StrategySet};
use async_trait::async_trait;
use kconfig_indexer::{load_text_lenient, DefinitionIndex, Manifest, TreeWalker, Workspace};
use kconfig_protocol::{dedup_preserving_order, Confidence, SearchMethod, VerificationResult};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const MAX_DESCRIPTION_CHARS: usize = 240;

/// Everything a stage may read while verifying one symbol
pub struct StageContext<'a> {
    pub name: &'a str,
    pub workspace: &'a Workspace,
    pub config: &'a EngineConfig,
    pub index: &'a DefinitionIndex,
    pub manifest: Option<&'a Manifest>,
    pub stats: &'a CascadeStats,
}

/// One tier of the verification cascade.
///
/// `run` returns `Some` only with an available result; `None` hands over to the next tier.
#[async_trait]
pub trait Stage: Send + Sync {
    fn tier(&self) -> Tier;

    async fn run(&self, ctx: &StageContext<'_>) -> Option<VerificationResult>;
}

/// Tiers 1-4 in evaluation order
pub fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(IndexedStage),
        Box::new(BroadPatternStage),
        Box::new(ExhaustiveStage),
        Box::new(SemanticStage),
    ]
}

pub(crate) fn declared_result(
    ctx: &StageContext<'_>,
    path: &Path,
    located: LocatedSymbol,
    method: SearchMethod,
) -> VerificationResult {
    let mut result = VerificationResult::found(
        ctx.name,
        ctx.workspace.relative(path),
        located.precision.confidence(),
        method,
    )
    .with_description(located.description)
    .with_dependencies(located.dependencies);
    result.declaration_kind = Some(located.kind);
    result.symbol_type = located.symbol_type;
    result.prompt = located.prompt;
    result.context = Some(located.context);
    if located.declared_name != ctx.name {
        result.note = Some(format!(
            "Declared as {} (different letter case)",
            located.declared_name
        ));
    }
    result
}

/// Tier 1: proper declaration in the priority-directory index
pub struct IndexedStage;

#[async_trait]
impl Stage for IndexedStage {
    fn tier(&self) -> Tier {
        Tier::Indexed
    }

    async fn run(&self, ctx: &StageContext<'_>) -> Option<VerificationResult> {
        let patterns = DeclarationPatterns::new(ctx.name);
        for path in ctx.index.files() {
            let Some(text) = load_text_lenient(path).await else {
                continue;
            };
            ctx.stats.add_files_read(1);
            match locate_with(&text, &patterns) {
                Some(located) if located.precision.is_confirmed() => {
                    log::debug!("{} declared in {}", ctx.name, path.display());
                    return Some(declared_result(ctx, path, located, SearchMethod::Indexed));
                }
                _ => {}
            }
        }
        None
    }
}

/// Tier 2: looser line tests over the same files.
///
/// Reference lines (`select`, `depends on`, ...) never count as a match.
pub struct BroadPatternStage;

#[async_trait]
impl Stage for BroadPatternStage {
    fn tier(&self) -> Tier {
        Tier::BroadPattern
    }

    async fn run(&self, ctx: &StageContext<'_>) -> Option<VerificationResult> {
        let matcher = BroadLineMatcher::new(ctx.name);
        for path in ctx.index.files() {
            let Some(text) = load_text_lenient(path).await else {
                continue;
            };
            ctx.stats.add_files_read(1);
            if let Some(line) = matcher.first_line(&text) {
                let result = VerificationResult::found(
                    ctx.name,
                    ctx.workspace.relative(path),
                    Confidence::Low,
                    SearchMethod::BroadPattern,
                )
                .with_description(Some(clip(line)))
                .with_note("Mentioned in a definition file outside a standard declaration");
                return Some(result);
            }
        }
        None
    }
}

/// Tier 3: weighted strategies over a deep walk of the whole workspace
pub struct ExhaustiveStage;

impl ExhaustiveStage {
    fn over_budget(ctx: &StageContext<'_>, scanned: usize, started: Instant) -> bool {
        if scanned >= ctx.config.max_exhaustive_files {
            log::warn!(
                "Exhaustive scan for {} stopped after {scanned} files (max_exhaustive_files)",
                ctx.name
            );
            return true;
        }
        let budget = ctx.config.exhaustive_budget_ms;
        if budget > 0 && started.elapsed() > Duration::from_millis(budget) {
            log::warn!(
                "Exhaustive scan for {} stopped after {budget} ms with {scanned} files read",
                ctx.name
            );
            return true;
        }
        false
    }
}

#[async_trait]
impl Stage for ExhaustiveStage {
    fn tier(&self) -> Tier {
        Tier::Exhaustive
    }

    async fn run(&self, ctx: &StageContext<'_>) -> Option<VerificationResult> {
        let started = Instant::now();
        let walker = TreeWalker::new(ctx.config.exhaustive_walk());
        let outcome = walker.walk_async(ctx.workspace.root().to_path_buf()).await;
        if !outcome.warnings.is_empty() {
            log::warn!(
                "Exhaustive scan for {} has partial coverage ({} unreadable locations)",
                ctx.name,
                outcome.warnings.len()
            );
        }

        let strategies = StrategySet::new(ctx.name);
        let patterns = DeclarationPatterns::new(ctx.name);
        let mut loose = Vec::new();
        let mut scanned = 0usize;

        for path in &outcome.files {
            if Self::over_budget(ctx, scanned, started) {
                break;
            }
            let Some(text) = load_text_lenient(path).await else {
                continue;
            };
            scanned += 1;
            ctx.stats.add_files_read(1);

            let Some(hit) = strategies.first_match(path, &text) else {
                continue;
            };
            if let Some(located) = locate_with(&text, &patterns) {
                if located.precision.is_confirmed() {
                    return Some(declared_result(ctx, path, located, SearchMethod::Exhaustive));
                }
            }
            log::debug!(
                "{}: {} match in {}",
                ctx.name,
                hit.strategy.as_str(),
                path.display()
            );
            loose.push(hit);
        }

        let best = best_match(&loose)?;
        let result = VerificationResult::found(
            ctx.name,
            ctx.workspace.relative(&best.path),
            Confidence::Low,
            SearchMethod::ExhaustivePotential,
        )
        .with_description(Some(clip(&best.line)))
        .with_note(format!(
            "Potential match only ({}, weight {}): `{}` is not a confirmed declaration of {}",
            best.strategy.as_str(),
            best.weight,
            best.pattern,
            ctx.name
        ));
        Some(result)
    }
}

/// Tier 4: literal mentions in documentation and manifest files
pub struct SemanticStage;

impl SemanticStage {
    fn candidate_paths(ctx: &StageContext<'_>) -> Vec<PathBuf> {
        let mut relative = ctx.config.semantic_paths.clone();
        if let Some(manifest) = ctx.manifest {
            relative.extend(manifest.doc_paths());
        }
        relative.extend(ctx.workspace.component_doc_paths());
        dedup_preserving_order(relative)
            .into_iter()
            .map(|rel| ctx.workspace.root().join(rel))
            .filter(|path| path.is_file())
            .collect()
    }
}

#[async_trait]
impl Stage for SemanticStage {
    fn tier(&self) -> Tier {
        Tier::Semantic
    }

    async fn run(&self, ctx: &StageContext<'_>) -> Option<VerificationResult> {
        let mut documents = Vec::new();
        for path in Self::candidate_paths(ctx) {
            if let Some(text) = load_text_lenient(&path).await {
                ctx.stats.add_files_read(1);
                let lowered = text.to_ascii_lowercase();
                documents.push((path, text, lowered));
            }
        }

        // Full name first, then its parts, each across every document.
        let mut needles = vec![ctx.name.to_ascii_lowercase()];
        needles.extend(word_parts(ctx.name).into_iter().map(str::to_ascii_lowercase));
        let needles = dedup_preserving_order(needles);

        for needle in &needles {
            for (path, text, lowered) in &documents {
                let Some(offset) = lowered.find(needle.as_str()) else {
                    continue;
                };
                let start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
                let line = text[start..].lines().next().unwrap_or_default();
                let result = VerificationResult::found(
                    ctx.name,
                    ctx.workspace.relative(path),
                    Confidence::Medium,
                    SearchMethod::Semantic,
                )
                .with_description(Some(clip(line)))
                .with_note(format!(
                    "Only textually referenced (matched \"{needle}\"); not formally declared"
                ));
                return Some(result);
            }
        }
        None
    }
}

fn clip(line: &str) -> String {
    let line = line.trim();
    if line.chars().count() <= MAX_DESCRIPTION_CHARS {
        return line.to_string();
    }
    let mut clipped: String = line.chars().take(MAX_DESCRIPTION_CHARS).collect();
    clipped.push('…');
    clipped
}
