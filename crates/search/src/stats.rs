use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cascade tier, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Indexed,
    BroadPattern,
    Exhaustive,
    Semantic,
    KnowledgeBase,
}

/// Per-tier invocation counters of one verifier
#[derive(Debug, Default)]
pub struct CascadeStats {
    indexed: AtomicUsize,
    broad_pattern: AtomicUsize,
    exhaustive: AtomicUsize,
    semantic: AtomicUsize,
    knowledge_base: AtomicUsize,
    files_read: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeStatsSnapshot {
    pub indexed: usize,
    pub broad_pattern: usize,
    pub exhaustive: usize,
    pub semantic: usize,
    pub knowledge_base: usize,
    pub files_read: usize,
}

impl CascadeStats {
    pub fn record(&self, tier: Tier) {
        self.counter(tier).fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_files_read(&self, count: usize) {
        self.files_read.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CascadeStatsSnapshot {
        CascadeStatsSnapshot {
            indexed: self.indexed.load(Ordering::Relaxed),
            broad_pattern: self.broad_pattern.load(Ordering::Relaxed),
            exhaustive: self.exhaustive.load(Ordering::Relaxed),
            semantic: self.semantic.load(Ordering::Relaxed),
            knowledge_base: self.knowledge_base.load(Ordering::Relaxed),
            files_read: self.files_read.load(Ordering::Relaxed),
        }
    }

    fn counter(&self, tier: Tier) -> &AtomicUsize {
        match tier {
            Tier::Indexed => &self.indexed,
            Tier::BroadPattern => &self.broad_pattern,
            Tier::Exhaustive => &self.exhaustive,
            Tier::Semantic => &self.semantic,
            Tier::KnowledgeBase => &self.knowledge_base,
        }
    }
}

impl CascadeStatsSnapshot {
    /// Invocations of every tier after tier 1
    pub fn fallback_invocations(&self) -> usize {
        self.broad_pattern + self.exhaustive + self.semantic + self.knowledge_base
    }
}
