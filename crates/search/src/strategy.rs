use crate::locator::DECLARATION_TAIL;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Text strategies of the exhaustive scan, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    ExactDeclaration,
    CaseInsensitiveDeclaration,
    PrefixDeclaration,
    SuffixDeclaration,
    InfixDeclaration,
    Substring,
}

impl MatchStrategy {
    pub const ORDERED: [MatchStrategy; 6] = [
        MatchStrategy::ExactDeclaration,
        MatchStrategy::CaseInsensitiveDeclaration,
        MatchStrategy::PrefixDeclaration,
        MatchStrategy::SuffixDeclaration,
        MatchStrategy::InfixDeclaration,
        MatchStrategy::Substring,
    ];

    pub const fn weight(self) -> u32 {
        match self {
            MatchStrategy::ExactDeclaration => 100,
            MatchStrategy::CaseInsensitiveDeclaration => 90,
            MatchStrategy::PrefixDeclaration => 70,
            MatchStrategy::SuffixDeclaration => 60,
            MatchStrategy::InfixDeclaration => 50,
            MatchStrategy::Substring => 10,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MatchStrategy::ExactDeclaration => "exact_declaration",
            MatchStrategy::CaseInsensitiveDeclaration => "case_insensitive_declaration",
            MatchStrategy::PrefixDeclaration => "prefix_declaration",
            MatchStrategy::SuffixDeclaration => "suffix_declaration",
            MatchStrategy::InfixDeclaration => "infix_declaration",
            MatchStrategy::Substring => "substring",
        }
    }
}

/// One strategy hit in one file; lives for a single strategy pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch {
    pub path: PathBuf,
    pub strategy: MatchStrategy,
    /// The matched text
    pub pattern: String,
    /// Trimmed line containing the match
    pub line: String,
    pub byte_offset: usize,
    pub weight: u32,
}

impl SymbolMatch {
    /// Ranking order: higher weight first, then smaller path
    pub fn rank(&self, other: &Self) -> Ordering {
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| self.path.cmp(&other.path))
    }
}

/// Best candidate under [`SymbolMatch::rank`], independent of input order
pub fn best_match(candidates: &[SymbolMatch]) -> Option<&SymbolMatch> {
    candidates.iter().min_by(|a, b| a.rank(b))
}

/// Compiled weighted strategies for one symbol
pub struct StrategySet {
    compiled: Vec<(MatchStrategy, Regex)>,
}

impl StrategySet {
    pub fn new(name: &str) -> Self {
        let n = regex::escape(name);
        let decl = r"^[ \t]*(?:menuconfig|config)[ \t]+";
        let tail = DECLARATION_TAIL;
        let compiled = MatchStrategy::ORDERED
            .into_iter()
            .map(|strategy| {
                let (pattern, ci) = match strategy {
                    MatchStrategy::ExactDeclaration => (format!(r"{decl}{n}{tail}"), false),
                    MatchStrategy::CaseInsensitiveDeclaration => {
                        (format!(r"{decl}{n}{tail}"), true)
                    }
                    MatchStrategy::PrefixDeclaration => {
                        (format!(r"{decl}{n}[A-Za-z0-9_]+{tail}"), true)
                    }
                    MatchStrategy::SuffixDeclaration => {
                        (format!(r"{decl}[A-Za-z0-9_]+{n}{tail}"), true)
                    }
                    MatchStrategy::InfixDeclaration => {
                        (format!(r"{decl}[A-Za-z0-9_]+{n}[A-Za-z0-9_]+"), true)
                    }
                    MatchStrategy::Substring => (n.clone(), true),
                };
                let regex = RegexBuilder::new(&pattern)
                    .multi_line(true)
                    .case_insensitive(ci)
                    .build()
                    .expect("escaped symbol names always form a valid pattern");
                (strategy, regex)
            })
            .collect();
        Self { compiled }
    }

    /// First strategy (in weight order) that matches anywhere in `text`
    pub fn first_match(&self, path: &Path, text: &str) -> Option<SymbolMatch> {
        self.compiled.iter().find_map(|(strategy, regex)| {
            regex.find(text).map(|m| SymbolMatch {
                path: path.to_path_buf(),
                strategy: *strategy,
                pattern: m.as_str().trim().to_string(),
                line: line_at(text, m.start()).trim().to_string(),
                byte_offset: m.start(),
                weight: strategy.weight(),
            })
        })
    }
}

fn line_at(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len());
    &text[start..end]
}

/// Looser line tests used against the indexed files
pub struct BroadLineMatcher {
    word: Regex,
    stems: Vec<String>,
    lowered: String,
}

impl BroadLineMatcher {
    pub fn new(name: &str) -> Self {
        let word = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
            .expect("escaped symbol names always form a valid pattern");
        Self {
            word,
            stems: word_parts(name)
                .into_iter()
                .map(|part| part.to_lowercase())
                .collect(),
            lowered: name.to_lowercase(),
        }
    }

    /// First non-reference line matching the strongest applicable test
    pub fn first_line<'a>(&self, text: &'a str) -> Option<&'a str> {
        (0..3)
            .find_map(|level| {
                text.lines()
                    .find(|line| !is_reference_line(line) && self.test(level, line))
            })
            .map(str::trim)
    }

    fn test(&self, level: u8, line: &str) -> bool {
        match level {
            0 => self.word.is_match(line),
            1 => self.matches_stems(line),
            _ => line.to_lowercase().contains(&self.lowered),
        }
    }

    fn matches_stems(&self, line: &str) -> bool {
        if self.stems.is_empty() {
            return false;
        }
        let lowered = line.to_lowercase();
        self.stems.iter().all(|stem| lowered.contains(stem.as_str()))
    }
}

/// Attribute lines that use other symbols as operands
const REFERENCE_KEYWORDS: &[&str] = &[
    "depends on",
    "select",
    "imply",
    "default",
    "def_bool",
    "def_tristate",
    "visible if",
    "range",
    "if",
];

/// A line where symbols only appear as operands, never as a declaration
fn is_reference_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    REFERENCE_KEYWORDS.iter().any(|keyword| {
        trimmed
            .strip_prefix(*keyword)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

/// Underscore-delimited parts longer than one character
pub fn word_parts(name: &str) -> Vec<&str> {
    name.split('_').filter(|part| part.len() > 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(p: &str) -> PathBuf {
        PathBuf::from(p)
    }

    #[test]
    fn strategies_short_circuit_in_weight_order() {
        let set = StrategySet::new("BT_SCAN");
        let text = "config BT_SCAN_FILTER\n\tbool\n# BT_SCAN\nconfig BT_SCAN\n";
        let hit = set.first_match(&path("Kconfig"), text).unwrap();
        assert_eq!(hit.strategy, MatchStrategy::ExactDeclaration);
        assert_eq!(hit.weight, 100);

        let hit = set
            .first_match(&path("Kconfig"), "config BT_SCAN_FILTER\n")
            .unwrap();
        assert_eq!(hit.strategy, MatchStrategy::PrefixDeclaration);

        let hit = set
            .first_match(&path("Kconfig"), "config NRF_BT_SCAN\n")
            .unwrap();
        assert_eq!(hit.strategy, MatchStrategy::SuffixDeclaration);

        let hit = set
            .first_match(&path("Kconfig"), "config MY_BT_SCAN_X\n")
            .unwrap();
        assert_eq!(hit.strategy, MatchStrategy::InfixDeclaration);

        let hit = set
            .first_match(&path("Kconfig"), "\tdepends on bt_scan\n")
            .unwrap();
        assert_eq!(hit.strategy, MatchStrategy::Substring);
        assert_eq!(hit.weight, 10);
        assert_eq!(hit.line, "depends on bt_scan");

        let hit = set
            .first_match(&path("Kconfig"), "config BT_SCAN # renamed in 2.6\n")
            .unwrap();
        assert_eq!(hit.strategy, MatchStrategy::ExactDeclaration);

        assert!(set.first_match(&path("Kconfig"), "config GPIO\n").is_none());
    }

    #[test]
    fn best_match_breaks_ties_by_path() {
        let mk = |p: &str, strategy: MatchStrategy| SymbolMatch {
            path: path(p),
            strategy,
            pattern: String::new(),
            line: String::new(),
            byte_offset: 0,
            weight: strategy.weight(),
        };
        let candidates = vec![
            mk("z/Kconfig", MatchStrategy::PrefixDeclaration),
            mk("b/Kconfig", MatchStrategy::Substring),
            mk("a/Kconfig", MatchStrategy::PrefixDeclaration),
        ];
        assert_eq!(best_match(&candidates).unwrap().path, path("a/Kconfig"));

        let mut reversed = candidates.clone();
        reversed.reverse();
        assert_eq!(best_match(&reversed).unwrap().path, path("a/Kconfig"));
    }

    #[test]
    fn broad_matcher_prefers_whole_word() {
        let matcher = BroadLineMatcher::new("BT_HRS");
        let text = "# see bt_hrs_ext\nchoice BT_HRS\n";
        assert_eq!(matcher.first_line(text), Some("choice BT_HRS"));

        let stems_only = "# heart rate (HRS) over BT\n";
        assert_eq!(
            matcher.first_line(stems_only),
            Some("# heart rate (HRS) over BT")
        );
        assert_eq!(matcher.first_line("config GPIO\n"), None);
    }

    #[test]
    fn broad_matcher_skips_reference_lines() {
        let matcher = BroadLineMatcher::new("BT_CLASSIC_X");
        let text = "\
config BT_BREDR
\tselect BT_CLASSIC_X
\tdepends on !BT_CLASSIC_X
\timply BT_CLASSIC_X
\tdefault y if BT_CLASSIC_X
if BT_CLASSIC_X
endif
";
        assert_eq!(matcher.first_line(text), None);
        assert_eq!(
            matcher.first_line("comment \"BT_CLASSIC_X options\"\n"),
            Some("comment \"BT_CLASSIC_X options\"")
        );
        assert!(!is_reference_line("selection_BT_CLASSIC_X"));
    }

    #[test]
    fn word_parts_skip_single_letters() {
        assert_eq!(word_parts("BT_L2CAP_X_TX"), vec!["BT", "L2CAP", "TX"]);
    }
}
