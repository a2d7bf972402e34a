//! Symbol Locator: finds a symbol's declaration in one file and extracts its metadata.
//!
//! Extraction is scoped to the *definition section*, the text from the declaration line to
//! the next column-0 `config`/`menuconfig`/`choice`/`endchoice`/`menu`/`endmenu` line, so
//! that help text and attributes of a sibling declaration are never attributed to this one.

use kconfig_protocol::{dedup_preserving_order, Confidence, DeclarationKind};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Number of section lines kept as context
const CONTEXT_LINES: usize = 12;
const TAB_WIDTH: usize = 8;

/// End of a declaration line: optional trailing comment, then end of line
pub(crate) const DECLARATION_TAIL: &str = r"[ \t]*(?:#[^\r\n]*)?\r?$";

static SECTION_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:menuconfig|config|endchoice|choice|endmenu|menu)\b")
        .expect("section boundary regex")
});

static TYPE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(def_bool|def_tristate|bool|tristate|int|hex|string)\b(?:\s+"((?:[^"\\]|\\.)*)")?"#)
        .expect("type line regex")
});

static PROMPT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^prompt\s+"((?:[^"\\]|\\.)*)""#).expect("prompt line regex")
});

static LEADING_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("identifier regex"));

/// Which declaration pattern matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPrecision {
    /// `config NAME` anchored, case-sensitive
    Exact,
    /// Same declaration with different letter case
    CaseInsensitive,
    /// A declaration whose name merely contains NAME
    Loose,
}

impl MatchPrecision {
    /// Whether this is a proper declaration of the requested symbol
    pub fn is_confirmed(self) -> bool {
        !matches!(self, MatchPrecision::Loose)
    }

    pub fn confidence(self) -> Confidence {
        match self {
            MatchPrecision::Exact => Confidence::High,
            MatchPrecision::CaseInsensitive => Confidence::Medium,
            MatchPrecision::Loose => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSymbol {
    /// Name as written in the declaration
    pub declared_name: String,
    pub kind: DeclarationKind,
    pub precision: MatchPrecision,
    pub byte_offset: usize,
    pub description: Option<String>,
    pub prompt: Option<String>,
    pub symbol_type: Option<String>,
    pub dependencies: Vec<String>,
    pub context: String,
}

/// Compiled declaration patterns for one symbol name
pub struct DeclarationPatterns {
    exact: Regex,
    case_insensitive: Regex,
    loose: Regex,
}

impl DeclarationPatterns {
    pub fn new(name: &str) -> Self {
        let escaped = regex::escape(name);
        let anchored = format!(r"^[ \t]*(menuconfig|config)[ \t]+({escaped}){DECLARATION_TAIL}");
        let loose = format!(r"^[ \t]*(menuconfig|config)[ \t]+([A-Za-z0-9_]*{escaped}[A-Za-z0-9_]*)");
        Self {
            exact: build(&anchored, false),
            case_insensitive: build(&anchored, true),
            loose: build(&loose, true),
        }
    }

    /// Patterns in the order they are tried
    fn ordered(&self) -> [(&Regex, MatchPrecision); 3] {
        [
            (&self.exact, MatchPrecision::Exact),
            (&self.case_insensitive, MatchPrecision::CaseInsensitive),
            (&self.loose, MatchPrecision::Loose),
        ]
    }
}

fn build(pattern: &str, case_insensitive: bool) -> Regex {
    RegexBuilder::new(pattern)
        .multi_line(true)
        .case_insensitive(case_insensitive)
        .build()
        .expect("escaped symbol names always form a valid pattern")
}

/// Locate `name` in `text`. `None` when no declaration pattern matches.
pub fn locate(text: &str, name: &str) -> Option<LocatedSymbol> {
    locate_with(text, &DeclarationPatterns::new(name))
}

/// [`locate`] with patterns compiled once by the caller
pub fn locate_with(text: &str, patterns: &DeclarationPatterns) -> Option<LocatedSymbol> {
    let (captures, precision) = patterns
        .ordered()
        .into_iter()
        .find_map(|(regex, precision)| regex.captures(text).map(|c| (c, precision)))?;

    let whole = captures.get(0)?;
    let kind = DeclarationKind::from_keyword(captures.get(1)?.as_str());
    let declared_name = captures.get(2)?.as_str().to_string();
    let section = definition_section(text, whole.start());
    let parsed = parse_section(section);

    let description = parsed.help.clone().or_else(|| parsed.prompt.clone());
    Some(LocatedSymbol {
        declared_name,
        kind,
        precision,
        byte_offset: whole.start(),
        description,
        prompt: parsed.prompt,
        symbol_type: parsed.symbol_type,
        dependencies: dedup_preserving_order(parsed.dependencies),
        context: section
            .lines()
            .take(CONTEXT_LINES)
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

/// Text from the declaration at `start` up to the next column-0 declaration keyword
pub fn definition_section(text: &str, start: usize) -> &str {
    let body_start = text[start..]
        .find('\n')
        .map(|idx| start + idx + 1)
        .unwrap_or(text.len());
    let end = SECTION_BOUNDARY
        .find_at(text, body_start)
        .map(|m| m.start())
        .unwrap_or(text.len());
    &text[start..end]
}

#[derive(Default)]
struct ParsedSection {
    help: Option<String>,
    prompt: Option<String>,
    symbol_type: Option<String>,
    dependencies: Vec<String>,
}

#[derive(Clone, Copy)]
enum HelpState {
    Outside,
    /// Saw the marker at this indentation; waiting for the first text line
    Pending(usize),
    /// Inside help text indented at least this much
    Body(usize),
}

fn parse_section(section: &str) -> ParsedSection {
    let mut parsed = ParsedSection::default();
    let mut help_lines: Vec<&str> = Vec::new();
    let mut help_done = false;
    let mut state = HelpState::Outside;

    // First line is the declaration itself.
    for line in section.lines().skip(1) {
        let trimmed = line.trim();
        let indent = indent_width(line);

        match state {
            HelpState::Pending(marker_indent) => {
                if trimmed.is_empty() {
                    continue;
                }
                if indent > marker_indent {
                    state = HelpState::Body(indent);
                    if !help_done {
                        help_lines.push(trimmed);
                    }
                    continue;
                }
                help_done = true;
                state = HelpState::Outside;
            }
            HelpState::Body(body_indent) => {
                if trimmed.is_empty() {
                    help_done = help_done || !help_lines.is_empty();
                    continue;
                }
                if indent >= body_indent {
                    if !help_done {
                        help_lines.push(trimmed);
                    }
                    continue;
                }
                help_done = true;
                state = HelpState::Outside;
            }
            HelpState::Outside => {}
        }

        if trimmed == "help" || trimmed == "---help---" {
            state = HelpState::Pending(indent);
            continue;
        }
        parse_attribute(trimmed, &mut parsed);
    }

    if !help_lines.is_empty() {
        parsed.help = Some(help_lines.join(" "));
    }
    parsed
}

fn parse_attribute(line: &str, parsed: &mut ParsedSection) {
    if let Some(expr) = strip_keyword(line, "depends on") {
        parsed.dependencies.extend(expression_symbols(expr));
    } else if let Some(rest) = strip_keyword(line, "select") {
        if let Some(ident) = LEADING_IDENT.find(rest.trim_start()) {
            parsed.dependencies.push(ident.as_str().to_string());
        }
    } else if let Some(caps) = PROMPT_LINE.captures(line) {
        if parsed.prompt.is_none() {
            parsed.prompt = caps.get(1).map(|m| m.as_str().to_string());
        }
    } else if let Some(caps) = TYPE_LINE.captures(line) {
        if parsed.symbol_type.is_none() {
            let raw = &caps[1];
            let ty = raw.strip_prefix("def_").unwrap_or(raw);
            parsed.symbol_type = Some(ty.to_string());
        }
        if parsed.prompt.is_none() {
            parsed.prompt = caps.get(2).map(|m| m.as_str().to_string());
        }
    }
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}

/// Symbol names referenced by a dependency expression, in order of appearance
fn expression_symbols(expr: &str) -> Vec<String> {
    expr.split("&&")
        .flat_map(|part| part.split("||"))
        .filter_map(|operand| {
            let cleaned: String = operand
                .chars()
                .filter(|c| !matches!(c, '!' | '(' | ')'))
                .collect();
            let ident = LEADING_IDENT.find(cleaned.trim())?.as_str();
            (!matches!(ident, "y" | "n" | "m")).then(|| ident.to_string())
        })
        .collect()
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_help_and_dependencies() {
        let text = "config BT_SCAN\n\thelp\n\t  Enables scanning.\n\tdepends on BT";
        let found = locate(text, "BT_SCAN").expect("declared");
        assert_eq!(found.precision, MatchPrecision::Exact);
        assert_eq!(found.kind, DeclarationKind::Config);
        assert_eq!(found.description.as_deref(), Some("Enables scanning."));
        assert_eq!(found.dependencies, vec!["BT"]);
    }

    #[test]
    fn collapses_multi_line_help() {
        let text = "\
menuconfig BT_MESH
\tbool \"Bluetooth mesh support\"
\tdepends on BT_OBSERVER && BT_BROADCASTER
\thelp
\t  This option enables Bluetooth Mesh support.
\t  The mesh stack is experimental.

\t  Second paragraph is ignored.
";
        let found = locate(text, "BT_MESH").unwrap();
        assert_eq!(found.kind, DeclarationKind::Menuconfig);
        assert_eq!(found.symbol_type.as_deref(), Some("bool"));
        assert_eq!(found.prompt.as_deref(), Some("Bluetooth mesh support"));
        assert_eq!(
            found.description.as_deref(),
            Some("This option enables Bluetooth Mesh support. The mesh stack is experimental.")
        );
        assert_eq!(found.dependencies, vec!["BT_OBSERVER", "BT_BROADCASTER"]);
    }

    #[test]
    fn section_stops_at_next_declaration() {
        let text = "\
config BT_HCI
\tbool \"HCI\"
\tdepends on BT
config BT_CTLR
\tbool \"Controller\"
\tdepends on BT_LL_SW_SPLIT
\tselect ENTROPY_GENERATOR
\thelp
\t  Controller help.
";
        let start = text.find("config BT_HCI").unwrap();
        let section = definition_section(text, start);
        assert!(!section.contains("BT_CTLR"));
        assert!(!section.contains("Controller"));

        let found = locate(text, "BT_HCI").unwrap();
        assert_eq!(found.dependencies, vec!["BT"]);
        assert_eq!(found.description.as_deref(), Some("HCI"));
    }

    #[test]
    fn indented_keyword_in_help_is_not_a_boundary() {
        let text = "\
config FOO
\thelp
\t  Use together with
\t  config BAR for best results.
\tdepends on BAZ
";
        let found = locate(text, "FOO").unwrap();
        assert_eq!(
            found.description.as_deref(),
            Some("Use together with config BAR for best results.")
        );
        assert_eq!(found.dependencies, vec!["BAZ"]);
    }

    #[test]
    fn splits_expressions_and_strips_operators() {
        let text = "\
config NRF_CLOUD
\tdepends on (NET_SOCKETS || POSIX_API) && !NET_NATIVE && BT_MAX_CONN > 1
\tdepends on NET_SOCKETS
\tselect CJSON_LIB if NRF_CLOUD_FOTA
\tselect MQTT_LIB
";
        let found = locate(text, "NRF_CLOUD").unwrap();
        assert_eq!(
            found.dependencies,
            vec![
                "NET_SOCKETS",
                "POSIX_API",
                "NET_NATIVE",
                "BT_MAX_CONN",
                "CJSON_LIB",
                "MQTT_LIB"
            ]
        );
    }

    #[test]
    fn falls_back_to_case_insensitive_then_loose() {
        let text = "config Bt_Foo\n\tbool\nconfig BT_FOO_EXTRA\n\tbool\n";
        let found = locate(text, "BT_FOO").unwrap();
        assert_eq!(found.precision, MatchPrecision::CaseInsensitive);
        assert_eq!(found.declared_name, "Bt_Foo");

        let loose = locate("config BT_FOO_EXTRA\n\tbool\n", "BT_FOO").unwrap();
        assert_eq!(loose.precision, MatchPrecision::Loose);
        assert_eq!(loose.declared_name, "BT_FOO_EXTRA");
        assert!(!loose.precision.is_confirmed());
    }

    #[test]
    fn trailing_comment_keeps_declaration_exact() {
        let text = "config BT_SCAN # legacy name\n\tbool \"Scan\"\n";
        let found = locate(text, "BT_SCAN").unwrap();
        assert_eq!(found.precision, MatchPrecision::Exact);
        assert_eq!(found.declared_name, "BT_SCAN");
        assert_eq!(found.description.as_deref(), Some("Scan"));

        let crlf = locate("menuconfig bt_scan\t#old\r\n\tbool\r\n", "BT_SCAN").unwrap();
        assert_eq!(crlf.precision, MatchPrecision::CaseInsensitive);
    }

    #[test]
    fn prefix_of_longer_name_is_not_exact() {
        let text = "config BT_SCANNER\n\tbool\n";
        let found = locate(text, "BT_SCAN").unwrap();
        assert_eq!(found.precision, MatchPrecision::Loose);
    }

    #[test]
    fn returns_none_without_declaration() {
        assert!(locate("# BT_SCAN is mentioned only here\n", "BT_SCAN").is_none());
        assert!(locate("", "BT").is_none());
    }

    #[test]
    fn help_without_text_yields_prompt() {
        let text = "config GPIO\n\tbool \"GPIO drivers\"\n\thelp\n\tdepends on SOC\n";
        let found = locate(text, "GPIO").unwrap();
        assert_eq!(found.description.as_deref(), Some("GPIO drivers"));
        assert_eq!(found.dependencies, vec!["SOC"]);
    }
}
