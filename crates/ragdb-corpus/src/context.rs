use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use ragdb_core::config::CorpusSettings;
use ragdb_core::types::ScoredEntry;

/// Knowledge domain served from a per-domain corpus directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Legal,
    Finance,
}

impl Domain {
    pub fn corpus_dir(self, settings: &CorpusSettings) -> &Path {
        match self {
            Self::Legal => &settings.legal_dir,
            Self::Finance => &settings.finance_dir,
        }
    }

    fn preamble(self) -> &'static str {
        match self {
            Self::Legal => concat!(
                "You are a highly skilled AI Legal Assistant trained in Indian and International law.\n",
                "You specialize in analyzing legal documents, summarizing judgments, explaining acts, ",
                "and offering compliance or drafting guidance.\n\n",
                "You have access to the following legal knowledge sources:\n\n",
            ),
            Self::Finance => concat!(
                "<agent>\n",
                "  <about>\n",
                "  You are a highly skilled AI Finance Assistant, acting as a personal CFO and financial coach.\n",
                "  </about>\n\n",
                "  <expertise>\n",
                "    General Expertise includes:\n",
                "    1. Personal finance management (expenses, budgets, savings) (add-expense & analyse-expense)\n",
                "    2. Small business finance (revenue, expenses, cash flow, profit/loss)\n",
                "    3. Investments (stocks, mutual funds, crypto)\n",
                "    4. Tax planning and optimization\n",
                "    5. Financial education and interactive guidance (general - Case-1)\n",
                "  </expertise>\n",
                "</agent>\n\n",
                "You have access to the following finance knowledge sources:\n\n",
            ),
        }
    }

    fn guidelines(self) -> &'static str {
        match self {
            Self::Legal => include_str!("prompts/legal_guidelines.md"),
            Self::Finance => include_str!("prompts/finance_guidelines.md"),
        }
    }

    fn closing(self) -> &'static str {
        match self {
            Self::Legal => include_str!("prompts/legal_closing.md"),
            Self::Finance => include_str!("prompts/finance_closing.md"),
        }
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legal" => Ok(Self::Legal),
            "finance" => Ok(Self::Finance),
            other => Err(format!("unknown domain '{other}' (expected legal or finance)")),
        }
    }
}

/// Knowledge-source block handed to the prompt builder: one `- name: content`
/// line per ranked entry, in rank order.
pub fn render_context(domain: Domain, entries: &[ScoredEntry]) -> String {
    let mut out = String::from(domain.preamble());
    for e in entries {
        let _ = writeln!(out, "- {}: {}", e.entry.name, e.entry.content);
    }
    out
}

/// Full generation prompt for a domain question: knowledge sources, role
/// guidelines with the JSON output contract, then the user's query.
///
/// Legal answers are `{response, suggestions}`. Finance answers are either
/// `{response, suggestions}` or `{task}` for the specialised expense tools.
pub fn build_domain_prompt(domain: Domain, query: &str, entries: &[ScoredEntry]) -> String {
    let context = render_context(domain, entries);
    let query = query.trim();
    let user_query = match domain {
        Domain::Legal => format!("User's query:\n\"{query}\""),
        Domain::Finance => format!("<user-query>\n  User's query: {query}\n</user-query>"),
    };
    format!(
        "{context}\n{}\n{user_query}\n\n{}",
        domain.guidelines(),
        domain.closing()
    )
}
