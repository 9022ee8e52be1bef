//! Knowledge base module for foutbot
//! Typed tables loaded from the Excel workbook, plus error-code resolution

pub mod search;
pub mod xlsx;

use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Reserved sheet holding the general Q&A rows used for keyword fallback.
pub const GENERAL_SHEET: &str = "ALGEMEEN";

/// Reserved sheet holding the authorized usernames.
pub const USERS_SHEET: &str = "gebruikers";

/// A code row carries at most this many ordered remedies.
pub const MAX_REMEDIES: usize = 5;

/// Lookup failures, displayed verbatim in user replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Ongeldige module.")]
    UnknownModule,
    #[error("Module bevat geen foutcodes.")]
    NoCodeColumn,
    #[error("Ongeldige foutcode.")]
    UnknownCode,
}

/// One error-code row: the code, its description, and up to five ordered
/// remedies. Remedy slots left blank in the workbook stay `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRow {
    pub code: String,
    pub description: String,
    pub remedies: [Option<String>; MAX_REMEDIES],
}

impl CodeRow {
    /// Remedies that are actually filled in, original order preserved.
    pub fn filled_remedies(&self) -> impl Iterator<Item = &str> {
        self.remedies.iter().filter_map(|r| r.as_deref())
    }
}

/// One module sheet. `codes` is `None` when the sheet has no `Foutcode`
/// column; lookups against such a table fail with [`LookupError::NoCodeColumn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTable {
    /// Sheet tab name with its original casing, used in replies.
    pub name: String,
    pub codes: Option<Vec<CodeRow>>,
}

/// One row of the general Q&A sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaRow {
    pub question: String,
    pub answer: String,
}

/// In-memory knowledge base. Loaded once at startup and read-only afterwards,
/// so handlers can share it without coordination.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    /// Module tables keyed by lowercased sheet name.
    modules: HashMap<String, ModuleTable>,
    general: Vec<QaRow>,
    /// Lowercased usernames from the `gebruikers` sheet.
    authorized_users: HashSet<String>,
}

impl KnowledgeBase {
    pub fn new(
        modules: Vec<ModuleTable>,
        general: Vec<QaRow>,
        authorized_users: HashSet<String>,
    ) -> Self {
        let modules = modules
            .into_iter()
            .map(|table| (table.name.to_lowercase(), table))
            .collect();
        Self {
            modules,
            general,
            authorized_users,
        }
    }

    /// Look up a module table by name, case-insensitively.
    pub fn module(&self, name: &str) -> Option<&ModuleTable> {
        self.modules.get(&name.to_lowercase())
    }

    pub fn general(&self) -> &[QaRow] {
        &self.general
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Total number of code rows across all module tables.
    pub fn code_count(&self) -> usize {
        self.modules
            .values()
            .filter_map(|table| table.codes.as_ref())
            .map(Vec::len)
            .sum()
    }

    pub fn authorized_user_count(&self) -> usize {
        self.authorized_users.len()
    }

    /// Whether `username` appears on the allow-list (case-insensitive).
    pub fn is_authorized(&self, username: &str) -> bool {
        self.authorized_users.contains(&username.to_lowercase())
    }

    /// Resolve one error code within a module.
    ///
    /// Codes are compared as lowercased strings against the stored code's
    /// string form; the first matching row wins. Tables are small enough that
    /// a linear scan is fine.
    pub fn resolve(&self, module: &str, code: &str) -> Result<&CodeRow, LookupError> {
        let table = self.module(module).ok_or(LookupError::UnknownModule)?;
        let rows = table.codes.as_ref().ok_or(LookupError::NoCodeColumn)?;

        let wanted = code.to_lowercase();
        rows.iter()
            .find(|row| row.code.to_lowercase() == wanted)
            .ok_or(LookupError::UnknownCode)
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;

    pub fn code_row(code: &str, description: &str, remedies: &[&str]) -> CodeRow {
        let mut slots: [Option<String>; MAX_REMEDIES] = Default::default();
        for (slot, remedy) in slots.iter_mut().zip(remedies) {
            *slot = Some((*remedy).to_string());
        }
        CodeRow {
            code: code.to_string(),
            description: description.to_string(),
            remedies: slots,
        }
    }

    /// Small knowledge base used across the unit tests: one module with two
    /// codes, one code-less module, and a couple of general Q&A rows.
    pub fn sample_kb() -> KnowledgeBase {
        let motor = ModuleTable {
            name: "MotorA".to_string(),
            codes: Some(vec![
                code_row("12", "Oververhitting", &["Laat de motor afkoelen", "Controleer de ventilator"]),
                code_row("34", "Sensorstoring", &["Vervang de sensor"]),
                code_row("E5", "Voedingsfout", &[]),
            ]),
        };
        let display = ModuleTable {
            name: "Display".to_string(),
            codes: None,
        };
        let general = vec![
            QaRow {
                question: "Hoe reset ik de machine".to_string(),
                answer: "Houd de resetknop vijf seconden ingedrukt.".to_string(),
            },
            QaRow {
                question: "Waar vind ik de handleiding".to_string(),
                answer: "De handleiding staat op het intranet.".to_string(),
            },
        ];
        let users = ["jdevries", "mjanssen"]
            .iter()
            .map(|u| u.to_string())
            .collect();
        KnowledgeBase::new(vec![motor, display], general, users)
    }
}

#[cfg(test)]
mod tests {
    use super::test_fixtures::sample_kb;
    use super::*;

    #[test]
    fn test_module_lookup_is_case_insensitive() {
        let kb = sample_kb();
        assert_eq!(kb.module("motora").map(|t| t.name.as_str()), Some("MotorA"));
        assert_eq!(kb.module("MOTORA").map(|t| t.name.as_str()), Some("MotorA"));
        assert!(kb.module("pomp").is_none());
    }

    #[test]
    fn test_resolve_ignores_query_casing() {
        let kb = sample_kb();
        let lower = kb.resolve("motora", "e5").unwrap();
        let upper = kb.resolve("MotorA", "E5").unwrap();
        assert_eq!(lower.description, "Voedingsfout");
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_resolve_unknown_module() {
        let kb = sample_kb();
        assert_eq!(kb.resolve("pomp", "12"), Err(LookupError::UnknownModule));
    }

    #[test]
    fn test_resolve_codeless_module() {
        let kb = sample_kb();
        assert_eq!(kb.resolve("display", "12"), Err(LookupError::NoCodeColumn));
    }

    #[test]
    fn test_resolve_unknown_code_is_never_another_kind() {
        let kb = sample_kb();
        for missing in ["99", "0", "motor"] {
            assert_eq!(kb.resolve("MotorA", missing), Err(LookupError::UnknownCode));
        }
    }

    #[test]
    fn test_filled_remedies_skips_blanks() {
        let kb = sample_kb();
        let row = kb.resolve("MotorA", "12").unwrap();
        let remedies: Vec<&str> = row.filled_remedies().collect();
        assert_eq!(remedies, vec!["Laat de motor afkoelen", "Controleer de ventilator"]);

        let bare = kb.resolve("MotorA", "E5").unwrap();
        assert_eq!(bare.filled_remedies().count(), 0);
    }

    #[test]
    fn test_is_authorized_lowercases() {
        let kb = sample_kb();
        assert!(kb.is_authorized("JDeVries"));
        assert!(!kb.is_authorized("Onbekend"));
    }

    #[test]
    fn test_counts() {
        let kb = sample_kb();
        assert_eq!(kb.module_count(), 2);
        assert_eq!(kb.code_count(), 3);
        assert_eq!(kb.authorized_user_count(), 2);
    }
}
