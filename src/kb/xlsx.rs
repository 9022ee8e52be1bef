//! Workbook loading for the knowledge base (XLSX or XLS)
//!
//! One sheet per module, plus the reserved `ALGEMEEN` (general Q&A) and
//! `gebruikers` (allow-list) sheets. Headers are resolved up front so that a
//! malformed sheet fails the load instead of failing per lookup.

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use super::{CodeRow, KnowledgeBase, ModuleTable, QaRow, GENERAL_SHEET, MAX_REMEDIES, USERS_SHEET};

/// Required columns on a module sheet.
const CODE_COLUMN: &str = "Foutcode";
const DESCRIPTION_COLUMN: &str = "Foutcodebeschrijving";
const REMEDY_COLUMN_PREFIX: &str = "Oplossing";

/// Columns on the reserved sheets.
const QUESTION_COLUMN: &str = "Vraag";
const ANSWER_COLUMN: &str = "Antwoord";
const USERNAME_COLUMN: &str = "gebruikersnaam";

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Excel parse error: {0}")]
    Parse(String),
    #[error("Calamine error: {0}")]
    Calamine(#[from] calamine::Error),
}

/// Load the full knowledge base from a workbook.
pub fn load(path: &Path) -> Result<KnowledgeBase, WorkbookError> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut modules = Vec::new();
    let mut general = Vec::new();
    let mut authorized_users = HashSet::new();

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| WorkbookError::Parse(format!("sheet '{}': {}", sheet_name, e)))?;

        match sheet_name.as_str() {
            GENERAL_SHEET => general = parse_general(&range),
            USERS_SHEET => authorized_users = parse_users(&range),
            _ => modules.push(parse_module(&sheet_name, &range)?),
        }
    }

    Ok(KnowledgeBase::new(modules, general, authorized_users))
}

/// Load the knowledge base, degrading to an empty one if the workbook cannot
/// be read. The bot keeps running either way; the failure is for the operator.
pub fn load_or_empty(path: &Path) -> KnowledgeBase {
    match load(path) {
        Ok(kb) => kb,
        Err(e) => {
            tracing::error!("failed to load workbook {}: {}", path.display(), e);
            KnowledgeBase::default()
        }
    }
}

/// Find a column by header name in the first row. Header cells are trimmed.
fn column_index(range: &Range<Data>, name: &str) -> Option<usize> {
    let headers = range.rows().next()?;
    headers
        .iter()
        .position(|cell| cell_to_string(cell).trim() == name)
}

fn parse_module(sheet_name: &str, range: &Range<Data>) -> Result<ModuleTable, WorkbookError> {
    let Some(code_idx) = column_index(range, CODE_COLUMN) else {
        // No error-code column at all: the sheet stays lookupable as a module
        // but every code lookup fails with a typed error.
        return Ok(ModuleTable {
            name: sheet_name.to_string(),
            codes: None,
        });
    };

    let description_idx = column_index(range, DESCRIPTION_COLUMN).ok_or_else(|| {
        WorkbookError::Parse(format!(
            "sheet '{}' has a '{}' column but no '{}' column",
            sheet_name, CODE_COLUMN, DESCRIPTION_COLUMN
        ))
    })?;

    let remedy_indices: Vec<Option<usize>> = (1..=MAX_REMEDIES)
        .map(|i| column_index(range, &format!("{} {}", REMEDY_COLUMN_PREFIX, i)))
        .collect();

    let mut rows = Vec::new();
    for row in range.rows().skip(1) {
        let code = cell_to_string(row.get(code_idx).unwrap_or(&Data::Empty));
        if code.is_empty() {
            continue;
        }

        let description = cell_to_string(row.get(description_idx).unwrap_or(&Data::Empty));

        let mut remedies: [Option<String>; MAX_REMEDIES] = Default::default();
        for (slot, idx) in remedies.iter_mut().zip(&remedy_indices) {
            let value = idx
                .and_then(|i| row.get(i))
                .map(cell_to_string)
                .unwrap_or_default();
            if !value.is_empty() {
                *slot = Some(value);
            }
        }

        rows.push(CodeRow {
            code,
            description,
            remedies,
        });
    }

    Ok(ModuleTable {
        name: sheet_name.to_string(),
        codes: Some(rows),
    })
}

/// Parse the general Q&A sheet. A sheet without the expected columns yields
/// an empty table, which disables the keyword fallback.
fn parse_general(range: &Range<Data>) -> Vec<QaRow> {
    let (Some(question_idx), Some(answer_idx)) = (
        column_index(range, QUESTION_COLUMN),
        column_index(range, ANSWER_COLUMN),
    ) else {
        return Vec::new();
    };

    range
        .rows()
        .skip(1)
        .filter_map(|row| {
            let question = cell_to_string(row.get(question_idx).unwrap_or(&Data::Empty));
            if question.is_empty() {
                return None;
            }
            let answer = cell_to_string(row.get(answer_idx).unwrap_or(&Data::Empty));
            Some(QaRow { question, answer })
        })
        .collect()
}

/// Parse the allow-list sheet. Absent columns yield an empty set.
fn parse_users(range: &Range<Data>) -> HashSet<String> {
    let Some(username_idx) = column_index(range, USERNAME_COLUMN) else {
        return HashSet::new();
    };

    range
        .rows()
        .skip(1)
        .filter_map(|row| {
            let name = cell_to_string(row.get(username_idx).unwrap_or(&Data::Empty));
            if name.is_empty() {
                None
            } else {
                Some(name.to_lowercase())
            }
        })
        .collect()
}

/// Render a cell the way users type codes: integral floats lose their
/// fractional zero, so a `12.0` cell matches the query `12`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => {
            if *b {
                "TRUE".to_string()
            } else {
                "FALSE".to_string()
            }
        }
        Data::Error(e) => format!("#ERROR: {:?}", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
