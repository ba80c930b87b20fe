//! Test case records and the JSON case-file loader.
//!
//! A case file is a JSON array of objects. Keys the harness does not know
//! about are ignored; known keys with the wrong type abort the load.

use crate::domain::CaseCheckError;
use serde::Deserialize;
use serde_json::Number;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub numeric_input: Option<Vec<Number>>,
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub in_stdout: Option<Vec<String>>,
    #[serde(default)]
    pub close_values: Option<Vec<serde_json::Number>>,
}

impl TestCase {
    /// Bytes written to the child's standard input.
    pub fn stdin_bytes(&self) -> Vec<u8> {
        if let Some(input) = &self.input {
            return input.as_bytes().to_vec();
        }

        match &self.numeric_input {
            Some(values) => values
                .iter()
                .map(Number::to_string)
                .collect::<Vec<_>>()
                .join("\n")
                .into_bytes(),
            None => Vec::new(),
        }
    }

    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", index, name),
            None => index.to_string(),
        }
    }

    fn validate(&self, index: usize) -> Result<(), CaseLoadError> {
        if self.input.is_some() && self.numeric_input.is_some() {
            return Err(CaseLoadError::ConflictingInput { index });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaseLoadError {
    #[error("failed to read case file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse case file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("case {index} declares both 'input' and 'numeric_input'")]
    ConflictingInput { index: usize },
}

impl From<CaseLoadError> for CaseCheckError {
    fn from(error: CaseLoadError) -> Self {
        let message = error.to_string();
        match error {
            CaseLoadError::Read { .. } => CaseCheckError::io_system("IO.CASE_FILE", message),
            CaseLoadError::Parse { .. } | CaseLoadError::ConflictingInput { .. } => {
                CaseCheckError::input_validation("INPUT.CASE_SPEC", message)
            }
        }
    }
}

pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<TestCase>, CaseLoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| CaseLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cases_from(&content, path)
}

pub fn parse_cases(json: &str) -> Result<Vec<TestCase>, CaseLoadError> {
    parse_cases_from(json, Path::new("<inline-cases>"))
}

fn parse_cases_from(json: &str, path: &Path) -> Result<Vec<TestCase>, CaseLoadError> {
    let cases: Vec<TestCase> =
        serde_json::from_str(json).map_err(|source| CaseLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    for (index, case) in cases.iter().enumerate() {
        case.validate(index)?;
    }
    Ok(cases)
}
