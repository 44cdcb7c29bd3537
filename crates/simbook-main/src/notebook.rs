// Copyright 2025 DataStax Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{MainError, Result};

/// A notebook file: executable cells with declared prerequisites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub cells: Vec<NotebookCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookCell {
    pub id: String,
    pub code: String,
    /// Ids of cells that must run (successfully) first.
    #[serde(default)]
    pub requires: Vec<String>,
}

impl Notebook {
    /// Reject duplicate cell ids and prerequisites pointing nowhere.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for cell in &self.cells {
            if !seen.insert(cell.id.as_str()) {
                return Err(
                    MainError::InvalidNotebook(format!("duplicate cell id '{}'", cell.id)).into(),
                );
            }
        }
        for cell in &self.cells {
            for requirement in &cell.requires {
                if !seen.contains(requirement.as_str()) {
                    return Err(MainError::InvalidNotebook(format!(
                        "cell '{}' requires unknown cell '{requirement}'",
                        cell.id
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}
