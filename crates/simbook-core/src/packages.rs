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

use serde::{Deserialize, Serialize};

/// A runtime package installed at init time.
///
/// Required packages are fatal to initialization when they fail to install;
/// optional packages are logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    /// Distribution name passed to the installer.
    pub name: String,
    /// Alias bound into the namespace after import (e.g. `np`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_as: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl PackageSpec {
    pub fn required(name: impl Into<String>) -> Self {
        PackageSpec {
            name: name.into(),
            import_as: None,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        PackageSpec {
            name: name.into(),
            import_as: None,
            required: false,
        }
    }

    pub fn import_as(mut self, alias: impl Into<String>) -> Self {
        self.import_as = Some(alias.into());
        self
    }

    /// The name this package is bound under in the namespace.
    pub fn binding_name(&self) -> &str {
        self.import_as.as_deref().unwrap_or(&self.name)
    }
}

/// The package set for the simulation documentation deployment.
pub fn default_manifest() -> Vec<PackageSpec> {
    vec![
        PackageSpec::required("numpy").import_as("np"),
        PackageSpec::required("matplotlib.pyplot").import_as("plt"),
        PackageSpec::required("pathsim"),
        PackageSpec::optional("scipy"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_name_prefers_alias() {
        let numpy = PackageSpec::required("numpy").import_as("np");
        assert_eq!(numpy.binding_name(), "np");

        let pathsim = PackageSpec::required("pathsim");
        assert_eq!(pathsim.binding_name(), "pathsim");
    }

    #[test]
    fn test_required_defaults_on_deserialize() {
        let spec: PackageSpec = serde_json::from_str(r#"{"name": "numpy"}"#).unwrap();
        assert!(spec.required);
        assert!(spec.import_as.is_none());
    }

    #[test]
    fn test_default_manifest_required_first() {
        let manifest = default_manifest();
        assert!(manifest.iter().any(|p| p.binding_name() == "np"));
        assert!(manifest.iter().any(|p| p.binding_name() == "plt"));
        assert!(manifest
            .iter()
            .any(|p| p.name == "scipy" && !p.required));
    }
}
