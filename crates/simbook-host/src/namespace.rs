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

use indexmap::IndexSet;

/// The persistent variable bindings shared across sequential executions in
/// one session.
///
/// Standard bindings (package aliases installed at init) survive a reset;
/// user bindings do not. Nothing but an explicit reset ever replaces the
/// namespace.
#[derive(Debug, Default)]
pub struct Namespace {
    bindings: indexmap::IndexMap<String, serde_json::Value>,
    standard: IndexSet<String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a user-defined name.
    pub fn bind(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Bind a name that survives resets (e.g. a package alias).
    pub fn bind_standard(&mut self, name: impl Into<String>, value: serde_json::Value) {
        let name = name.into();
        self.standard.insert(name.clone());
        self.bindings.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn is_standard(&self, name: &str) -> bool {
        self.standard.contains(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drop every user binding, keeping the standard set.
    pub fn reset(&mut self) {
        let standard = &self.standard;
        self.bindings.retain(|name, _| standard.contains(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reset_preserves_standard_bindings() {
        let mut namespace = Namespace::new();
        namespace.bind_standard("np", json!("<module 'numpy'>"));
        namespace.bind_standard("plt", json!("<module 'matplotlib.pyplot'>"));
        namespace.bind("x", json!(42));
        namespace.bind("result", json!([1, 2, 3]));
        assert_eq!(namespace.len(), 4);

        namespace.reset();

        assert!(namespace.contains("np"));
        assert!(namespace.contains("plt"));
        assert!(!namespace.contains("x"));
        assert!(!namespace.contains("result"));
        assert_eq!(namespace.len(), 2);
    }

    #[test]
    fn test_user_binding_shadows_and_reset_restores_nothing() {
        let mut namespace = Namespace::new();
        namespace.bind_standard("np", json!("<module 'numpy'>"));
        // A user re-binding of a standard name stays standard.
        namespace.bind("np", json!("shadowed"));

        namespace.reset();
        assert_eq!(namespace.get("np"), Some(&json!("shadowed")));
        assert!(namespace.is_standard("np"));
    }

    #[test]
    fn test_empty_namespace() {
        let mut namespace = Namespace::new();
        assert!(namespace.is_empty());
        namespace.reset();
        assert!(namespace.is_empty());
    }
}
