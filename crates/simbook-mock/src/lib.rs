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

//! A scripted interpreter for exercising the execution engine without a real
//! embedded runtime.
//!
//! Snippets map to action lists; everything else behaves like a bare name
//! lookup against the namespace. The type is serde-constructible so a config
//! file can describe a whole mock runtime.

mod mock_interpreter;

pub use mock_interpreter::{MockAction, MockInterpreter};
