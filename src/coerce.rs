// Copyright 2025 Chisomo Makombo Sakala
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use serde::Serialize;
use std::fmt;

/// A raw text cell coerced to the most specific of integer, float, or text.
///
/// Serializes untagged, so a JSON dump shows plain numbers and strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
  Int(i64),
  Float(f64),
  Text(String),
}

impl Value {
  /// Numeric view of the cell. Text has none.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(int) => Some(*int as f64),
      Value::Float(float) => Some(*float),
      Value::Text(_) => None,
    }
  }

  pub fn is_numeric(&self) -> bool {
    !matches!(self, Value::Text(_))
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Int(int) => write!(f, "{int}"),
      Value::Float(float) => write!(f, "{float}"),
      Value::Text(text) => f.write_str(text),
    }
  }
}

/// Converts a trimmed text cell to the most specific representation.
///
/// Integers are tried strictly before floats: "5.0" stays a float and
/// "42" stays an integer. Anything else, including the empty string, is
/// returned as text. Never fails.
pub fn coerce(text: &str) -> Value {
  if let Ok(int) = text.parse::<i64>() {
    return Value::Int(int);
  }
  if let Ok(float) = text.parse::<f64>() {
    return Value::Float(float);
  }
  Value::Text(text.to_string())
}
