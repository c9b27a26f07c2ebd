use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::style::color::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project variable value. Colors are carried as strings and parsed where a color is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarDef {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl VarDef {
    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Read-only table of project variables shared by every scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, VarDef>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: VarDef) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&VarDef> {
        self.values.get(name)
    }

    /// Lookup with a fallback for scenes rendered outside their project.
    pub fn get_or(&self, name: &str, default: VarDef) -> VarDef {
        self.values.get(name).cloned().unwrap_or(default)
    }

    /// Numeric lookup with default; a present non-numeric variable is a construction error.
    pub fn number_or(&self, name: &str, default: f64) -> ChoreoResult<f64> {
        match self.values.get(name) {
            None => Ok(default),
            Some(VarDef::Number(n)) => Ok(*n),
            Some(other) => Err(ChoreoError::construction(format!(
                "variable '{name}' is not a number: {other:?}"
            ))),
        }
    }

    /// Color lookup with default; the variable must hold a parseable color string.
    pub fn color_or(&self, name: &str, default: Color) -> ChoreoResult<Color> {
        match self.values.get(name) {
            None => Ok(default),
            Some(VarDef::Text(s)) => Color::parse(s).map_err(|e| {
                ChoreoError::construction(format!("variable '{name}' is not a color: {e}"))
            }),
            Some(other) => Err(ChoreoError::construction(format!(
                "variable '{name}' is not a color: {other:?}"
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VarDef)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, VarDef)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, VarDef)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
