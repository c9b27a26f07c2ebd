use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::scene::model::PropDef;
use std::collections::BTreeMap;

/// Named property bundle, e.g. a heading or a request chip.
pub type StyleDef = BTreeMap<String, PropDef>;

/// Style lookup layered over project-wide and scene-local styles.
///
/// A scene style shadows a project style of the same name.
#[derive(Debug, Clone, Copy)]
pub struct StyleSheet<'a> {
    project: &'a BTreeMap<String, StyleDef>,
    scene: &'a BTreeMap<String, StyleDef>,
}

impl<'a> StyleSheet<'a> {
    pub fn new(
        project: &'a BTreeMap<String, StyleDef>,
        scene: &'a BTreeMap<String, StyleDef>,
    ) -> Self {
        Self { project, scene }
    }

    pub fn get(&self, name: &str) -> ChoreoResult<&'a StyleDef> {
        self.scene
            .get(name)
            .or_else(|| self.project.get(name))
            .ok_or_else(|| ChoreoError::construction(format!("unknown style '{name}'")))
    }

    /// Merge styles left to right; later styles override earlier keys.
    pub fn merged(&self, names: &[String]) -> ChoreoResult<StyleDef> {
        let mut out = StyleDef::new();
        for name in names {
            for (k, v) in self.get(name)? {
                out.insert(k.clone(), v.clone());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/style.rs"]
mod tests;
