use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::scene::build::{BuildEnv, Scene, build};
use crate::scene::model::{ProjectDef, SceneDef};
use crate::scene::variables::Variables;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Project boundary object: shared variables and styles plus the scene registry.
///
/// Scenes are independent; each build owns its own graph and nothing is shared between them at
/// runtime.
#[derive(Debug, Clone)]
pub struct Project {
    def: ProjectDef,
}

impl Project {
    /// Parse a project from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ChoreoResult<Self> {
        let def: ProjectDef = serde_json::from_reader(r)
            .map_err(|e| ChoreoError::serde(format!("parse project JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse a project from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ChoreoResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ChoreoError::validation(format!("open project JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_def(def: ProjectDef) -> ChoreoResult<Self> {
        let project = Self { def };
        project.validate()?;
        Ok(project)
    }

    fn validate(&self) -> ChoreoResult<()> {
        Fps::new(self.def.fps.num, self.def.fps.den)?;
        if self.def.canvas.width == 0 || self.def.canvas.height == 0 {
            return Err(ChoreoError::validation("canvas width/height must be non-zero"));
        }
        for name in &self.def.active {
            if !self.def.scenes.contains_key(name) {
                return Err(ChoreoError::validation(format!(
                    "active scene '{name}' is not defined"
                )));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn canvas(&self) -> Canvas {
        self.def.canvas
    }

    pub fn fps(&self) -> Fps {
        self.def.fps
    }

    pub fn variables(&self) -> &Variables {
        &self.def.variables
    }

    pub fn def(&self) -> &ProjectDef {
        &self.def
    }

    /// Every scene name, in name order.
    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.def.scenes.keys().map(String::as_str)
    }

    /// Scenes to render, in order. An empty `active` list selects every scene.
    pub fn active_scenes(&self) -> Vec<&str> {
        if self.def.active.is_empty() {
            self.scene_names().collect()
        } else {
            self.def.active.iter().map(String::as_str).collect()
        }
    }

    pub fn scene_def(&self, name: &str) -> ChoreoResult<&SceneDef> {
        self.def
            .scenes
            .get(name)
            .ok_or_else(|| ChoreoError::validation(format!("unknown scene '{name}'")))
    }

    pub fn env(&self) -> BuildEnv<'_> {
        BuildEnv::new(&self.def.variables)
            .with_styles(&self.def.styles)
            .with_canvas(self.def.canvas)
            .with_fps(self.def.fps)
    }

    /// Build one scene against this project's variables, styles, canvas and fps.
    pub fn build_scene(&self, name: &str) -> ChoreoResult<Scene> {
        build(name, self.scene_def(name)?, &self.env())
    }
}

#[cfg(test)]
#[path = "../tests/unit/project.rs"]
mod tests;
