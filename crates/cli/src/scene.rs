//! JSON scene and run-config files for the CLI.

use anyhow::{bail, Context, Result};
use edgecurve::host::MemoryMesh;
use edgecurve::prelude::*;
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SceneFile {
    pub meshes: Vec<MeshEntry>,
    /// Edges to generate polylines on, in order.
    #[serde(default)]
    pub edges: Vec<EdgeEntry>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MeshEntry {
    pub name: String,
    pub vertices: Vec<[f64; 3]>,
    #[serde(default)]
    pub faces: Vec<Vec<usize>>,
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: f64,
    #[serde(default)]
    pub passive: bool,
    #[serde(default = "yes")]
    pub solid: bool,
}

fn unit_scale() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EdgeEntry {
    pub mesh: String,
    pub a: usize,
    pub b: usize,
}

/// Engine settings loaded from `--config`; flags override individual fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunCfg {
    pub generate: GenerateCfg,
    pub sync: SyncCfg,
}

impl RunCfg {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let bytes = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.generate.validate()?;
        self.sync.validate()?;
        Ok(())
    }
}

/// A scene instantiated in a `MemoryHost`.
pub struct Scene {
    pub host: MemoryHost,
    pub meshes: Vec<(String, MeshRef)>,
    pub edges: Vec<EdgeSelection>,
}

impl Scene {
    pub fn mesh(&self, name: &str) -> Option<MeshRef> {
        self.meshes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| *r)
    }
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading scene {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing scene {}", path.display()))
    }

    pub fn build(&self) -> Result<Scene> {
        let mut host = MemoryHost::new();
        let mut meshes = Vec::with_capacity(self.meshes.len());
        for entry in &self.meshes {
            if meshes.iter().any(|(n, _): &(String, MeshRef)| n == &entry.name) {
                bail!("duplicate mesh name {:?}", entry.name);
            }
            let [tx, ty, tz] = entry.translation;
            let xf = Matrix4::new_translation(&Vector3::new(tx, ty, tz))
                * Matrix4::new_nonuniform_scaling(&Vector3::repeat(entry.scale));
            let mut mesh = MemoryMesh::new(entry.vertices.iter().map(|v| Vector3::from(*v)).collect())
                .with_transform(xf)
                .with_faces(entry.faces.clone());
            if entry.passive {
                mesh = mesh.with_mode(MeshMode::Passive);
            }
            mesh.solid = entry.solid;
            meshes.push((entry.name.clone(), host.add_mesh(mesh)));
        }
        let mut scene = Scene {
            host,
            meshes,
            edges: Vec::with_capacity(self.edges.len()),
        };
        for e in &self.edges {
            let mesh = scene
                .mesh(&e.mesh)
                .with_context(|| format!("edge refers to unknown mesh {:?}", e.mesh))?;
            scene.edges.push(EdgeSelection::single(mesh, e.a, e.b));
        }
        Ok(scene)
    }
}
