//! Scene assembly and frame rendering.
//!
//! [`Scene::new`] loads the board and piece models, uploads every
//! component, pairs them with the placement table and owns the GL
//! context from then on. Placement is recomputed per frame from the
//! immutable table, exactly as cheap as the scene is static.

use std::path::Path;

use glam::{Mat4, Vec3};
use glow::HasContext;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config;
use crate::engine::components::mesh::{MeshComponent, MeshError};
use crate::engine::components::placement::PlacementTable;
use crate::engine::loaders::obj::{self, ObjError};
use crate::engine::shader::{SceneShader, ShaderError};
use crate::game::layout;

const LIGHT_POSITION: Vec3 = Vec3::new(0.0, 0.0, 15.0);

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Load(#[from] ObjError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("failed to upload mesh {name:?}: {source}")]
    Upload {
        name: String,
        #[source]
        source: MeshError,
    },
    #[error("failed to allocate the vertex array: {0}")]
    VertexArray(String),
}

/// One drawn instance: a component index and its finished model matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub component: usize,
    pub model: Mat4,
}

/// Expands the placement table against the loaded components. Components
/// without a table entry are skipped here; setup already warned about
/// them once.
pub fn plan_placements(components: &[MeshComponent], table: &PlacementTable) -> Vec<Placement> {
    let mut placements = Vec::new();
    for (index, component) in components.iter().enumerate() {
        let Some(rule) = table.get(component.name()) else {
            continue;
        };
        for instance in rule.expand(layout::SQUARE_SIZE) {
            placements.push(Placement {
                component: index,
                model: component.gen_model_matrix(&instance),
            });
        }
    }
    placements
}

/// Per-frame inputs the window side owns: surface size, camera matrices
/// and the light toggle.
#[derive(Debug, Clone, Copy)]
pub struct RenderParams {
    pub width: u32,
    pub height: u32,
    pub projection: Mat4,
    pub view: Mat4,
    pub light_enabled: bool,
}

pub struct Scene {
    gl: glow::Context,
    shader: SceneShader,
    vao: glow::VertexArray,
    components: Vec<MeshComponent>,
    table: PlacementTable,
}

impl Scene {
    pub fn new(gl: glow::Context, assets_root: &Path) -> Result<Self, SceneError> {
        let mut components = Vec::new();
        let board_count =
            obj::load_into(&assets_root.join(config::BOARD_MODEL_FILE), &mut components)?;
        info!("board model: {} components", board_count);
        let piece_count =
            obj::load_into(&assets_root.join(config::PIECES_MODEL_FILE), &mut components)?;
        info!("piece model: {} components", piece_count);

        let table = layout::build_table();
        for component in &mut components {
            component
                .finalize(&gl)
                .map_err(|source| SceneError::Upload {
                    name: component.name().to_string(),
                    source,
                })?;
            component.resolve_texture(&gl, assets_root);
            if table.get(component.name()).is_none() {
                warn!(
                    "component {:?} has no placement entry and will not be drawn",
                    component.name()
                );
            }
        }

        let shader = SceneShader::new(&gl)?;
        let vao = unsafe {
            let vao = gl.create_vertex_array().map_err(SceneError::VertexArray)?;
            gl.bind_vertex_array(Some(vao));
            vao
        };
        unsafe {
            gl.clear_color(0.0, 0.0, 0.4, 0.0);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.enable(glow::CULL_FACE);
        }

        Ok(Self {
            gl,
            shader,
            vao,
            components,
            table,
        })
    }

    pub fn plan(&self) -> Vec<Placement> {
        plan_placements(&self.components, &self.table)
    }

    pub fn render(&self, params: &RenderParams) {
        let gl = &self.gl;
        unsafe {
            gl.viewport(0, 0, params.width as i32, params.height as i32);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.use_program(Some(self.shader.program));
            gl.uniform_matrix_4_f32_slice(
                Some(&self.shader.view),
                false,
                &params.view.to_cols_array(),
            );
            gl.uniform_1_i32(Some(&self.shader.light_enabled), params.light_enabled as i32);
            gl.uniform_3_f32(
                Some(&self.shader.light_position),
                LIGHT_POSITION.x,
                LIGHT_POSITION.y,
                LIGHT_POSITION.z,
            );
        }

        for placement in self.plan() {
            let component = &self.components[placement.component];
            let mvp = params.projection * params.view * placement.model;
            unsafe {
                gl.uniform_matrix_4_f32_slice(Some(&self.shader.mvp), false, &mvp.to_cols_array());
                gl.uniform_matrix_4_f32_slice(
                    Some(&self.shader.model),
                    false,
                    &placement.model.to_cols_array(),
                );
            }
            component.bind_texture(gl, &self.shader.sampler);
            component.draw(gl);
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        for component in &mut self.components {
            component.release(&self.gl);
        }
        unsafe {
            self.gl.delete_program(self.shader.program);
            self.gl.delete_vertex_array(self.vao);
        }
        debug!("scene resources released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pieces::BOARD_MESH_NAME;

    fn component(name: &str) -> MeshComponent {
        let mut component = MeshComponent::new(name);
        component.add_vertex(Vec3::ZERO);
        component.add_vertex(Vec3::new(2.0, 2.0, 2.0));
        component.refresh_geometry();
        component
    }

    #[test]
    fn test_board_and_pawns_plan_nine_draws() {
        let components = vec![component(BOARD_MESH_NAME), component("PEDONE13")];
        let placements = plan_placements(&components, &layout::build_table());
        assert_eq!(placements.len(), 9);
        assert_eq!(placements[0].component, 0);
        assert!(placements[1..].iter().all(|p| p.component == 1));
    }

    #[test]
    fn test_components_without_rules_are_skipped() {
        let components = vec![component("UNKNOWN"), component("RE2")];
        let placements = plan_placements(&components, &layout::build_table());
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].component, 1);
    }

    #[test]
    fn test_pawn_instances_step_one_square_apart() {
        let components = vec![component("PEDONE13")];
        let placements = plan_placements(&components, &layout::build_table());
        assert_eq!(placements.len(), 8);
        let x0 = placements[0].model.w_axis.x;
        let x1 = placements[1].model.w_axis.x;
        assert!((x1 - x0 - layout::SQUARE_SIZE).abs() < 1e-4);
    }

    #[test]
    fn test_empty_table_plans_nothing() {
        let components = vec![component(BOARD_MESH_NAME)];
        let placements = plan_placements(&components, &PlacementTable::new());
        assert!(placements.is_empty());
    }
}
