//! One named mesh component: CPU-side geometry, its GPU buffers and
//! texture, and the model matrix policy that places it in the world.
//!
//! A component moves through a fixed lifecycle. The loader appends
//! geometry with the `add_*` calls, [`MeshComponent::finalize`] uploads the
//! buffers and derives the geometric center, the render loop calls
//! [`MeshComponent::draw`], and [`MeshComponent::release`] returns every
//! GPU object exactly once.

use std::path::Path;

use glam::{Mat4, Vec2, Vec3};
use glow::HasContext;
use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::components::placement::PlacementRule;
use crate::engine::geometry;
use crate::engine::texture;
use crate::game::pieces::ComponentKind;

/// What the source mesh actually carried, kept for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshProperties {
    pub has_positions: bool,
    pub has_faces: bool,
    pub has_normals: bool,
    pub has_uvs: bool,
    pub has_bones: bool,
    pub has_tangents: bool,
    pub has_vertex_colors: bool,
    pub uv_channels: u32,
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh {name:?} has no vertices to upload")]
    EmptyGeometry { name: String },
    #[error("failed to allocate a GL buffer: {0}")]
    Allocate(String),
}

#[derive(Debug, Clone, Copy)]
struct GpuBuffers {
    vertex: glow::Buffer,
    uv: glow::Buffer,
    normal: glow::Buffer,
    element: glow::Buffer,
}

#[derive(Debug)]
pub struct MeshComponent {
    name: String,
    kind: ComponentKind,
    positions: Vec<Vec3>,
    uvs: Vec<Vec2>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    props: MeshProperties,
    texture_file: String,
    center: Vec3,
    bounds: (Vec3, Vec3),
    buffers: Option<GpuBuffers>,
    texture: Option<glow::Texture>,
}

impl MeshComponent {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ComponentKind::from_mesh_name(&name);
        Self {
            name,
            kind,
            positions: Vec::new(),
            uvs: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            props: MeshProperties::default(),
            texture_file: String::new(),
            center: Vec3::ZERO,
            bounds: (Vec3::ZERO, Vec3::ZERO),
            buffers: None,
            texture: None,
        }
    }

    /// Capacity hint for the expected vertex and face counts.
    pub fn reserve(&mut self, vertex_capacity: usize, face_capacity: usize) {
        self.positions.reserve(vertex_capacity);
        self.uvs.reserve(vertex_capacity);
        self.normals.reserve(vertex_capacity);
        self.indices.reserve(3 * face_capacity);
    }

    pub fn add_vertex(&mut self, position: Vec3) {
        self.positions.push(position);
    }

    /// Only U and V are kept; a third texture coordinate is discarded.
    pub fn add_uv(&mut self, uvw: Vec3) {
        self.uvs.push(Vec2::new(uvw.x, uvw.y));
    }

    pub fn add_normal(&mut self, normal: Vec3) {
        self.normals.push(normal);
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.push(a);
        self.indices.push(b);
        self.indices.push(c);
    }

    pub fn set_texture_file(&mut self, raw: impl Into<String>) {
        self.texture_file = raw.into();
    }

    pub fn set_properties(&mut self, props: MeshProperties) {
        self.props = props;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Componentwise min/max of the vertices. Meaningful only after
    /// [`Self::refresh_geometry`] ran on non-empty geometry.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.bounds
    }

    pub fn properties(&self) -> MeshProperties {
        self.props
    }

    pub fn texture_file(&self) -> &str {
        &self.texture_file
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn is_finalized(&self) -> bool {
        self.buffers.is_some()
    }

    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Recomputes the geometric center and bounding box from the current
    /// vertices. Pure CPU work, safe to call at any lifecycle stage.
    pub fn refresh_geometry(&mut self) {
        self.center = geometry::geometric_center(&self.positions);
        if !self.positions.is_empty() {
            self.bounds = geometry::bounding_box(&self.positions);
        }
    }

    /// Uploads the vertex, UV, normal and index buffers and derives the
    /// geometry summaries. Fails on a component without vertices.
    pub fn finalize(&mut self, gl: &glow::Context) -> Result<(), MeshError> {
        if self.positions.is_empty() {
            return Err(MeshError::EmptyGeometry {
                name: self.name.clone(),
            });
        }
        if self.buffers.is_some() {
            debug_assert!(false, "finalize called twice for {:?}", self.name);
            return Ok(());
        }
        debug_assert_eq!(self.uvs.len(), self.positions.len());
        debug_assert_eq!(self.normals.len(), self.positions.len());
        debug_assert_eq!(self.indices.len() % 3, 0);

        if !self.props.has_normals {
            warn!("mesh {:?} has no normals in the source file", self.name);
        }
        if !self.props.has_uvs {
            warn!(
                "mesh {:?} has no texture coordinates in the source file",
                self.name
            );
        }

        let buffers = unsafe {
            let vertex = gl.create_buffer().map_err(MeshError::Allocate)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&self.positions),
                glow::STATIC_DRAW,
            );

            let uv = gl.create_buffer().map_err(MeshError::Allocate)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(uv));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&self.uvs),
                glow::STATIC_DRAW,
            );

            let normal = gl.create_buffer().map_err(MeshError::Allocate)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(normal));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&self.normals),
                glow::STATIC_DRAW,
            );

            let element = gl.create_buffer().map_err(MeshError::Allocate)?;
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(element));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&self.indices),
                glow::STATIC_DRAW,
            );

            GpuBuffers {
                vertex,
                uv,
                normal,
                element,
            }
        };
        self.buffers = Some(buffers);

        self.refresh_geometry();
        debug!(
            "mesh {:?} uploaded: {} vertices, {} triangles",
            self.name,
            self.vertex_count(),
            self.index_count() / 3
        );
        Ok(())
    }

    /// Resolves the raw texture reference captured at load time and uploads
    /// the image. Failure leaves the component untextured and is reported,
    /// never fatal.
    pub fn resolve_texture(&mut self, gl: &glow::Context, assets_root: &Path) {
        match texture::resolve(assets_root, &self.texture_file) {
            Ok(path) => match texture::load_bmp(gl, &path) {
                Ok(loaded) => {
                    debug!("mesh {:?} texture {}", self.name, path.display());
                    self.texture = Some(loaded);
                }
                Err(err) => {
                    warn!("mesh {:?} texture failed to load: {}", self.name, err);
                }
            },
            Err(err) => {
                warn!("no usable texture for mesh {:?}: {}", self.name, err);
            }
        }
    }

    /// Binds the component texture to unit 0 and points the sampler at it.
    pub fn bind_texture(&self, gl: &glow::Context, sampler: &glow::UniformLocation) {
        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, self.texture);
            gl.uniform_1_i32(Some(sampler), 0);
        }
    }

    /// Issues the draw call for this component. Attribute arrays are
    /// enabled for the call and disabled again so no state leaks into the
    /// next component.
    pub fn draw(&self, gl: &glow::Context) {
        let Some(buffers) = &self.buffers else {
            debug_assert!(false, "draw on a mesh that was never finalized: {:?}", self.name);
            return;
        };
        unsafe {
            gl.enable_vertex_attrib_array(0);
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffers.vertex));
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 0, 0);

            gl.enable_vertex_attrib_array(1);
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffers.uv));
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, 0, 0);

            gl.enable_vertex_attrib_array(2);
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffers.normal));
            gl.vertex_attrib_pointer_f32(2, 3, glow::FLOAT, false, 0, 0);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffers.element));
            gl.draw_elements(
                glow::TRIANGLES,
                self.indices.len() as i32,
                glow::UNSIGNED_INT,
                0,
            );

            gl.disable_vertex_attrib_array(0);
            gl.disable_vertex_attrib_array(1);
            gl.disable_vertex_attrib_array(2);
        }
    }

    /// Deletes the GPU buffers and texture. Safe to call more than once;
    /// the component cannot be drawn afterwards.
    pub fn release(&mut self, gl: &glow::Context) {
        if let Some(buffers) = self.buffers.take() {
            unsafe {
                gl.delete_buffer(buffers.vertex);
                gl.delete_buffer(buffers.uv);
                gl.delete_buffer(buffers.normal);
                gl.delete_buffer(buffers.element);
            }
        }
        if let Some(loaded) = self.texture.take() {
            unsafe {
                gl.delete_texture(loaded);
            }
        }
    }

    /// Model matrix for one placed instance of this component.
    ///
    /// Composition order, outermost first: translate to the target square,
    /// optionally flip the white knight/bishop half a turn about Z, rotate
    /// the piece upright, scale, then center the mesh on its own origin.
    pub fn gen_model_matrix(&self, rule: &PlacementRule) -> Mat4 {
        let mut model = Mat4::from_translation(rule.position);
        if rule.angle != 0.0 {
            if self.kind.needs_flip() {
                model *= Mat4::from_rotation_z(180f32.to_radians());
            }
            model *= Mat4::from_axis_angle(rule.axis.normalize(), rule.angle.to_radians());
        }
        model *= Mat4::from_scale(rule.scale);
        model * Mat4::from_translation(self.kind.anchor_offset(self.center))
    }
}
