//! GLSL compilation, program linking and the scene program's uniforms.

use glow::HasContext;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to create a shader object: {0}")]
    Create(String),
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: &'static str, log: String },
    #[error("shader program failed to link: {log}")]
    Link { log: String },
    #[error("uniform {0:?} missing from the scene program")]
    MissingUniform(&'static str),
}

const VERTEX_SOURCE: &str = include_str!("../assets/shaders/vertex_scene.glsl");
const FRAGMENT_SOURCE: &str = include_str!("../assets/shaders/fragment_scene.glsl");

fn compile_shader(
    gl: &glow::Context,
    stage: u32,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    let name = match stage {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    };
    unsafe {
        let shader = gl.create_shader(stage).map_err(ShaderError::Create)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(ShaderError::Compile { stage: name, log });
        }
        Ok(shader)
    }
}

/// Compiles both stages and links them, cleaning up the intermediate
/// shader objects whether or not linking succeeds.
pub fn link_program(
    gl: &glow::Context,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<glow::Program, ShaderError> {
    let vertex = compile_shader(gl, glow::VERTEX_SHADER, vertex_source)?;
    let fragment = match compile_shader(gl, glow::FRAGMENT_SHADER, fragment_source) {
        Ok(fragment) => fragment,
        Err(err) => {
            unsafe { gl.delete_shader(vertex) };
            return Err(err);
        }
    };
    unsafe {
        let program = match gl.create_program() {
            Ok(program) => program,
            Err(message) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(ShaderError::Create(message));
            }
        };
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);
        gl.detach_shader(program, vertex);
        gl.detach_shader(program, fragment);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(ShaderError::Link { log });
        }
        Ok(program)
    }
}

/// The linked scene program with every uniform location resolved up
/// front. A missing uniform is a build error in the shader sources, so
/// construction fails rather than drawing with dead inputs.
#[derive(Debug)]
pub struct SceneShader {
    pub program: glow::Program,
    pub mvp: glow::UniformLocation,
    pub model: glow::UniformLocation,
    pub view: glow::UniformLocation,
    pub sampler: glow::UniformLocation,
    pub light_enabled: glow::UniformLocation,
    pub light_position: glow::UniformLocation,
}

impl SceneShader {
    pub fn new(gl: &glow::Context) -> Result<Self, ShaderError> {
        let program = link_program(gl, VERTEX_SOURCE, FRAGMENT_SOURCE)?;
        let uniform = |name: &'static str| {
            unsafe { gl.get_uniform_location(program, name) }
                .ok_or(ShaderError::MissingUniform(name))
        };
        Ok(Self {
            program,
            mvp: uniform("mvp")?,
            model: uniform("model")?,
            view: uniform("view")?,
            sampler: uniform("baseColorTexture")?,
            light_enabled: uniform("lightEnabled")?,
            light_position: uniform("lightPositionWorld")?,
        })
    }
}
