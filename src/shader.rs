//! Shader compilation, program linking and typed uniform setters.
//!
//! Failures are not fatal here. A stage that does not compile comes back
//! as an [`Error`]; a program whose stages fail to compile or link is still
//! returned, without a GL handle, and carries the diagnostic. The caller
//! checks [`Program::has_failed`] and decides what to do.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::context::GlContext;
use crate::error::{allocation, Error, Result};
use crate::uniforms::{Uniform, Uniforms};

/// Built-in GLSL sources (GLSL 3.30 core).
pub mod sources {
    /// Length of the `models` array in [`MESH_VERTEX`]. A draw with more
    /// instances than this reads past the end of the array.
    pub const MAX_INSTANCES: usize = 16;

    /// Vertex shader for instanced meshes.
    ///
    /// Each instance picks its model matrix from `models` by
    /// `gl_InstanceID`, so up to [`MAX_INSTANCES`] copies are drawn by one
    /// call.
    ///
    /// # Uniforms
    ///
    /// | Name         | Type       | Description                     |
    /// |--------------|------------|---------------------------------|
    /// | `models`     | `mat4[16]` | One model matrix per instance   |
    /// | `view`       | `mat4`     | Camera view matrix              |
    /// | `projection` | `mat4`     | Projection matrix               |
    pub const MESH_VERTEX: &str = r"#version 330 core

layout (location = 0) in vec3 position;

uniform mat4 models[16];
uniform mat4 view;
uniform mat4 projection;

void main() {
    gl_Position = projection * view * models[gl_InstanceID] * vec4(position, 1.0);
}
";

    /// Fragment shader writing one flat color.
    ///
    /// # Uniforms
    ///
    /// | Name    | Type   | Description  |
    /// |---------|--------|--------------|
    /// | `color` | `vec3` | Output color |
    pub const COLOR_FRAGMENT: &str = r"#version 330 core

uniform vec3 color;

out vec4 frag_color;

void main() {
    frag_color = vec4(color, 1.0);
}
";

    /// Vertex shader for textured surfaces (HUD elements, glyph quads).
    ///
    /// # Uniforms
    ///
    /// | Name         | Type   | Description       |
    /// |--------------|--------|-------------------|
    /// | `model`      | `mat4` | Surface placement |
    /// | `view`       | `mat4` | Camera view       |
    /// | `projection` | `mat4` | Projection        |
    pub const SURFACE_VERTEX: &str = r"#version 330 core

layout (location = 0) in vec2 position;
layout (location = 1) in vec2 texture_coord;

uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;

out vec2 v_texture_coord;

void main() {
    v_texture_coord = texture_coord;
    gl_Position = projection * view * model * vec4(position, 0.0, 1.0);
}
";

    /// Fragment shader sampling one 2D texture.
    ///
    /// # Uniforms
    ///
    /// | Name        | Type        | Description        |
    /// |-------------|-------------|--------------------|
    /// | `texture2d` | `sampler2D` | Bound texture unit |
    pub const SURFACE_FRAGMENT: &str = r"#version 330 core

in vec2 v_texture_coord;

uniform sampler2D texture2d;

out vec4 frag_color;

void main() {
    frag_color = texture(texture2d, v_texture_coord);
}
";
}

/// A programmable pipeline stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    /// Per-vertex stage.
    Vertex,
    /// Per-fragment stage.
    Fragment,
}

impl ShaderStage {
    fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// A compiled shader stage, ready to be linked.
pub struct Shader<G: GlContext> {
    handle: G::Shader,
    stage: ShaderStage,
}

impl<G: GlContext> Shader<G> {
    /// Compile `source` for `stage`.
    ///
    /// # Safety
    ///
    /// Requires a current GL context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShaderCompile`] carrying the compiler diagnostic
    /// (also logged), or [`Error::Allocation`] if no shader object could be
    /// created.
    pub unsafe fn compile(gl: &G, source: &str, stage: ShaderStage) -> Result<Self> {
        unsafe {
            let handle = gl
                .create_shader(stage.gl_enum())
                .map_err(allocation("shader"))?;
            gl.shader_source(handle, source);
            gl.compile_shader(handle);

            if !gl.get_shader_compile_status(handle) {
                let log = diagnostic(gl.get_shader_info_log(handle), "compilation failed");
                gl.delete_shader(handle);
                log::error!("{stage} shader: {log}");
                return Err(Error::ShaderCompile { stage, log });
            }

            Ok(Self { handle, stage })
        }
    }

    /// Which stage this shader implements.
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// GL shader name.
    #[must_use]
    pub fn handle(&self) -> G::Shader {
        self.handle
    }

    /// Flag the shader for deletion; the GL reclaims it once no program
    /// references it.
    ///
    /// # Safety
    ///
    /// Requires the context that created this shader to be current.
    pub unsafe fn free(self, gl: &G) {
        unsafe { gl.delete_shader(self.handle) };
    }
}

/// A linked vertex + fragment program.
///
/// A program that failed to build has no handle; drawing with it binds no
/// program, and its uniform setters do nothing.
pub struct Program<G: GlContext> {
    handle: Option<G::Program>,
    error: Option<Error>,
}

impl<G: GlContext> Program<G> {
    /// Link two compiled stages. Both shaders are flagged for deletion
    /// whether linking succeeds or not.
    ///
    /// # Safety
    ///
    /// Requires the context that created both shaders to be current.
    pub unsafe fn link(gl: &G, vertex: Shader<G>, fragment: Shader<G>) -> Self {
        let program = match unsafe { gl.create_program() } {
            Ok(program) => program,
            Err(reason) => {
                unsafe {
                    vertex.free(gl);
                    fragment.free(gl);
                }
                return Self::failed(allocation("program")(reason));
            }
        };

        unsafe {
            gl.attach_shader(program, vertex.handle);
            gl.attach_shader(program, fragment.handle);
            gl.link_program(program);

            let linked = gl.get_program_link_status(program);
            let log = (!linked).then(|| gl.get_program_info_log(program));

            gl.detach_shader(program, vertex.handle);
            gl.detach_shader(program, fragment.handle);
            vertex.free(gl);
            fragment.free(gl);

            if let Some(log) = log {
                gl.delete_program(program);
                let log = diagnostic(log, "linking failed");
                log::error!("program: {log}");
                return Self::failed(Error::ProgramLink { log });
            }
        }

        log::debug!("linked program {program:?}");
        Self {
            handle: Some(program),
            error: None,
        }
    }

    /// Compile both stages from source and link them.
    ///
    /// # Safety
    ///
    /// Requires a current GL context.
    pub unsafe fn new(gl: &G, vertex_source: &str, fragment_source: &str) -> Self {
        let vertex = unsafe { Shader::compile(gl, vertex_source, ShaderStage::Vertex) };
        let fragment = unsafe { Shader::compile(gl, fragment_source, ShaderStage::Fragment) };

        match (vertex, fragment) {
            (Ok(vertex), Ok(fragment)) => unsafe { Self::link(gl, vertex, fragment) },
            (Err(error), other) | (other @ Ok(_), Err(error)) => {
                if let Ok(shader) = other {
                    unsafe { shader.free(gl) };
                }
                Self::failed(error)
            }
        }
    }

    /// Read both stages from disk, then build as [`new`](Self::new).
    ///
    /// An unreadable file is logged and treated as empty source, so it
    /// surfaces as a compile failure of that stage.
    ///
    /// # Safety
    ///
    /// Requires a current GL context.
    pub unsafe fn from_files(
        gl: &G,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Self {
        let vertex = read_source(vertex_path.as_ref());
        let fragment = read_source(fragment_path.as_ref());
        unsafe { Self::new(gl, &vertex, &fragment) }
    }

    /// Wrap a program linked elsewhere, for example by a UI library that
    /// shares the context. [`free`](Self::free) deletes it like any other.
    #[must_use]
    pub fn from_handle(handle: G::Program) -> Self {
        Self {
            handle: Some(handle),
            error: None,
        }
    }

    fn failed(error: Error) -> Self {
        Self {
            handle: None,
            error: Some(error),
        }
    }

    /// GL program name; `None` if building failed.
    #[must_use]
    pub fn handle(&self) -> Option<G::Program> {
        self.handle
    }

    /// Whether compilation or linking failed.
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.handle.is_none()
    }

    /// Why building failed, if it did.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Activate the program for subsequent draws.
    ///
    /// # Safety
    ///
    /// Requires the context that created this program to be current.
    pub unsafe fn use_program(&self, gl: &G) {
        unsafe { gl.use_program(self.handle) };
    }

    /// Deactivate any program.
    ///
    /// # Safety
    ///
    /// Requires a current GL context.
    pub unsafe fn unuse(&self, gl: &G) {
        unsafe { gl.use_program(None) };
    }

    /// Look up `name`; uniforms the shader does not declare (or optimized
    /// away) resolve to `None` and are skipped by every setter.
    unsafe fn location(&self, gl: &G, name: &str) -> Option<G::UniformLocation> {
        let location = unsafe { gl.get_uniform_location(self.handle?, name) };
        if location.is_none() {
            log::trace!("uniform {name} not found, skipping");
        }
        location
    }

    /// Set a `mat4` uniform.
    ///
    /// # Safety
    ///
    /// The program must be in use on the current context.
    pub unsafe fn set_mat4(&self, gl: &G, name: &str, value: &Mat4) {
        if let Some(location) = unsafe { self.location(gl, name) } {
            unsafe { gl.uniform_matrix_4_f32(&location, &value.to_cols_array()) };
        }
    }

    /// Set a `vec2` uniform.
    ///
    /// # Safety
    ///
    /// The program must be in use on the current context.
    pub unsafe fn set_vec2(&self, gl: &G, name: &str, value: Vec2) {
        if let Some(location) = unsafe { self.location(gl, name) } {
            unsafe { gl.uniform_2_f32(&location, value.x, value.y) };
        }
    }

    /// Set a `vec3` uniform.
    ///
    /// # Safety
    ///
    /// The program must be in use on the current context.
    pub unsafe fn set_vec3(&self, gl: &G, name: &str, value: Vec3) {
        if let Some(location) = unsafe { self.location(gl, name) } {
            unsafe { gl.uniform_3_f32(&location, value.x, value.y, value.z) };
        }
    }

    /// Set a `vec4` uniform.
    ///
    /// # Safety
    ///
    /// The program must be in use on the current context.
    pub unsafe fn set_vec4(&self, gl: &G, name: &str, value: Vec4) {
        if let Some(location) = unsafe { self.location(gl, name) } {
            unsafe { gl.uniform_4_f32(&location, value.x, value.y, value.z, value.w) };
        }
    }

    /// Set a `bool` uniform (written as an integer).
    ///
    /// # Safety
    ///
    /// The program must be in use on the current context.
    pub unsafe fn set_bool(&self, gl: &G, name: &str, value: bool) {
        unsafe { self.set_int(gl, name, i32::from(value)) };
    }

    /// Set an `int` (or sampler) uniform.
    ///
    /// # Safety
    ///
    /// The program must be in use on the current context.
    pub unsafe fn set_int(&self, gl: &G, name: &str, value: i32) {
        if let Some(location) = unsafe { self.location(gl, name) } {
            unsafe { gl.uniform_1_i32(&location, value) };
        }
    }

    /// Set a `float` uniform.
    ///
    /// # Safety
    ///
    /// The program must be in use on the current context.
    pub unsafe fn set_float(&self, gl: &G, name: &str, value: f32) {
        if let Some(location) = unsafe { self.location(gl, name) } {
            unsafe { gl.uniform_1_f32(&location, value) };
        }
    }

    /// Write every entry of `uniforms` with the setter matching its type.
    ///
    /// Texture entries are attached to their unit first, then the unit index
    /// is written to the sampler. Two entries naming different textures on
    /// the same unit clobber each other; this is logged.
    ///
    /// # Safety
    ///
    /// The program must be in use on the current context, and every texture
    /// referenced by `uniforms` must still be alive.
    pub unsafe fn apply_uniforms(&self, gl: &G, uniforms: &Uniforms<G::Texture>) {
        let mut units = HashMap::new();

        for (name, value) in uniforms.iter() {
            unsafe {
                match *value {
                    Uniform::Mat4(ref matrix) => self.set_mat4(gl, name, matrix),
                    Uniform::Vec2(vector) => self.set_vec2(gl, name, vector),
                    Uniform::Vec3(vector) => self.set_vec3(gl, name, vector),
                    Uniform::Vec4(vector) => self.set_vec4(gl, name, vector),
                    Uniform::Bool(flag) => self.set_bool(gl, name, flag),
                    Uniform::Int(int) => self.set_int(gl, name, int),
                    Uniform::Float(float) => self.set_float(gl, name, float),
                    Uniform::Texture(binding) => {
                        if let Some(previous) = units.insert(binding.unit, binding.handle) {
                            if previous != binding.handle {
                                log::warn!(
                                    "texture unit {} bound twice in one draw (uniform {name})",
                                    binding.unit.index()
                                );
                            }
                        }
                        binding.attach(gl);
                        #[expect(clippy::cast_possible_wrap)]
                        self.set_int(gl, name, binding.unit.index() as i32);
                    }
                }
            }
        }
    }

    /// Delete the program. Renderers sharing it must not draw afterwards.
    ///
    /// # Safety
    ///
    /// Requires the context that created this program to be current.
    pub unsafe fn free(&self, gl: &G) {
        if let Some(program) = self.handle {
            log::debug!("deleting program {program:?}");
            unsafe { gl.delete_program(program) };
        }
    }
}

/// Drivers may return an empty info log; keep diagnostics non-empty.
fn diagnostic(log: String, fallback: &str) -> String {
    let trimmed = log.trim();
    if trimmed.is_empty() {
        fallback.to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn read_source(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|err| {
        log::warn!("shader source {} could not be read: {err}", path.display());
        String::new()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::image::{Image, PixelFormat};
    use crate::testing::{Call, RecordingContext, Value};
    use crate::texture::{Texture2D, TextureOptions};

    #[test]
    fn builtin_sources_link() {
        let gl = RecordingContext::new();
        let program = unsafe { Program::new(&gl, sources::MESH_VERTEX, sources::COLOR_FRAGMENT) };
        assert!(!program.has_failed());
        assert!(program.error().is_none());
    }

    #[test]
    fn invalid_source_yields_a_failed_program_with_a_diagnostic() {
        let gl = RecordingContext::new();
        let program = unsafe { Program::new(&gl, "not glsl at all", sources::COLOR_FRAGMENT) };

        assert!(program.has_failed());
        assert!(program.handle().is_none());
        match program.error() {
            Some(Error::ShaderCompile { stage, log }) => {
                assert_eq!(*stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The fragment stage compiled and must not leak.
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn link_failure_deletes_program_and_shaders() {
        let gl = RecordingContext::new();
        gl.fail_next_link();

        let program = unsafe { Program::new(&gl, sources::MESH_VERTEX, sources::COLOR_FRAGMENT) };

        assert!(matches!(program.error(), Some(Error::ProgramLink { log }) if !log.is_empty()));
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.deleted_programs().len(), 1);
    }

    #[test]
    fn shaders_are_released_after_a_successful_link() {
        let gl = RecordingContext::new();
        let _program = unsafe { Program::new(&gl, sources::MESH_VERTEX, sources::COLOR_FRAGMENT) };
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn unreadable_shader_file_fails_to_compile() {
        let gl = RecordingContext::new();
        let program = unsafe { Program::from_files(&gl, "missing.vert", "missing.frag") };
        assert!(matches!(program.error(), Some(Error::ShaderCompile { .. })));
    }

    #[test]
    fn missing_uniforms_are_skipped() {
        let gl = RecordingContext::new();
        gl.declare_uniforms(&["color"]);
        let program = unsafe { Program::new(&gl, sources::MESH_VERTEX, sources::COLOR_FRAGMENT) };
        gl.clear_calls();

        unsafe {
            program.set_float(&gl, "missing", 1.0);
            program.set_vec3(&gl, "color", Vec3::ONE);
        }

        assert!(gl.uniform_writes("missing").is_empty());
        assert_eq!(gl.uniform_writes("color"), vec![Value::Vec3([1.0, 1.0, 1.0])]);
    }

    #[test]
    fn apply_uniforms_dispatches_by_type() {
        let gl = RecordingContext::new();
        let program =
            unsafe { Program::new(&gl, sources::SURFACE_VERTEX, sources::SURFACE_FRAGMENT) };
        let image = Image::blank(1, 1, PixelFormat::Rgba);
        let texture = unsafe { Texture2D::new(&gl, image, TextureOptions::on_unit(2)) }.unwrap();
        let uniforms = Uniforms::new()
            .with("model", Mat4::IDENTITY)
            .with("flag", true)
            .with("count", 3_i32)
            .with("alpha", 0.5_f32)
            .with("texture2d", &texture);
        gl.clear_calls();

        unsafe { program.apply_uniforms(&gl, &uniforms) };

        assert_eq!(
            gl.uniform_writes("model"),
            vec![Value::Mat4(Mat4::IDENTITY.to_cols_array())]
        );
        assert_eq!(gl.uniform_writes("flag"), vec![Value::Int(1)]);
        assert_eq!(gl.uniform_writes("count"), vec![Value::Int(3)]);
        assert_eq!(gl.uniform_writes("alpha"), vec![Value::Float(0.5)]);
        assert_eq!(gl.uniform_writes("texture2d"), vec![Value::Int(2)]);
        assert!(gl.calls().contains(&Call::ActiveTexture(glow::TEXTURE2)));
    }

    #[test]
    fn wrapped_handle_takes_uniforms() {
        let gl = RecordingContext::new();
        let linked = unsafe { Program::new(&gl, sources::MESH_VERTEX, sources::COLOR_FRAGMENT) };
        let program = Program::<RecordingContext>::from_handle(linked.handle().unwrap());
        gl.clear_calls();

        unsafe { program.set_vec3(&gl, "color", Vec3::X) };

        assert!(!program.has_failed());
        assert_eq!(program.handle(), linked.handle());
        assert_eq!(gl.uniform_writes("color"), vec![Value::Vec3([1.0, 0.0, 0.0])]);
    }

    #[test]
    fn mesh_shader_holds_max_instances_models() {
        let declaration = format!("uniform mat4 models[{}];", sources::MAX_INSTANCES);
        assert!(sources::MESH_VERTEX.contains(&declaration));
    }

    #[test]
    fn failed_program_ignores_uniforms() {
        let gl = RecordingContext::new();
        let program = unsafe { Program::new(&gl, "", "") };
        gl.clear_calls();

        unsafe { program.set_int(&gl, "anything", 1) };

        assert!(gl.calls().is_empty());
    }
}
