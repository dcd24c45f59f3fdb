//! A [`GlContext`] that keeps GL state in memory and records the calls that
//! matter to the wrappers, so they can be tested without a GPU.
#![allow(clippy::cast_sign_loss)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::context::GlContext;

/// A call the tests assert on. State-only calls (parameters, pixel store,
/// uploads) are not recorded; their effect is visible through the queries.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    ActiveTexture(u32),
    BindTexture { target: u32, texture: Option<u32> },
    BindVertexArray(Option<u32>),
    UseProgram(Option<u32>),
    ClearColor([f32; 4]),
    Clear(u32),
    Uniform { name: String, value: Value },
    Draw { mode: u32, count: i32, offset: i32, instances: i32 },
    StencilFunc { func: u32, reference: i32, mask: u32 },
    StencilOp { fail: u32, depth_fail: u32, pass: u32 },
}

/// A uniform value as written to the context.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

/// Level 0 of one texture target.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub size: [i32; 2],
    pub format: u32,
    pub pixels: Vec<u8>,
}

/// One `vertex_attrib_pointer_f32` call, in bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributePointer {
    pub index: u32,
    pub size: i32,
    pub stride: i32,
    pub offset: i32,
    pub buffer: Option<u32>,
    pub enabled: bool,
}

#[derive(Default)]
struct VertexArrayState {
    attributes: Vec<AttributePointer>,
    enabled: HashSet<u32>,
    element_buffer: Option<u32>,
}

struct ShaderState {
    compiled: bool,
}

#[derive(Default)]
struct ProgramState {
    attached: Vec<u32>,
    linked: bool,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    textures: HashMap<u32, HashMap<u32, Level>>,
    bound_textures: HashMap<u32, u32>,
    framebuffers: HashMap<u32, Option<u32>>,
    bound_framebuffer: Option<u32>,
    buffers: HashMap<u32, Vec<u8>>,
    bound_buffers: HashMap<u32, u32>,
    vertex_arrays: HashMap<u32, VertexArrayState>,
    bound_vertex_array: Option<u32>,
    shaders: HashMap<u32, ShaderState>,
    programs: HashMap<u32, ProgramState>,
    deleted_textures: Vec<u32>,
    deleted_framebuffers: Vec<u32>,
    deleted_buffers: Vec<u32>,
    deleted_vertex_arrays: Vec<u32>,
    deleted_programs: Vec<u32>,
}

/// In-memory GL context. Handles are unique across object kinds.
#[derive(Default)]
pub struct RecordingContext {
    state: RefCell<State>,
    next_handle: Cell<u32>,
    fail_next_link: Cell<bool>,
    declared_uniforms: RefCell<Option<HashSet<String>>>,
}

fn channels(format: u32) -> usize {
    match format {
        glow::RED => 1,
        glow::RGB => 3,
        _ => 4,
    }
}

fn is_cube_face(target: u32) -> bool {
    (glow::TEXTURE_CUBE_MAP_POSITIVE_X..=glow::TEXTURE_CUBE_MAP_NEGATIVE_Z).contains(&target)
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Uniform values written under `name`, oldest first.
    pub fn uniform_writes(&self, name: &str) -> Vec<Value> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Uniform { name: written, value } if written == name => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// Draw calls, oldest first.
    pub fn draws(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Draw { .. }))
            .collect()
    }

    /// Stored level of `target` (`TEXTURE_2D` or a cube face) for `texture`.
    pub fn texture_level(&self, texture: u32, target: u32) -> Option<Level> {
        self.state.borrow().textures.get(&texture)?.get(&target).cloned()
    }

    pub fn deleted_textures(&self) -> Vec<u32> {
        self.state.borrow().deleted_textures.clone()
    }

    pub fn deleted_framebuffers(&self) -> Vec<u32> {
        self.state.borrow().deleted_framebuffers.clone()
    }

    pub fn deleted_buffers(&self) -> Vec<u32> {
        self.state.borrow().deleted_buffers.clone()
    }

    pub fn deleted_vertex_arrays(&self) -> Vec<u32> {
        self.state.borrow().deleted_vertex_arrays.clone()
    }

    pub fn deleted_programs(&self) -> Vec<u32> {
        self.state.borrow().deleted_programs.clone()
    }

    /// Shader objects created and not yet deleted.
    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn bound_framebuffer(&self) -> Option<u32> {
        self.state.borrow().bound_framebuffer
    }

    pub fn buffer_contents(&self, buffer: u32) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn vertex_attributes(&self, vertex_array: u32) -> Vec<AttributePointer> {
        let state = self.state.borrow();
        let Some(array) = state.vertex_arrays.get(&vertex_array) else {
            return Vec::new();
        };
        array
            .attributes
            .iter()
            .map(|attribute| AttributePointer {
                enabled: array.enabled.contains(&attribute.index),
                ..attribute.clone()
            })
            .collect()
    }

    pub fn element_buffer(&self, vertex_array: u32) -> Option<u32> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)?
            .element_buffer
    }

    /// Make the next `link_program` fail.
    pub fn fail_next_link(&self) {
        self.fail_next_link.set(true);
    }

    /// Restrict resolvable uniform names. By default every name resolves.
    pub fn declare_uniforms(&self, names: &[&str]) {
        *self.declared_uniforms.borrow_mut() =
            Some(names.iter().map(|&name| name.to_owned()).collect());
    }

    fn handle(&self) -> u32 {
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        handle
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn write_uniform(&self, location: &str, value: Value) {
        self.record(Call::Uniform {
            name: location.to_owned(),
            value,
        });
    }

    /// Texture bound to the bind point that owns `target`.
    fn bound_texture(state: &State, target: u32) -> Option<u32> {
        let bind_point = if is_cube_face(target) {
            glow::TEXTURE_CUBE_MAP
        } else {
            target
        };
        state.bound_textures.get(&bind_point).copied()
    }
}

impl GlContext for RecordingContext {
    type Texture = u32;
    type Framebuffer = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type Shader = u32;
    type Program = u32;
    type UniformLocation = String;

    unsafe fn create_texture(&self) -> Result<u32, String> {
        let handle = self.handle();
        self.state.borrow_mut().textures.insert(handle, HashMap::new());
        Ok(handle)
    }

    unsafe fn delete_texture(&self, texture: u32) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&texture);
        state.deleted_textures.push(texture);
    }

    unsafe fn active_texture(&self, unit: u32) {
        self.record(Call::ActiveTexture(unit));
    }

    unsafe fn bind_texture(&self, target: u32, texture: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match texture {
            Some(texture) => state.bound_textures.insert(target, texture),
            None => state.bound_textures.remove(&target),
        };
        state.calls.push(Call::BindTexture { target, texture });
    }

    unsafe fn tex_parameter_i32(&self, _target: u32, _parameter: u32, _value: i32) {}

    unsafe fn pixel_store_i32(&self, _parameter: u32, _value: i32) {}

    unsafe fn tex_image_2d(
        &self,
        target: u32,
        width: i32,
        height: i32,
        format: u32,
        pixels: Option<&[u8]>,
    ) {
        let mut state = self.state.borrow_mut();
        let Some(texture) = Self::bound_texture(&state, target) else {
            return;
        };
        let len = width as usize * height as usize * channels(format);
        let pixels = pixels.map_or_else(|| vec![0; len], <[u8]>::to_vec);
        if let Some(levels) = state.textures.get_mut(&texture) {
            levels.insert(
                target,
                Level {
                    size: [width, height],
                    format,
                    pixels,
                },
            );
        }
    }

    unsafe fn tex_sub_image_2d(
        &self,
        target: u32,
        [x, y]: [i32; 2],
        [width, height]: [i32; 2],
        format: u32,
        pixels: &[u8],
    ) {
        let mut state = self.state.borrow_mut();
        let Some(texture) = Self::bound_texture(&state, target) else {
            return;
        };
        let Some(level) = state
            .textures
            .get_mut(&texture)
            .and_then(|levels| levels.get_mut(&target))
        else {
            return;
        };

        let texel = channels(format);
        let row_len = width as usize * texel;
        for row in 0..height as usize {
            let dst = ((y as usize + row) * level.size[0] as usize + x as usize) * texel;
            let src = row * row_len;
            level.pixels[dst..dst + row_len].copy_from_slice(&pixels[src..src + row_len]);
        }
    }

    unsafe fn get_tex_image(&self, target: u32, _format: u32, pixels: &mut [u8]) {
        let state = self.state.borrow();
        let level = Self::bound_texture(&state, target)
            .and_then(|texture| state.textures.get(&texture)?.get(&target));
        if let Some(level) = level {
            let len = pixels.len().min(level.pixels.len());
            pixels[..len].copy_from_slice(&level.pixels[..len]);
        }
    }

    unsafe fn create_framebuffer(&self) -> Result<u32, String> {
        let handle = self.handle();
        self.state.borrow_mut().framebuffers.insert(handle, None);
        Ok(handle)
    }

    unsafe fn delete_framebuffer(&self, framebuffer: u32) {
        let mut state = self.state.borrow_mut();
        state.framebuffers.remove(&framebuffer);
        state.deleted_framebuffers.push(framebuffer);
    }

    unsafe fn bind_framebuffer(&self, _target: u32, framebuffer: Option<u32>) {
        self.state.borrow_mut().bound_framebuffer = framebuffer;
    }

    unsafe fn framebuffer_binding(&self) -> Option<u32> {
        self.state.borrow().bound_framebuffer
    }

    unsafe fn framebuffer_texture_2d(
        &self,
        _target: u32,
        _attachment: u32,
        _texture_target: u32,
        texture: Option<u32>,
    ) {
        let mut state = self.state.borrow_mut();
        if let Some(bound) = state.bound_framebuffer {
            state.framebuffers.insert(bound, texture);
        }
    }

    unsafe fn check_framebuffer_status(&self, _target: u32) -> u32 {
        let state = self.state.borrow();
        let Some(bound) = state.bound_framebuffer else {
            return glow::FRAMEBUFFER_COMPLETE;
        };
        match state.framebuffers.get(&bound) {
            Some(Some(texture)) if state.textures.contains_key(texture) => {
                glow::FRAMEBUFFER_COMPLETE
            }
            _ => glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT,
        }
    }

    unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.record(Call::ClearColor([red, green, blue, alpha]));
    }

    unsafe fn clear(&self, mask: u32) {
        self.record(Call::Clear(mask));
    }

    unsafe fn create_buffer(&self) -> Result<u32, String> {
        let handle = self.handle();
        self.state.borrow_mut().buffers.insert(handle, Vec::new());
        Ok(handle)
    }

    unsafe fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        state.buffers.remove(&buffer);
        state.deleted_buffers.push(buffer);
    }

    unsafe fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match buffer {
            Some(buffer) => state.bound_buffers.insert(target, buffer),
            None => state.bound_buffers.remove(&target),
        };
        if target == glow::ELEMENT_ARRAY_BUFFER {
            if let Some(array) = state.bound_vertex_array {
                if let Some(array) = state.vertex_arrays.get_mut(&array) {
                    array.element_buffer = buffer;
                }
            }
        }
    }

    unsafe fn buffer_data_size(&self, target: u32, size: i32, _usage: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(buffer) = state.bound_buffers.get(&target).copied() {
            state.buffers.insert(buffer, vec![0; size as usize]);
        }
    }

    unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], _usage: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(buffer) = state.bound_buffers.get(&target).copied() {
            state.buffers.insert(buffer, data.to_vec());
        }
    }

    unsafe fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffers.get(&target).copied() else {
            return;
        };
        if let Some(storage) = state.buffers.get_mut(&buffer) {
            let start = offset as usize;
            assert!(
                start + data.len() <= storage.len(),
                "buffer_sub_data past the end of buffer {buffer}"
            );
            storage[start..start + data.len()].copy_from_slice(data);
        }
    }

    unsafe fn create_vertex_array(&self) -> Result<u32, String> {
        let handle = self.handle();
        self.state
            .borrow_mut()
            .vertex_arrays
            .insert(handle, VertexArrayState::default());
        Ok(handle)
    }

    unsafe fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        state.vertex_arrays.remove(&vertex_array);
        state.deleted_vertex_arrays.push(vertex_array);
    }

    unsafe fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.bound_vertex_array = vertex_array;
        state.calls.push(Call::BindVertexArray(vertex_array));
    }

    unsafe fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(array) = state.bound_vertex_array {
            if let Some(array) = state.vertex_arrays.get_mut(&array) {
                array.enabled.insert(index);
            }
        }
    }

    unsafe fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        let mut state = self.state.borrow_mut();
        let buffer = state.bound_buffers.get(&glow::ARRAY_BUFFER).copied();
        if let Some(array) = state.bound_vertex_array {
            if let Some(array) = state.vertex_arrays.get_mut(&array) {
                array.attributes.push(AttributePointer {
                    index,
                    size,
                    stride,
                    offset,
                    buffer,
                    enabled: false,
                });
            }
        }
    }

    unsafe fn create_shader(&self, _stage: u32) -> Result<u32, String> {
        let handle = self.handle();
        self.state
            .borrow_mut()
            .shaders
            .insert(handle, ShaderState { compiled: false });
        Ok(handle)
    }

    unsafe fn shader_source(&self, shader: u32, source: &str) {
        if let Some(state) = self.state.borrow_mut().shaders.get_mut(&shader) {
            state.compiled = source.contains("void main");
        }
    }

    unsafe fn compile_shader(&self, _shader: u32) {}

    unsafe fn get_shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|state| state.compiled)
    }

    unsafe fn get_shader_info_log(&self, shader: u32) -> String {
        if unsafe { self.get_shader_compile_status(shader) } {
            String::new()
        } else {
            "0:1(1): error: syntax error, unexpected end of file".to_owned()
        }
    }

    unsafe fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
    }

    unsafe fn create_program(&self) -> Result<u32, String> {
        let handle = self.handle();
        self.state
            .borrow_mut()
            .programs
            .insert(handle, ProgramState::default());
        Ok(handle)
    }

    unsafe fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(state) = self.state.borrow_mut().programs.get_mut(&program) {
            state.attached.push(shader);
        }
    }

    unsafe fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(state) = self.state.borrow_mut().programs.get_mut(&program) {
            state.attached.retain(|&attached| attached != shader);
        }
    }

    unsafe fn link_program(&self, program: u32) {
        let fail = self.fail_next_link.replace(false);
        let mut state = self.state.borrow_mut();
        let stages_compiled = state.programs.get(&program).is_some_and(|program| {
            program.attached.len() == 2
                && program.attached.iter().all(|shader| {
                    state
                        .shaders
                        .get(shader)
                        .is_some_and(|shader| shader.compiled)
                })
        });
        if let Some(program) = state.programs.get_mut(&program) {
            program.linked = !fail && stages_compiled;
        }
    }

    unsafe fn get_program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|program| program.linked)
    }

    unsafe fn get_program_info_log(&self, program: u32) -> String {
        if unsafe { self.get_program_link_status(program) } {
            String::new()
        } else {
            "error: linking failed".to_owned()
        }
    }

    unsafe fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        state.deleted_programs.push(program);
    }

    unsafe fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    unsafe fn get_uniform_location(&self, program: u32, name: &str) -> Option<String> {
        if !unsafe { self.get_program_link_status(program) } {
            return None;
        }
        let declared = self.declared_uniforms.borrow();
        match declared.as_ref() {
            Some(names) if !names.contains(name) => None,
            _ => Some(name.to_owned()),
        }
    }

    unsafe fn uniform_1_i32(&self, location: &String, x: i32) {
        self.write_uniform(location, Value::Int(x));
    }

    unsafe fn uniform_1_f32(&self, location: &String, x: f32) {
        self.write_uniform(location, Value::Float(x));
    }

    unsafe fn uniform_2_f32(&self, location: &String, x: f32, y: f32) {
        self.write_uniform(location, Value::Vec2([x, y]));
    }

    unsafe fn uniform_3_f32(&self, location: &String, x: f32, y: f32, z: f32) {
        self.write_uniform(location, Value::Vec3([x, y, z]));
    }

    unsafe fn uniform_4_f32(&self, location: &String, x: f32, y: f32, z: f32, w: f32) {
        self.write_uniform(location, Value::Vec4([x, y, z, w]));
    }

    unsafe fn uniform_matrix_4_f32(&self, location: &String, columns: &[f32; 16]) {
        self.write_uniform(location, Value::Mat4(*columns));
    }

    unsafe fn draw_elements_instanced(&self, mode: u32, count: i32, offset: i32, instances: i32) {
        self.record(Call::Draw {
            mode,
            count,
            offset,
            instances,
        });
    }

    unsafe fn stencil_func(&self, func: u32, reference: i32, mask: u32) {
        self.record(Call::StencilFunc {
            func,
            reference,
            mask,
        });
    }

    unsafe fn stencil_op(&self, stencil_fail: u32, depth_fail: u32, pass: u32) {
        self.record(Call::StencilOp {
            fail: stencil_fail,
            depth_fail,
            pass,
        });
    }
}
