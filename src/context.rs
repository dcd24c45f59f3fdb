//! The graphics-context boundary.
//!
//! [`GlContext`] names exactly the OpenGL calls the wrappers in this crate
//! issue, with the same associated-handle shape as [`glow::HasContext`]. The
//! only production implementation forwards to [`glow::Context`]; keeping the
//! surface this narrow lets the wrappers be exercised against a recording
//! context in tests.
//!
//! Arguments the wrappers never vary (mip level `0`, border `0`,
//! `UNSIGNED_BYTE` texels, `UNSIGNED_INT` indices, `FLOAT` attributes) are
//! fixed here rather than threaded through every call site.

use std::fmt;

use glow::{HasContext, PixelPackData, PixelUnpackData};

/// OpenGL calls required by the resource wrappers and the renderer.
///
/// # Safety
///
/// Every method requires the context to be current on the calling thread.
/// Handles passed in must have been created by the same context and not yet
/// deleted.
#[allow(clippy::missing_safety_doc)]
pub trait GlContext {
    /// Texture object name.
    type Texture: Copy + fmt::Debug + PartialEq;
    /// Framebuffer object name.
    type Framebuffer: Copy + fmt::Debug + PartialEq;
    /// Buffer object name (vertex or element storage).
    type Buffer: Copy + fmt::Debug + PartialEq;
    /// Vertex array object name.
    type VertexArray: Copy + fmt::Debug + PartialEq;
    /// Shader object name.
    type Shader: Copy + fmt::Debug + PartialEq;
    /// Program object name.
    type Program: Copy + fmt::Debug + PartialEq;
    /// Resolved uniform location inside a program.
    type UniformLocation: Clone + fmt::Debug;

    unsafe fn create_texture(&self) -> Result<Self::Texture, String>;
    unsafe fn delete_texture(&self, texture: Self::Texture);
    unsafe fn active_texture(&self, unit: u32);
    unsafe fn bind_texture(&self, target: u32, texture: Option<Self::Texture>);
    unsafe fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    unsafe fn pixel_store_i32(&self, parameter: u32, value: i32);
    /// Allocate level 0 of `target` with `format` as both internal and
    /// client format. `None` reserves storage without uploading.
    unsafe fn tex_image_2d(
        &self,
        target: u32,
        width: i32,
        height: i32,
        format: u32,
        pixels: Option<&[u8]>,
    );
    unsafe fn tex_sub_image_2d(
        &self,
        target: u32,
        offset: [i32; 2],
        size: [i32; 2],
        format: u32,
        pixels: &[u8],
    );
    unsafe fn get_tex_image(&self, target: u32, format: u32, pixels: &mut [u8]);

    unsafe fn create_framebuffer(&self) -> Result<Self::Framebuffer, String>;
    unsafe fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);
    unsafe fn bind_framebuffer(&self, target: u32, framebuffer: Option<Self::Framebuffer>);
    /// The framebuffer currently bound to `GL_FRAMEBUFFER`, `None` for the
    /// default one.
    unsafe fn framebuffer_binding(&self) -> Option<Self::Framebuffer>;
    unsafe fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: Option<Self::Texture>,
    );
    unsafe fn check_framebuffer_status(&self, target: u32) -> u32;
    unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32);
    unsafe fn clear(&self, mask: u32);

    unsafe fn create_buffer(&self) -> Result<Self::Buffer, String>;
    unsafe fn delete_buffer(&self, buffer: Self::Buffer);
    unsafe fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    unsafe fn buffer_data_size(&self, target: u32, size: i32, usage: u32);
    unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32);
    unsafe fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, data: &[u8]);

    unsafe fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    unsafe fn enable_vertex_attrib_array(&self, index: u32);
    /// Describe a float attribute; `stride` and `offset` are in bytes.
    unsafe fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32);

    unsafe fn create_shader(&self, stage: u32) -> Result<Self::Shader, String>;
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str);
    unsafe fn compile_shader(&self, shader: Self::Shader);
    unsafe fn get_shader_compile_status(&self, shader: Self::Shader) -> bool;
    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    unsafe fn delete_shader(&self, shader: Self::Shader);
    unsafe fn create_program(&self) -> Result<Self::Program, String>;
    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn link_program(&self, program: Self::Program);
    unsafe fn get_program_link_status(&self, program: Self::Program) -> bool;
    unsafe fn get_program_info_log(&self, program: Self::Program) -> String;
    unsafe fn delete_program(&self, program: Self::Program);
    unsafe fn use_program(&self, program: Option<Self::Program>);

    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    unsafe fn uniform_1_i32(&self, location: &Self::UniformLocation, x: i32);
    unsafe fn uniform_1_f32(&self, location: &Self::UniformLocation, x: f32);
    unsafe fn uniform_2_f32(&self, location: &Self::UniformLocation, x: f32, y: f32);
    unsafe fn uniform_3_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32);
    unsafe fn uniform_4_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32, w: f32);
    /// Column-major 4x4 matrix.
    unsafe fn uniform_matrix_4_f32(&self, location: &Self::UniformLocation, columns: &[f32; 16]);

    /// Indexed draw over `UNSIGNED_INT` indices; `offset` is in bytes.
    unsafe fn draw_elements_instanced(&self, mode: u32, count: i32, offset: i32, instances: i32);
    unsafe fn stencil_func(&self, func: u32, reference: i32, mask: u32);
    unsafe fn stencil_op(&self, stencil_fail: u32, depth_fail: u32, pass: u32);
}

/// Convert a `u32`/`usize` size to the `i32` GL entry points expect.
///
/// # Panics
///
/// Panics if `value > i32::MAX`. In practice this is unreachable for texture
/// dimensions, buffer sizes and index counts.
pub(crate) fn gl_size<T: TryInto<i32>>(value: T) -> i32 {
    value
        .try_into()
        .unwrap_or_else(|_| panic!("size exceeds i32::MAX"))
}

/// Internal formats are passed to `glTexImage2D` as `GLint`.
#[expect(clippy::cast_possible_wrap)]
fn internal_format(format: u32) -> i32 {
    // GL enum values are far below i32::MAX.
    format as i32
}

impl GlContext for glow::Context {
    type Texture = glow::Texture;
    type Framebuffer = glow::Framebuffer;
    type Buffer = glow::Buffer;
    type VertexArray = glow::VertexArray;
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    unsafe fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    unsafe fn delete_texture(&self, texture: Self::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    unsafe fn active_texture(&self, unit: u32) {
        unsafe { HasContext::active_texture(self, unit) }
    }

    unsafe fn bind_texture(&self, target: u32, texture: Option<Self::Texture>) {
        unsafe { HasContext::bind_texture(self, target, texture) }
    }

    unsafe fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { HasContext::tex_parameter_i32(self, target, parameter, value) }
    }

    unsafe fn pixel_store_i32(&self, parameter: u32, value: i32) {
        unsafe { HasContext::pixel_store_i32(self, parameter, value) }
    }

    unsafe fn tex_image_2d(
        &self,
        target: u32,
        width: i32,
        height: i32,
        format: u32,
        pixels: Option<&[u8]>,
    ) {
        unsafe {
            HasContext::tex_image_2d(
                self,
                target,
                0,
                internal_format(format),
                width,
                height,
                0,
                format,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(pixels),
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
        unsafe {
            HasContext::tex_sub_image_2d(
                self,
                target,
                0,
                x,
                y,
                width,
                height,
                format,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    unsafe fn get_tex_image(&self, target: u32, format: u32, pixels: &mut [u8]) {
        unsafe {
            HasContext::get_tex_image(
                self,
                target,
                0,
                format,
                glow::UNSIGNED_BYTE,
                PixelPackData::Slice(Some(pixels)),
            );
        }
    }

    unsafe fn create_framebuffer(&self) -> Result<Self::Framebuffer, String> {
        unsafe { HasContext::create_framebuffer(self) }
    }

    unsafe fn delete_framebuffer(&self, framebuffer: Self::Framebuffer) {
        unsafe { HasContext::delete_framebuffer(self, framebuffer) }
    }

    unsafe fn bind_framebuffer(&self, target: u32, framebuffer: Option<Self::Framebuffer>) {
        unsafe { HasContext::bind_framebuffer(self, target, framebuffer) }
    }

    unsafe fn framebuffer_binding(&self) -> Option<Self::Framebuffer> {
        unsafe { HasContext::get_parameter_framebuffer(self, glow::FRAMEBUFFER_BINDING) }
    }

    unsafe fn framebuffer_texture_2d(
        &self,
        target: u32,
        attachment: u32,
        texture_target: u32,
        texture: Option<Self::Texture>,
    ) {
        unsafe {
            HasContext::framebuffer_texture_2d(
                self,
                target,
                attachment,
                texture_target,
                texture,
                0,
            );
        }
    }

    unsafe fn check_framebuffer_status(&self, target: u32) -> u32 {
        unsafe { HasContext::check_framebuffer_status(self, target) }
    }

    unsafe fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        unsafe { HasContext::clear_color(self, red, green, blue, alpha) }
    }

    unsafe fn clear(&self, mask: u32) {
        unsafe { HasContext::clear(self, mask) }
    }

    unsafe fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    unsafe fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    unsafe fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target, buffer) }
    }

    unsafe fn buffer_data_size(&self, target: u32, size: i32, usage: u32) {
        unsafe { HasContext::buffer_data_size(self, target, size, usage) }
    }

    unsafe fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { HasContext::buffer_data_u8_slice(self, target, data, usage) }
    }

    unsafe fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, data: &[u8]) {
        unsafe { HasContext::buffer_sub_data_u8_slice(self, target, offset, data) }
    }

    unsafe fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    unsafe fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    unsafe fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(
                self,
                index,
                size,
                glow::FLOAT,
                false,
                stride,
                offset,
            );
        }
    }

    unsafe fn create_shader(&self, stage: u32) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, stage) }
    }

    unsafe fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    unsafe fn compile_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    unsafe fn get_shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    unsafe fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    unsafe fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    unsafe fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    unsafe fn get_program_link_status(&self, program: Self::Program) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    unsafe fn get_program_info_log(&self, program: Self::Program) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    unsafe fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    unsafe fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    unsafe fn uniform_1_i32(&self, location: &Self::UniformLocation, x: i32) {
        unsafe { HasContext::uniform_1_i32(self, Some(location), x) }
    }

    unsafe fn uniform_1_f32(&self, location: &Self::UniformLocation, x: f32) {
        unsafe { HasContext::uniform_1_f32(self, Some(location), x) }
    }

    unsafe fn uniform_2_f32(&self, location: &Self::UniformLocation, x: f32, y: f32) {
        unsafe { HasContext::uniform_2_f32(self, Some(location), x, y) }
    }

    unsafe fn uniform_3_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32) {
        unsafe { HasContext::uniform_3_f32(self, Some(location), x, y, z) }
    }

    unsafe fn uniform_4_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        unsafe { HasContext::uniform_4_f32(self, Some(location), x, y, z, w) }
    }

    unsafe fn uniform_matrix_4_f32(&self, location: &Self::UniformLocation, columns: &[f32; 16]) {
        unsafe { HasContext::uniform_matrix_4_f32_slice(self, Some(location), false, columns) }
    }

    unsafe fn draw_elements_instanced(&self, mode: u32, count: i32, offset: i32, instances: i32) {
        unsafe {
            HasContext::draw_elements_instanced(
                self,
                mode,
                count,
                glow::UNSIGNED_INT,
                offset,
                instances,
            );
        }
    }

    unsafe fn stencil_func(&self, func: u32, reference: i32, mask: u32) {
        unsafe { HasContext::stencil_func(self, func, reference, mask) }
    }

    unsafe fn stencil_op(&self, stencil_fail: u32, depth_fail: u32, pass: u32) {
        unsafe { HasContext::stencil_op(self, stencil_fail, depth_fail, pass) }
    }
}
