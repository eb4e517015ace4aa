//! Null Backend
//!
//! A headless [`GpuDevice`] / [`GpuContext`] pair that records commands
//! instead of executing them. It backs the integration tests and lets the
//! orchestrator run on machines without a GPU (CI, dedicated servers).
//!
//! Besides the raw command log the context keeps a coarse *content tag* per
//! texture: cleared to a constant, copied from another texture, or touched by
//! a draw. That is enough to assert end-to-end properties like "an empty
//! scene produces the background color at the output" without emulating
//! shading.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::{RenderError, Result};
use crate::list::draw_call::InstanceData;

use super::{
    DeviceLimits, GeometryHandle, GpuContext, GpuDevice, MaterialHandle, ProgramHandle,
    TextureDesc, TextureHandle, TextureView, Viewport,
};

// ─── Device ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct DeviceState {
    next_texture: u32,
    next_program: u32,
    textures: FxHashMap<TextureHandle, TextureDesc>,
    programs: FxHashMap<ProgramHandle, &'static str>,
    pending_programs: FxHashSet<ProgramHandle>,
    failing_programs: FxHashSet<&'static str>,
    missing_materials: FxHashSet<MaterialHandle>,
    missing_geometries: FxHashSet<GeometryHandle>,
}

/// Headless device. All resource handles are plain counters.
pub struct NullDevice {
    state: Mutex<DeviceState>,
    limits: DeviceLimits,
}

impl NullDevice {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_limits(DeviceLimits::default())
    }

    /// Creates a device reporting the given capabilities (e.g. a device
    /// without instancing support).
    #[must_use]
    pub fn with_limits(limits: DeviceLimits) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DeviceState::default()),
            limits,
        })
    }

    /// Makes every future `create_program` call for `name` fail. Used to
    /// exercise the fatal pass-initialization path.
    pub fn fail_program(&self, name: &'static str) {
        self.state.lock().failing_programs.insert(name);
    }

    /// Looks up a created program by its source name.
    #[must_use]
    pub fn find_program(&self, name: &str) -> Option<ProgramHandle> {
        let state = self.state.lock();
        for (handle, program_name) in &state.programs {
            if *program_name == name {
                return Some(*handle);
            }
        }
        None
    }

    /// Marks a program as still compiling; `is_program_ready` reports false
    /// until [`finish_program`](Self::finish_program) is called.
    pub fn stall_program(&self, program: ProgramHandle) {
        self.state.lock().pending_programs.insert(program);
    }

    /// Completes a stalled program.
    pub fn finish_program(&self, program: ProgramHandle) {
        self.state.lock().pending_programs.remove(&program);
    }

    /// Marks a material as not resident; binding it fails.
    pub fn set_material_missing(&self, material: MaterialHandle, missing: bool) {
        let mut state = self.state.lock();
        if missing {
            state.missing_materials.insert(material);
        } else {
            state.missing_materials.remove(&material);
        }
    }

    /// Marks a geometry as not resident; binding it fails.
    pub fn set_geometry_missing(&self, geometry: GeometryHandle, missing: bool) {
        let mut state = self.state.lock();
        if missing {
            state.missing_geometries.insert(geometry);
        } else {
            state.missing_geometries.remove(&geometry);
        }
    }

    /// Number of currently alive textures.
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.state.lock().textures.len()
    }

    fn material_resident(&self, material: MaterialHandle) -> bool {
        !self.state.lock().missing_materials.contains(&material)
    }

    fn geometry_resident(&self, geometry: GeometryHandle) -> bool {
        !self.state.lock().missing_geometries.contains(&geometry)
    }
}

impl GpuDevice for NullDevice {
    fn create_texture(&self, desc: &TextureDesc, label: &'static str) -> Result<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::TextureCreateFailed {
                label,
                reason: "zero-sized texture".into(),
            });
        }
        if desc.width > self.limits.max_texture_size || desc.height > self.limits.max_texture_size {
            return Err(RenderError::TextureCreateFailed {
                label,
                reason: format!("exceeds max texture size {}", self.limits.max_texture_size),
            });
        }
        let mut state = self.state.lock();
        state.next_texture += 1;
        let handle = TextureHandle(state.next_texture);
        state.textures.insert(handle, *desc);
        Ok(handle)
    }

    fn destroy_texture(&self, texture: TextureHandle) {
        self.state.lock().textures.remove(&texture);
    }

    fn create_program(&self, name: &'static str) -> Result<ProgramHandle> {
        let mut state = self.state.lock();
        if state.failing_programs.contains(name) {
            return Err(RenderError::ProgramCreateFailed(name.to_string()));
        }
        state.next_program += 1;
        let handle = ProgramHandle(state.next_program);
        state.programs.insert(handle, name);
        Ok(handle)
    }

    fn is_program_ready(&self, program: ProgramHandle) -> bool {
        let state = self.state.lock();
        state.programs.contains_key(&program) && !state.pending_programs.contains(&program)
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }
}

// ─── Context ──────────────────────────────────────────────────────────────────

/// Coarse description of what a texture currently holds.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TextureContent {
    /// Never written this frame.
    Undefined,
    /// Cleared to (or copied from) a constant color.
    Uniform([f32; 4]),
    /// Written by at least one draw.
    Rendered,
}

/// One recorded command. The log is the ground truth for pipeline tests.
#[derive(Clone, PartialEq, Debug)]
pub enum Command {
    BeginGroup(&'static str),
    EndGroup,
    SetViewport(Viewport),
    SetRenderTargets {
        color: SmallVec<[TextureView; 4]>,
        depth: Option<TextureView>,
    },
    ResetRenderTargets,
    Clear {
        target: TextureView,
        color: [f32; 4],
    },
    ClearDepth {
        target: TextureView,
        depth: f32,
    },
    BindTexture {
        slot: u32,
        view: TextureView,
    },
    ResetTextures,
    BindProgram(ProgramHandle),
    SetUniforms {
        bytes: usize,
    },
    BindMaterial(MaterialHandle),
    BindGeometry(GeometryHandle),
    DrawInstanced {
        instance_count: u32,
    },
    DrawInstances {
        count: u32,
    },
    DrawFullscreen,
    Copy {
        dst: TextureView,
        src: TextureView,
    },
}

/// Recording context over a [`NullDevice`].
pub struct NullContext {
    device: Arc<NullDevice>,
    commands: Vec<Command>,
    bound_color: SmallVec<[TextureView; 4]>,
    bound_depth: Option<TextureView>,
    contents: FxHashMap<TextureHandle, TextureContent>,
}

impl NullContext {
    #[must_use]
    pub fn new(device: Arc<NullDevice>) -> Self {
        Self {
            device,
            commands: Vec::new(),
            bound_color: SmallVec::new(),
            bound_depth: None,
            contents: FxHashMap::default(),
        }
    }

    /// The full command log recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Names of all debug groups opened so far, in order. Each pipeline
    /// stage opens exactly one group, so this is the stage execution trace.
    #[must_use]
    pub fn group_trace(&self) -> Vec<&'static str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::BeginGroup(name) => Some(*name),
                _ => None,
            })
            .collect()
    }

    /// Total number of draw submissions (instanced, streamed and fullscreen).
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    Command::DrawInstanced { .. }
                        | Command::DrawInstances { .. }
                        | Command::DrawFullscreen
                )
            })
            .count()
    }

    /// Number of copy (blit) commands recorded.
    #[must_use]
    pub fn copy_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Copy { .. }))
            .count()
    }

    /// Content tag of a texture after the recorded commands.
    #[must_use]
    pub fn content(&self, view: TextureView) -> TextureContent {
        self.contents
            .get(&view.texture)
            .copied()
            .unwrap_or(TextureContent::Undefined)
    }

    /// Drops the recorded log, keeping texture contents.
    pub fn reset_log(&mut self) {
        self.commands.clear();
    }

    fn mark_targets_rendered(&mut self) {
        for view in &self.bound_color {
            self.contents.insert(view.texture, TextureContent::Rendered);
        }
    }
}

impl GpuContext for NullContext {
    fn clear_state(&mut self) {
        self.bound_color.clear();
        self.bound_depth = None;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport(viewport));
    }

    fn set_render_targets(&mut self, color: &[TextureView], depth: Option<TextureView>) {
        self.bound_color = SmallVec::from_slice(color);
        self.bound_depth = depth;
        self.commands.push(Command::SetRenderTargets {
            color: self.bound_color.clone(),
            depth,
        });
    }

    fn reset_render_targets(&mut self) {
        self.bound_color.clear();
        self.bound_depth = None;
        self.commands.push(Command::ResetRenderTargets);
    }

    fn clear(&mut self, target: TextureView, color: [f32; 4]) {
        self.contents
            .insert(target.texture, TextureContent::Uniform(color));
        self.commands.push(Command::Clear { target, color });
    }

    fn clear_depth(&mut self, target: TextureView, depth: f32) {
        self.commands.push(Command::ClearDepth { target, depth });
    }

    fn bind_texture(&mut self, slot: u32, view: TextureView) {
        self.commands.push(Command::BindTexture { slot, view });
    }

    fn reset_textures(&mut self) {
        self.commands.push(Command::ResetTextures);
    }

    fn bind_program(&mut self, program: ProgramHandle) {
        self.commands.push(Command::BindProgram(program));
    }

    fn set_uniforms(&mut self, data: &[u8]) {
        self.commands.push(Command::SetUniforms { bytes: data.len() });
    }

    fn bind_material(&mut self, material: MaterialHandle) -> bool {
        if !self.device.material_resident(material) {
            return false;
        }
        self.commands.push(Command::BindMaterial(material));
        true
    }

    fn bind_geometry(&mut self, geometry: GeometryHandle) -> bool {
        if !self.device.geometry_resident(geometry) {
            return false;
        }
        self.commands.push(Command::BindGeometry(geometry));
        true
    }

    fn draw_instanced(&mut self, instance_count: u32) {
        self.mark_targets_rendered();
        self.commands.push(Command::DrawInstanced { instance_count });
    }

    fn draw_instances(&mut self, instances: &[InstanceData]) {
        self.mark_targets_rendered();
        self.commands.push(Command::DrawInstances {
            count: instances.len() as u32,
        });
    }

    fn draw_fullscreen(&mut self) {
        self.mark_targets_rendered();
        self.commands.push(Command::DrawFullscreen);
    }

    fn copy(&mut self, dst: TextureView, src: TextureView) {
        let content = self.content(src);
        self.contents.insert(dst.texture, content);
        self.commands.push(Command::Copy { dst, src });
    }

    fn push_debug_group(&mut self, name: &'static str) {
        self.commands.push(Command::BeginGroup(name));
    }

    fn pop_debug_group(&mut self) {
        self.commands.push(Command::EndGroup);
    }
}
