// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Renderers.

use std::fmt;
use std::rc::Rc;

use lux_ore::warn_once;
use lux_repr::{
    ChannelMask, ElementKind, ObjectKind, PixelFilterKind, TextureFilter, TextureFormat, Vec2f,
    Vec3f, Vec4f,
};

use crate::filter::{filter_weight, filter_width};
use crate::framebuffer::{FrameBufferOps, FrameBufferState, TileBuffer};
use crate::object::{ObjectRef, Payload};
use crate::params::ParamMap;

/// The number of entries in the reconstruction-filter table built at commit.
const FILTER_TABLE_SIZE: usize = 17;

/// A hit reported by a sample kernel's pick query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelHit {
    /// Index of the hit geometry within the picked model.
    pub geometry_index: usize,
    /// The hit primitive within that geometry.
    pub primitive: u32,
    /// The hit position in world space.
    pub world_position: Vec3f,
}

/// A resolved pick result.
///
/// Both references are strong: the caller owns one reference to the model
/// and one to the geometry for as long as it holds the result.
#[derive(Debug)]
pub struct PickResult {
    /// The picked model.
    pub model: ObjectRef,
    /// The picked geometry within the model.
    pub geometry: ObjectRef,
    /// The picked primitive within the geometry.
    pub primitive: u32,
    /// The hit position in world space.
    pub world_position: Vec3f,
}

/// The sample-evaluation backend of a renderer.
///
/// Kernels are the boundary to the actual ray-tracing math, which is outside
/// the dispatch core: the core hands a kernel its committed derived state and
/// a tile, and observes only the tile contents (and, for picking, an optional
/// hit). Kernels may also intercept material and light creation for their
/// renderer, taking precedence over the global factory table.
pub trait SampleKernel: fmt::Debug {
    /// The kernel's type name.
    fn name(&self) -> &'static str;

    /// Renders one tile.
    fn render_tile(&self, derived: &RendererDerived, tile: &mut TileBuffer);

    /// Traces a single pick ray through the model at the given screen UV.
    fn pick(
        &self,
        _derived: &RendererDerived,
        _model: Option<&ObjectRef>,
        _uv: Vec2f,
    ) -> Option<KernelHit> {
        None
    }

    /// Creates a renderer-specific material, or `None` to defer to the
    /// global factory.
    fn create_material(&self, _type_name: &str) -> Option<Payload> {
        None
    }

    /// Creates a renderer-specific light, or `None` to defer to the global
    /// factory.
    fn create_light(&self, _type_name: &str) -> Option<Payload> {
        None
    }
}

/// Derived renderer state, materialized from the parameter bag at commit.
#[derive(Debug)]
pub struct RendererDerived {
    /// Samples per pixel; at least 1.
    pub pixel_samples: i32,
    /// Maximum ray path length; non-negative.
    pub max_path_length: i32,
    /// Sample contribution below which paths are terminated.
    pub min_contribution: f32,
    /// Frame variance below which adaptive refinement stops.
    pub variance_threshold: f32,
    /// The background color.
    pub background: Vec4f,
    /// The reconstruction filter.
    pub pixel_filter: PixelFilterKind,
    /// Tabulated filter profile over the support, built at commit.
    pub filter_table: Vec<f32>,
    /// Backplate texture, shown where rays miss the scene.
    pub backplate: Option<ObjectRef>,
    /// Single-channel float texture bounding ray depth per pixel.
    pub max_depth_texture: Option<ObjectRef>,
    /// Data array of materials indexed by geometry material IDs.
    pub materials: Option<ObjectRef>,
}

impl Default for RendererDerived {
    fn default() -> RendererDerived {
        RendererDerived {
            pixel_samples: 1,
            max_path_length: 20,
            min_contribution: 0.001,
            variance_threshold: 0.0,
            background: Vec4f::default(),
            pixel_filter: PixelFilterKind::default(),
            filter_table: Vec::new(),
            backplate: None,
            max_depth_texture: None,
            materials: None,
        }
    }
}

/// Kind-specific state for a renderer.
#[derive(Debug)]
pub struct RendererState {
    kernel: Box<dyn SampleKernel>,
    derived: RendererDerived,
}

impl RendererState {
    /// Creates a renderer around a sample kernel, with default derived
    /// state.
    pub fn new(kernel: Box<dyn SampleKernel>) -> RendererState {
        RendererState {
            kernel,
            derived: RendererDerived::default(),
        }
    }

    /// The committed derived state.
    pub fn derived(&self) -> &RendererDerived {
        &self.derived
    }

    /// Reads the recognized parameters, applying defaults and clamps.
    pub fn commit(&mut self, params: &ParamMap) {
        let d = &mut self.derived;
        d.pixel_samples = params.get_i32("pixelSamples").unwrap_or(1).max(1);
        d.max_path_length = params.get_i32("maxPathLength").unwrap_or(20).max(0);
        d.min_contribution = params.get_f32("minContribution").unwrap_or(0.001);
        d.variance_threshold = params.get_f32("varianceThreshold").unwrap_or(0.0);

        // `backgroundColor` may be supplied as a float, a vec3, or a vec4;
        // narrower forms widen with zero alpha.
        let bg3 = params.get_vec3f("backgroundColor").unwrap_or_else(|| {
            Vec3f::splat(params.get_f32("backgroundColor").unwrap_or(0.0))
        });
        d.background = params
            .get_vec4f("backgroundColor")
            .unwrap_or(Vec4f::from_vec3f(bg3, 0.0));

        d.backplate = params.get_object("map_backplate").cloned();
        d.max_depth_texture = params.get_object("map_maxDepth").cloned();
        if let Some(tex) = &d.max_depth_texture {
            let valid = match &tex.core().payload {
                Payload::Texture(t) => {
                    t.format() == TextureFormat::R32F && t.filter() == TextureFilter::Nearest
                }
                _ => false,
            };
            if !valid {
                warn_once!(
                    "map_maxDepth texture must be single-channel float with nearest filtering"
                );
            }
        }

        d.materials = match params.get_object("material") {
            Some(array) => {
                let is_material_data = array.kind() == ObjectKind::Data
                    && match &array.core().payload {
                        Payload::Data(data) => {
                            data.kind() == ElementKind::Object(ObjectKind::Material)
                        }
                        _ => false,
                    };
                if is_material_data {
                    Some(Rc::clone(array))
                } else {
                    warn_once!("renderer material parameter is not a material data array");
                    None
                }
            }
            None => None,
        };

        d.pixel_filter = params
            .get_i32("pixelFilter")
            .and_then(|code| u32::try_from(code).ok())
            .and_then(PixelFilterKind::from_code)
            .unwrap_or_default();
        d.filter_table = build_filter_table(d.pixel_filter);
    }

    /// Renders this rank's share of the frame into the framebuffer.
    ///
    /// Tiles are assigned round-robin across the `size` ranks of the worker
    /// group. Returns the frame variance estimate, which is non-negative.
    pub fn render_frame(
        &self,
        fb: &mut FrameBufferState,
        channels: ChannelMask,
        rank: usize,
        size: usize,
    ) -> f32 {
        debug_assert!(size > 0);
        fb.begin_frame(channels);
        for (index, origin) in fb.tile_origins().into_iter().enumerate() {
            if index % size != rank {
                continue;
            }
            let mut tile = TileBuffer::new(origin, fb.tile_size(origin));
            self.kernel.render_tile(&self.derived, &mut tile);
            fb.apply_tile(&mut tile, channels);
        }
        fb.frame_variance().max(0.0)
    }

    /// Traces a pick ray at the given screen UV against a model.
    ///
    /// Returns `None` when the UV lies outside the unit square, when there
    /// is no model, or when the kernel reports a miss. On a hit, the result
    /// carries strong references to the model and the hit geometry.
    pub fn pick(&self, model: Option<&ObjectRef>, uv: Vec2f) -> Option<PickResult> {
        if !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) {
            return None;
        }
        let model = model?;
        let hit = self.kernel.pick(&self.derived, Some(model), uv)?;
        let geometry = match &model.core().payload {
            Payload::Model(state) => state.geometry().get(hit.geometry_index).cloned()?,
            _ => return None,
        };
        Some(PickResult {
            model: Rc::clone(model),
            geometry,
            primitive: hit.primitive,
            world_position: hit.world_position,
        })
    }

    /// Asks the kernel for a renderer-specific material.
    pub fn create_material(&self, type_name: &str) -> Option<Payload> {
        self.kernel.create_material(type_name)
    }

    /// Asks the kernel for a renderer-specific light.
    pub fn create_light(&self, type_name: &str) -> Option<Payload> {
        self.kernel.create_light(type_name)
    }
}

/// Tabulates a filter profile uniformly over its support.
fn build_filter_table(kind: PixelFilterKind) -> Vec<f32> {
    let half = filter_width(kind) / 2.0;
    if half == 0.0 {
        return vec![1.0];
    }
    (0..FILTER_TABLE_SIZE)
        .map(|i| {
            let x = -half + filter_width(kind) * i as f32 / (FILTER_TABLE_SIZE - 1) as f32;
            filter_weight(kind, x)
        })
        .collect()
}

/// The built-in kernels: flat fills of the committed background color.
///
/// The actual sample-evaluation kernels live outside the dispatch core; the
/// built-ins exist so a cluster renders deterministic frames without loading
/// any module.
#[derive(Debug)]
struct FlatKernel {
    name: &'static str,
}

impl SampleKernel for FlatKernel {
    fn name(&self) -> &'static str {
        self.name
    }

    fn render_tile(&self, derived: &RendererDerived, tile: &mut TileBuffer) {
        tile.color.fill(derived.background);
    }
}

/// The `scivis` kernel.
pub(crate) fn scivis_kernel() -> Box<dyn SampleKernel> {
    Box::new(FlatKernel { name: "scivis" })
}

/// The `pathtracer` kernel.
pub(crate) fn pathtracer_kernel() -> Box<dyn SampleKernel> {
    Box::new(FlatKernel { name: "pathtracer" })
}

#[cfg(test)]
mod tests {
    use lux_repr::{FrameBufferFormat, Vec2i};

    use super::*;
    use crate::params::StoredParam;

    fn committed(params: &ParamMap) -> RendererState {
        let mut renderer = RendererState::new(scivis_kernel());
        renderer.commit(params);
        renderer
    }

    #[test]
    fn test_commit_defaults() {
        let renderer = committed(&ParamMap::new());
        let d = renderer.derived();
        assert_eq!(d.pixel_samples, 1);
        assert_eq!(d.max_path_length, 20);
        assert_eq!(d.min_contribution, 0.001);
        assert_eq!(d.variance_threshold, 0.0);
        assert_eq!(d.background, Vec4f::default());
        assert_eq!(d.pixel_filter, PixelFilterKind::Gauss);
        assert_eq!(d.filter_table.len(), 17);
    }

    #[test]
    fn test_commit_clamps_samples_and_depth() {
        let mut params = ParamMap::new();
        params.set("pixelSamples", StoredParam::Int(-3));
        params.set("maxPathLength", StoredParam::Int(-1));
        let renderer = committed(&params);
        assert_eq!(renderer.derived().pixel_samples, 1);
        assert_eq!(renderer.derived().max_path_length, 0);
    }

    #[test]
    fn test_commit_is_invariant_under_repeated_set() {
        let mut params = ParamMap::new();
        params.set("pixelSamples", StoredParam::Int(8));
        let mut renderer = committed(&params);
        let first = renderer.derived().pixel_samples;

        params.set("pixelSamples", StoredParam::Int(8));
        renderer.commit(&params);
        assert_eq!(renderer.derived().pixel_samples, first);
    }

    #[test]
    fn test_background_color_widening() {
        let mut params = ParamMap::new();
        params.set("backgroundColor", StoredParam::Float(0.5));
        let renderer = committed(&params);
        assert_eq!(renderer.derived().background, Vec4f::new(0.5, 0.5, 0.5, 0.0));

        let mut params = ParamMap::new();
        params.set("backgroundColor", StoredParam::Vec3f(Vec3f::new(1.0, 0.0, 0.0)));
        let renderer = committed(&params);
        assert_eq!(renderer.derived().background, Vec4f::new(1.0, 0.0, 0.0, 0.0));

        let mut params = ParamMap::new();
        params.set(
            "backgroundColor",
            StoredParam::Vec4f(Vec4f::new(0.0, 1.0, 0.0, 1.0)),
        );
        let renderer = committed(&params);
        assert_eq!(renderer.derived().background, Vec4f::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_unknown_pixel_filter_falls_back_to_gauss() {
        let mut params = ParamMap::new();
        params.set("pixelFilter", StoredParam::Int(99));
        let renderer = committed(&params);
        assert_eq!(renderer.derived().pixel_filter, PixelFilterKind::Gauss);

        let mut params = ParamMap::new();
        params.set(
            "pixelFilter",
            StoredParam::Int(PixelFilterKind::Mitchell.code() as i32),
        );
        let renderer = committed(&params);
        assert_eq!(renderer.derived().pixel_filter, PixelFilterKind::Mitchell);
    }

    #[test]
    fn test_render_frame_fills_owned_tiles() {
        let mut params = ParamMap::new();
        params.set(
            "backgroundColor",
            StoredParam::Vec4f(Vec4f::new(0.25, 0.5, 0.75, 1.0)),
        );
        let renderer = committed(&params);
        let mut fb = FrameBufferState::new(
            Vec2i::new(4, 4),
            FrameBufferFormat::Rgba8,
            ChannelMask::COLOR,
        )
        .unwrap();

        // A single rank owns every tile.
        let variance = renderer.render_frame(&mut fb, ChannelMask::COLOR, 0, 1);
        assert!(variance >= 0.0);
        assert!(fb
            .color()
            .iter()
            .all(|c| *c == Vec4f::new(0.25, 0.5, 0.75, 1.0)));
    }

    #[test]
    fn test_pick_out_of_bounds_misses() {
        let renderer = committed(&ParamMap::new());
        assert!(renderer.pick(None, Vec2f::new(0.5, 0.5)).is_none());
        assert!(renderer.pick(None, Vec2f::new(1.5, 0.5)).is_none());
    }

    #[test]
    fn test_pick_hit_owns_strong_references() {
        use crate::model::{GeometryState, ModelState};
        use crate::object::SceneObject;

        #[derive(Debug)]
        struct HitKernel;

        impl SampleKernel for HitKernel {
            fn name(&self) -> &'static str {
                "hit"
            }

            fn render_tile(&self, _derived: &RendererDerived, _tile: &mut TileBuffer) {}

            fn pick(
                &self,
                _derived: &RendererDerived,
                _model: Option<&ObjectRef>,
                _uv: Vec2f,
            ) -> Option<KernelHit> {
                Some(KernelHit {
                    geometry_index: 0,
                    primitive: 7,
                    world_position: Vec3f::new(1.0, 2.0, 3.0),
                })
            }
        }

        let geometry = SceneObject::new(
            ObjectKind::Geometry,
            "spheres",
            Payload::Geometry(GeometryState::default()),
        );
        let mut model_state = ModelState::default();
        model_state.add_geometry(Rc::clone(&geometry));
        let model = SceneObject::new(ObjectKind::Model, "model", Payload::Model(model_state));

        let renderer = RendererState::new(Box::new(HitKernel));
        let model_count = Rc::strong_count(&model);
        let geometry_count = Rc::strong_count(&geometry);

        let result = renderer.pick(Some(&model), Vec2f::new(0.5, 0.5)).unwrap();
        assert_eq!(result.primitive, 7);
        assert_eq!(result.world_position, Vec3f::new(1.0, 2.0, 3.0));
        assert!(Rc::ptr_eq(&result.geometry, &geometry));
        // The result holds one strong reference to each.
        assert_eq!(Rc::strong_count(&model), model_count + 1);
        assert_eq!(Rc::strong_count(&geometry), geometry_count + 1);

        drop(result);
        assert_eq!(Rc::strong_count(&model), model_count);
        assert_eq!(Rc::strong_count(&geometry), geometry_count);
    }
}
