//! Force Layout - WASM Module
//!
//! Force-directed layout kernels for graph visualization, compiled to
//! WebAssembly and exposed to JavaScript via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: node ids, ingest records, and id-based link resolution (petgraph)
//! - `spatial`: Barnes–Hut quadtree and R-tree hit testing
//! - `forces`: many-body, link, collision, axis and center forces
//! - `sim`: alpha cooling, integration, and deterministic placement
//! - `kernel`: the `EngineAdapter` trait with reference and performant kernels
//! - `scene`: eased transitions between named node-position scenes

use js_sys::{Float64Array, Function};
use wasm_bindgen::prelude::*;

pub mod error;
pub mod forces;
pub mod graph;
pub mod kernel;
pub mod scene;
pub mod sim;
pub mod spatial;

use forces::ForceParams;
use graph::{LinkSpec, NodeId, NodeSpec};
use kernel::{EngineAdapter, EngineBuilder, FallbackPolicy, KernelKind, TickEvent};
use sim::{AlphaSchedule, SimulationConfig};
use spatial::PositionIndex;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Force layout handle exposed to JavaScript.
///
/// Wraps one kernel chosen at construction time.
#[wasm_bindgen]
pub struct ForceLayoutWasm {
    engine: Box<dyn EngineAdapter>,
    index: PositionIndex,
}

#[wasm_bindgen]
impl ForceLayoutWasm {
    /// Create a layout backed by the named kernel.
    ///
    /// # Arguments
    ///
    /// * `kind` - `"reference"` or `"performant"`
    /// * `config` - Optional `SimulationConfig` object; defaults when undefined
    /// * `fallback` - If true, a performant kernel that fails to initialize is
    ///   replaced by the reference kernel instead of throwing
    #[wasm_bindgen(constructor)]
    pub fn new(kind: &str, config: JsValue, fallback: Option<bool>) -> Result<ForceLayoutWasm, JsError> {
        let kind: KernelKind = kind.parse()?;
        let config: SimulationConfig = if config.is_undefined() || config.is_null() {
            SimulationConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let policy = if fallback.unwrap_or(false) {
            FallbackPolicy::Reference
        } else {
            FallbackPolicy::FailFast
        };

        let engine = EngineBuilder::new(kind)
            .fallback(policy)
            .config(config)
            .build()?;
        if engine.kind() != kind {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "{kind} kernel unavailable, using {}",
                engine.kind()
            )));
        }
        Ok(Self {
            engine,
            index: PositionIndex::default(),
        })
    }

    /// Name of the kernel actually in use.
    #[wasm_bindgen(getter)]
    pub fn kernel(&self) -> String {
        self.engine.kind().to_string()
    }

    // =========================================================================
    // Ingest
    // =========================================================================

    /// Replace the node set from an array of `{id, x?, y?, fx?, fy?, radius?}`.
    ///
    /// Returns the number of links dropped because an endpoint disappeared.
    #[wasm_bindgen(js_name = setNodes)]
    pub fn set_nodes(&mut self, nodes: JsValue) -> Result<u32, JsError> {
        let nodes: Vec<NodeSpec> = serde_wasm_bindgen::from_value(nodes)?;
        let pruned = self.engine.set_nodes(&nodes)?;
        Ok(pruned as u32)
    }

    /// Replace the link set from an array of `{source, target, distance?, strength?}`.
    #[wasm_bindgen(js_name = setLinks)]
    pub fn set_links(&mut self, links: JsValue) -> Result<(), JsError> {
        let links: Vec<LinkSpec> = serde_wasm_bindgen::from_value(links)?;
        Ok(self.engine.set_links(&links)?)
    }

    /// Replace a force's parameters; `params` is tagged by `kind`.
    #[wasm_bindgen(js_name = configureForce)]
    pub fn configure_force(&mut self, name: &str, params: JsValue) -> Result<(), JsError> {
        let params: ForceParams = serde_wasm_bindgen::from_value(params)?;
        Ok(self.engine.configure_force(name, params)?)
    }

    /// Register an additional named force.
    #[wasm_bindgen(js_name = registerForce)]
    pub fn register_force(&mut self, name: &str, params: JsValue, enabled: bool) -> Result<(), JsError> {
        let params: ForceParams = serde_wasm_bindgen::from_value(params)?;
        Ok(self.engine.register_force(name, params, enabled)?)
    }

    #[wasm_bindgen(js_name = enableForce)]
    pub fn enable_force(&mut self, name: &str, enabled: bool) -> Result<(), JsError> {
        Ok(self.engine.enable_force(name, enabled)?)
    }

    #[wasm_bindgen(js_name = setAlphaSchedule)]
    pub fn set_alpha_schedule(&mut self, schedule: JsValue) -> Result<(), JsError> {
        let schedule: AlphaSchedule = serde_wasm_bindgen::from_value(schedule)?;
        Ok(self.engine.set_alpha_schedule(schedule)?)
    }

    #[wasm_bindgen(js_name = setVelocityDecay)]
    pub fn set_velocity_decay(&mut self, decay: f64) -> Result<(), JsError> {
        Ok(self.engine.set_velocity_decay(decay)?)
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advance exactly `n` steps and return `{ticks, alpha, converged}`.
    pub fn tick(&mut self, n: u32) -> Result<JsValue, JsError> {
        let report = self.engine.tick(n)?;
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    pub fn pin(&mut self, id: u32, x: f64, y: f64) -> Result<(), JsError> {
        Ok(self.engine.pin(NodeId(id), x, y)?)
    }

    pub fn unpin(&mut self, id: u32) -> Result<(), JsError> {
        Ok(self.engine.unpin(NodeId(id))?)
    }

    pub fn reheat(&mut self, alpha: f64) -> Result<(), JsError> {
        Ok(self.engine.reheat(alpha)?)
    }

    pub fn alpha(&self) -> Result<f64, JsError> {
        Ok(self.engine.alpha()?)
    }

    #[wasm_bindgen(js_name = isConverged)]
    pub fn is_converged(&self) -> Result<bool, JsError> {
        Ok(self.engine.is_converged()?)
    }

    /// Call `callback(tick, alpha)` after every step; pass undefined to clear.
    #[wasm_bindgen(js_name = setTickCallback)]
    pub fn set_tick_callback(&mut self, callback: Option<Function>) -> Result<(), JsError> {
        let observer = callback.map(|callback| {
            Box::new(move |event: &TickEvent| {
                let tick = JsValue::from_f64(event.tick as f64);
                let alpha = JsValue::from_f64(event.alpha);
                if let Err(err) = callback.call2(&JsValue::NULL, &tick, &alpha) {
                    web_sys::console::error_1(&err);
                }
            }) as kernel::TickObserver
        });
        Ok(self.engine.set_tick_observer(observer)?)
    }

    // =========================================================================
    // Egress
    // =========================================================================

    /// Snapshot of positions as a `Map<id, {x, y}>`.
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.engine.positions()?)?)
    }

    /// Snapshot of velocities as a `Map<id, {x, y}>`.
    #[wasm_bindgen(js_name = getVelocities)]
    pub fn get_velocities(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&self.engine.velocities()?)?)
    }

    /// Get a zero-copy view of interleaved positions `[x0, y0, x1, y1, ...]`.
    ///
    /// Undefined for kernels without an egress buffer. Pair with
    /// `getSlotIds` to map slots to ids.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated by any mutating call or Rust
    /// allocation. Use immediately, do not store.
    #[wasm_bindgen(js_name = getPositionsView)]
    pub fn get_positions_view(&self) -> Result<Option<Float64Array>, JsError> {
        Ok(self
            .engine
            .position_buffer()?
            .map(|buffer| unsafe { Float64Array::view(buffer.xy) }))
    }

    /// Node id of each slot in `getPositionsView`.
    #[wasm_bindgen(js_name = getSlotIds)]
    pub fn get_slot_ids(&self) -> Result<Option<Vec<u32>>, JsError> {
        Ok(self
            .engine
            .position_buffer()?
            .map(|buffer| buffer.ids.iter().map(|id| id.raw()).collect()))
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> Result<u32, JsError> {
        Ok(self.engine.node_count()? as u32)
    }

    #[wasm_bindgen(js_name = linkCount)]
    pub fn link_count(&self) -> Result<u32, JsError> {
        Ok(self.engine.link_count()? as u32)
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Rebuild the hit-testing index from current positions.
    ///
    /// Call this after ticking for accurate spatial queries.
    #[wasm_bindgen(js_name = rebuildSpatialIndex)]
    pub fn rebuild_spatial_index(&mut self) -> Result<(), JsError> {
        self.index = PositionIndex::from_positions(&self.engine.positions()?);
        Ok(())
    }

    /// Find the nearest node to a point.
    ///
    /// Returns the node ID, or None if the index is empty.
    #[wasm_bindgen(js_name = findNearestNode)]
    pub fn find_nearest_node(&self, x: f64, y: f64) -> Option<u32> {
        self.index.nearest(x, y).map(|id| id.raw())
    }

    /// Find the nearest node within a maximum distance.
    #[wasm_bindgen(js_name = findNearestNodeWithin)]
    pub fn find_nearest_node_within(&self, x: f64, y: f64, max_distance: f64) -> Option<u32> {
        self.index
            .nearest_within(x, y, max_distance)
            .map(|id| id.raw())
    }

    /// Find all nodes within a rectangular region.
    #[wasm_bindgen(js_name = findNodesInRect)]
    pub fn find_nodes_in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<u32> {
        self.index
            .in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(|id| id.raw())
            .collect()
    }

    /// Release kernel-owned buffers. Required before discarding a
    /// performant layout.
    pub fn dispose(&mut self) {
        self.engine.dispose();
        self.index = PositionIndex::default();
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn json(text: &str) -> JsValue {
        js_sys::JSON::parse(text).unwrap()
    }

    fn pair(kind: &str) -> ForceLayoutWasm {
        let mut layout = ForceLayoutWasm::new(kind, JsValue::UNDEFINED, None).unwrap();
        layout
            .set_nodes(json(r#"[{"id": 7, "x": 0, "y": 0}, {"id": 3, "x": 40, "y": 0}]"#))
            .unwrap();
        layout
            .set_links(json(r#"[{"source": 7, "target": 3}]"#))
            .unwrap();
        layout
    }

    #[wasm_bindgen_test]
    fn test_construct_and_ingest() {
        let layout = pair("performant");
        assert_eq!(layout.kernel(), "performant");
        assert_eq!(layout.node_count().unwrap(), 2);
        assert_eq!(layout.link_count().unwrap(), 1);
        assert!(ForceLayoutWasm::new("fast", JsValue::NULL, None).is_err());
    }

    #[wasm_bindgen_test]
    fn test_positions_view_after_tick() {
        let mut layout = pair("performant");
        layout.tick(10).unwrap();

        let view = layout.get_positions_view().unwrap().unwrap();
        assert_eq!(view.length(), 4);
        assert_eq!(layout.get_slot_ids().unwrap(), Some(vec![7, 3]));
        assert!(view.to_vec().iter().all(|v| v.is_finite()));
        layout.dispose();
        assert!(layout.tick(1).is_err());
    }

    #[wasm_bindgen_test]
    fn test_reference_has_no_view() {
        let mut layout = pair("reference");
        layout.tick(1).unwrap();
        assert!(layout.get_positions_view().unwrap().is_none());
        assert!(layout.get_slot_ids().unwrap().is_none());
    }

    #[wasm_bindgen_test]
    fn test_bad_link_and_hit_testing() {
        let mut layout = pair("reference");
        assert!(layout.set_links(json(r#"[{"source": 7, "target": 99}]"#)).is_err());
        assert_eq!(layout.link_count().unwrap(), 1);

        layout.pin(7, -10.0, 0.0).unwrap();
        layout.rebuild_spatial_index().unwrap();
        assert_eq!(layout.find_nearest_node(-9.0, 0.0), Some(7));
        assert_eq!(layout.find_nearest_node_within(-9.0, 0.0, 0.5), None);
    }
}
