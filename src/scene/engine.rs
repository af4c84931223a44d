//! Scene transition state machine.
//!
//! The engine is `Steady(scene)` or `Transitioning(from, to, progress)`.
//! `transition_to` captures the currently rendered positions, activates the
//! new scene's rules in the kernel, and eases every node from its captured
//! position toward its rule-driven target over wall-clock time. Calling it
//! again mid-transition re-captures the interpolated positions and starts a
//! fresh transition; the in-flight easing is abandoned, never blended.

use std::collections::HashMap;

use super::{Easing, NodeRule, SceneConfig};
use crate::error::{self, ConfigurationError, Result};
use crate::graph::{LinkSpec, NodeSpec, Positions};
use crate::kernel::EngineAdapter;

/// When simulated targets are read from the kernel during a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSampling {
    /// Read the kernel every frame.
    #[default]
    Live,
    /// Run the kernel toward convergence when the transition starts (at most
    /// `max_ticks` steps) and ease toward those settled positions.
    Settled { max_ticks: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionOptions {
    pub duration_ms: f64,
    pub easing: Easing,
    pub sampling: TargetSampling,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            duration_ms: 750.0,
            easing: Easing::default(),
            sampling: TargetSampling::Live,
        }
    }
}

/// An animating transition. Dropped when progress reaches 1.
#[derive(Debug, Clone)]
pub struct TransitionState {
    pub from: String,
    pub to: String,
    /// Rendered positions at the moment the transition began.
    pub snapshot: Positions,
    pub started_at: f64,
    pub duration: f64,
    /// Linear progress as of the last frame.
    pub progress: f64,
    pub easing: Easing,
    settled: Option<Positions>,
}

impl TransitionState {
    fn progress_at(&self, now_ms: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_at) / self.duration).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase<'a> {
    Steady(&'a str),
    Transitioning { from: &'a str, to: &'a str, progress: f64 },
}

/// Orchestrates named scenes over any [`EngineAdapter`].
pub struct SceneEngine {
    engine: Box<dyn EngineAdapter>,
    links: Vec<LinkSpec>,
    scenes: HashMap<String, SceneConfig>,
    external: Positions,
    /// Scene whose rules are active; the destination while transitioning.
    active: String,
    transition: Option<TransitionState>,
    rendered: Positions,
}

impl std::fmt::Debug for SceneEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneEngine")
            .field("kernel", &self.engine.kind())
            .field("scenes", &self.scenes.len())
            .field("active", &self.active)
            .field("transitioning", &self.transition.is_some())
            .finish()
    }
}

impl SceneEngine {
    /// Wrap `engine` and activate `initial` immediately.
    pub fn new(
        engine: Box<dyn EngineAdapter>,
        links: Vec<LinkSpec>,
        initial: SceneConfig,
    ) -> Result<Self> {
        initial.validate()?;
        let name = initial.name.clone();
        let mut scene_engine = Self {
            engine,
            links,
            scenes: HashMap::new(),
            external: Positions::new(),
            active: name.clone(),
            transition: None,
            rendered: Positions::new(),
        };
        scene_engine.scenes.insert(name.clone(), initial);
        scene_engine.activate(&name, &Positions::new())?;
        let kernel = scene_engine.engine.positions()?;
        scene_engine.rendered = scene_engine.targets(&name, &kernel, None, &Positions::new());
        Ok(scene_engine)
    }

    pub fn register_scene(&mut self, scene: SceneConfig) -> Result<()> {
        if self.scenes.contains_key(&scene.name) {
            return Err(ConfigurationError::DuplicateScene(scene.name).into());
        }
        scene.validate()?;
        self.scenes.insert(scene.name.clone(), scene);
        Ok(())
    }

    /// Merge host-supplied positions for nodes under the `External` rule.
    pub fn set_external_positions(&mut self, positions: Positions) {
        self.external.extend(positions);
    }

    /// Replace the link set; only links between simulated nodes reach the kernel.
    pub fn set_links(&mut self, links: Vec<LinkSpec>) -> Result<()> {
        let scene = self.scene(&self.active)?;
        let filtered = simulated_links(scene, &links);
        self.engine.set_links(&filtered)?;
        self.links = links;
        Ok(())
    }

    /// Begin easing toward `name`.
    ///
    /// A zero duration commits immediately.
    pub fn transition_to(&mut self, name: &str, now_ms: f64, options: TransitionOptions) -> Result<()> {
        self.scene(name)?;
        let duration = error::non_negative("durationMs", options.duration_ms)?;

        let kernel = self.engine.positions()?;
        let snapshot = self.render(now_ms, &kernel);

        self.activate(name, &snapshot)?;
        let from = std::mem::replace(&mut self.active, name.to_string());

        let settled = match options.sampling {
            TargetSampling::Live => None,
            TargetSampling::Settled { max_ticks } => Some(self.settle(max_ticks)?),
        };

        if duration == 0.0 {
            self.transition = None;
            let kernel = self.engine.positions()?;
            self.rendered = self.targets(name, &kernel, None, &snapshot);
            log::debug!("scene {name} committed");
            return Ok(());
        }

        if let Some(abandoned) = &self.transition {
            log::debug!(
                "transition {} -> {} abandoned at {:.3}",
                abandoned.from,
                abandoned.to,
                abandoned.progress_at(now_ms)
            );
        }
        self.transition = Some(TransitionState {
            from,
            to: name.to_string(),
            snapshot,
            started_at: now_ms,
            duration,
            progress: 0.0,
            easing: options.easing,
            settled,
        });
        Ok(())
    }

    /// Advance the kernel by `ticks` and return rendered positions at `now_ms`.
    pub fn frame(&mut self, now_ms: f64, ticks: u32) -> Result<Positions> {
        if ticks > 0 {
            self.engine.tick(ticks)?;
        }
        let kernel = self.engine.positions()?;
        let rendered = self.render(now_ms, &kernel);

        if let Some(transition) = &mut self.transition {
            transition.progress = transition.progress_at(now_ms);
            if transition.progress >= 1.0 {
                log::debug!("scene {} committed", transition.to);
                self.transition = None;
            }
        }
        self.rendered = rendered.clone();
        Ok(rendered)
    }

    pub fn phase(&self) -> Phase<'_> {
        match &self.transition {
            Some(t) => Phase::Transitioning {
                from: &t.from,
                to: &t.to,
                progress: t.progress,
            },
            None => Phase::Steady(&self.active),
        }
    }

    pub fn transition(&self) -> Option<&TransitionState> {
        self.transition.as_ref()
    }

    /// The scene whose rules are active; the destination while transitioning.
    pub fn current_scene(&self) -> &str {
        &self.active
    }

    /// Positions returned by the last frame.
    pub fn rendered(&self) -> &Positions {
        &self.rendered
    }

    pub fn engine(&self) -> &dyn EngineAdapter {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> &mut dyn EngineAdapter {
        self.engine.as_mut()
    }

    /// Release the kernel.
    pub fn dispose(&mut self) {
        self.engine.dispose();
    }

    fn scene(&self, name: &str) -> Result<&SceneConfig> {
        self.scenes
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownScene(name.to_string()).into())
    }

    /// Point the kernel at `name`'s simulated nodes, links, and forces.
    fn activate(&mut self, name: &str, seeds: &Positions) -> Result<()> {
        let scene = self.scene(name)?;
        let simulated = scene.simulated();
        let forces = scene.forces.clone();
        let links = simulated_links(scene, &self.links);

        let existing = self.engine.positions()?;
        let nodes: Vec<NodeSpec> = simulated
            .iter()
            .map(|&id| match seeds.get(&id) {
                Some(p) if !existing.contains_key(&id) => NodeSpec::at(id, p.x, p.y),
                _ => NodeSpec::new(id),
            })
            .collect();

        self.engine.set_forces(forces)?;
        self.engine.set_nodes(&nodes)?;
        self.engine.set_links(&links)?;
        let initial = self.engine.alpha_schedule()?.initial;
        self.engine.reheat(initial)?;
        log::debug!(
            "scene {name} active: {} simulated, {} links",
            nodes.len(),
            links.len()
        );
        Ok(())
    }

    fn settle(&mut self, max_ticks: u32) -> Result<Positions> {
        let mut ticks = 0;
        while ticks < max_ticks && !self.engine.is_converged()? {
            self.engine.tick(1)?;
            ticks += 1;
        }
        self.engine.positions()
    }

    /// Rendered positions at `now_ms` without mutating anything.
    fn render(&self, now_ms: f64, kernel: &Positions) -> Positions {
        match &self.transition {
            None => self.targets(&self.active, kernel, None, &self.rendered),
            Some(t) => {
                let eased = t.easing.apply(t.progress_at(now_ms));
                self.targets(&t.to, kernel, t.settled.as_ref(), &t.snapshot)
                    .into_iter()
                    .map(|(id, target)| {
                        let from = t.snapshot.get(&id).copied().unwrap_or(target);
                        (id, from.lerp(target, eased))
                    })
                    .collect()
            }
        }
    }

    /// Where each node of scene `name` wants to be.
    ///
    /// Simulated nodes read `settled` when present, else the kernel. Nodes
    /// whose source has no position yet (an external node the host has not
    /// supplied) hold their `fallback` position, or are omitted.
    fn targets(
        &self,
        name: &str,
        kernel: &Positions,
        settled: Option<&Positions>,
        fallback: &Positions,
    ) -> Positions {
        let Some(scene) = self.scenes.get(name) else {
            return Positions::new();
        };
        scene
            .rules
            .iter()
            .filter_map(|(&id, rule)| {
                let target = match rule {
                    NodeRule::Fixed(p) => Some(*p),
                    NodeRule::Simulated => settled.unwrap_or(kernel).get(&id).copied(),
                    NodeRule::External => self.external.get(&id).copied(),
                };
                target.or_else(|| fallback.get(&id).copied()).map(|p| (id, p))
            })
            .collect()
    }
}

fn simulated_links(scene: &SceneConfig, links: &[LinkSpec]) -> Vec<LinkSpec> {
    links
        .iter()
        .filter(|link| {
            link.connects(|id| matches!(scene.rules.get(&id), Some(NodeRule::Simulated)))
        })
        .copied()
        .collect()
}
