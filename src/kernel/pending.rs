//! Adapter for a kernel whose initialization has not finished.
//!
//! Mutating calls are validated against a shadow copy of the configuration
//! and queued; reads and `tick` return `NotReady`. Once the kernel arrives,
//! `attach` replays the queue in call order and the adapter delegates from
//! then on. `fail` turns every later call into `KernelUnavailable`.

use std::fmt;
use std::mem;

use super::reference::SimNode;
use super::simulation::Simulation;
use super::{EngineAdapter, KernelKind, PositionBuffer, TickObserver, TickReport};
use crate::error::{self, LayoutError, Result};
use crate::forces::{ForceParams, ForceSet};
use crate::graph::{LinkSpec, NodeId, NodeSpec, Positions};
use crate::sim::{AlphaSchedule, SimulationConfig};

/// A queued mutating call.
enum Call {
    SetNodes(Vec<NodeSpec>),
    SetLinks(Vec<LinkSpec>),
    ConfigureForce(String, ForceParams),
    EnableForce(String, bool),
    RegisterForce(String, ForceParams, bool),
    SetForces(ForceSet),
    SetAlphaSchedule(AlphaSchedule),
    SetVelocityDecay(f64),
    Pin(NodeId, f64, f64),
    Unpin(NodeId),
    Reheat(f64),
    SetTickObserver(Option<TickObserver>),
}

impl Call {
    fn replay(self, engine: &mut dyn EngineAdapter) -> Result<()> {
        match self {
            Call::SetNodes(nodes) => engine.set_nodes(&nodes).map(drop),
            Call::SetLinks(links) => engine.set_links(&links),
            Call::ConfigureForce(name, params) => engine.configure_force(&name, params),
            Call::EnableForce(name, enabled) => engine.enable_force(&name, enabled),
            Call::RegisterForce(name, params, enabled) => {
                engine.register_force(&name, params, enabled)
            }
            Call::SetForces(forces) => engine.set_forces(forces),
            Call::SetAlphaSchedule(schedule) => engine.set_alpha_schedule(schedule),
            Call::SetVelocityDecay(decay) => engine.set_velocity_decay(decay),
            Call::Pin(id, x, y) => engine.pin(id, x, y),
            Call::Unpin(id) => engine.unpin(id),
            Call::Reheat(alpha) => engine.reheat(alpha),
            Call::SetTickObserver(observer) => engine.set_tick_observer(observer),
        }
    }
}

enum State {
    Waiting {
        /// Mirrors the kernel's configuration so calls can be validated now.
        shadow: Box<Simulation>,
        queue: Vec<Call>,
    },
    Ready(Box<dyn EngineAdapter>),
    Failed(String),
    Disposed,
}

/// An adapter created before its kernel exists.
pub struct PendingEngine {
    kind: KernelKind,
    state: State,
}

impl PendingEngine {
    /// A pending adapter for a kernel of `kind` that will be built with `config`.
    pub fn new(kind: KernelKind, config: SimulationConfig) -> Result<Self> {
        Ok(Self {
            kind,
            state: State::Waiting {
                shadow: Box::new(Simulation::new(config)?),
                queue: Vec::new(),
            },
        })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Install the kernel and replay queued calls in order.
    ///
    /// The kernel is attached even if a replayed call fails; the first
    /// failure is returned.
    pub fn attach(&mut self, mut engine: Box<dyn EngineAdapter>) -> Result<()> {
        let queue = match mem::replace(&mut self.state, State::Disposed) {
            State::Waiting { queue, .. } => queue,
            other => {
                let err = Self::closed(&other, self.kind);
                self.state = other;
                return Err(err);
            }
        };

        log::debug!("{} kernel attached, replaying {} calls", self.kind, queue.len());
        let mut first_error = None;
        for call in queue {
            if let Err(err) = call.replay(engine.as_mut()) {
                first_error.get_or_insert(err);
            }
        }
        self.state = State::Ready(engine);
        first_error.map_or(Ok(()), Err)
    }

    /// Record that initialization failed.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("{} kernel failed to initialize: {reason}", self.kind);
        if !matches!(self.state, State::Disposed) {
            self.state = State::Failed(reason);
        }
    }

    fn closed(state: &State, kind: KernelKind) -> LayoutError {
        match state {
            State::Failed(reason) => LayoutError::KernelUnavailable {
                kernel: kind.name(),
                reason: reason.clone(),
            },
            State::Disposed => LayoutError::Disposed,
            State::Waiting { .. } => LayoutError::NotReady,
            State::Ready(_) => LayoutError::KernelUnavailable {
                kernel: kind.name(),
                reason: "a kernel is already attached".to_string(),
            },
        }
    }

    /// Validate `check` against the shadow and queue `call`, or run it.
    fn mutate<V>(&mut self, check: V, call: Call) -> Result<()>
    where
        V: FnOnce(&mut Simulation) -> Result<()>,
    {
        match &mut self.state {
            State::Waiting { shadow, queue } => {
                check(shadow.as_mut())?;
                queue.push(call);
                Ok(())
            }
            State::Ready(engine) => call.replay(engine.as_mut()),
            other => Err(Self::closed(other, self.kind)),
        }
    }

    fn ready(&self) -> Result<&dyn EngineAdapter> {
        match &self.state {
            State::Ready(engine) => Ok(engine.as_ref()),
            other => Err(Self::closed(other, self.kind)),
        }
    }

    fn ready_mut(&mut self) -> Result<&mut dyn EngineAdapter> {
        match &mut self.state {
            State::Ready(engine) => Ok(engine.as_mut()),
            other => Err(Self::closed(other, self.kind)),
        }
    }
}

impl fmt::Debug for PendingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Waiting { queue, .. } => format!("Waiting({} queued)", queue.len()),
            State::Ready(engine) => format!("Ready({})", engine.kind()),
            State::Failed(reason) => format!("Failed({reason})"),
            State::Disposed => "Disposed".to_string(),
        };
        f.debug_struct("PendingEngine")
            .field("kind", &self.kind)
            .field("state", &state)
            .finish()
    }
}

impl EngineAdapter for PendingEngine {
    fn kind(&self) -> KernelKind {
        self.kind
    }

    fn set_nodes(&mut self, nodes: &[NodeSpec]) -> Result<usize> {
        match &mut self.state {
            State::Waiting { shadow, queue } => {
                let plan = shadow.plan_nodes(nodes, |_| SimNode::default())?;
                let pruned = plan.pruned;
                shadow.commit_nodes(plan);
                queue.push(Call::SetNodes(nodes.to_vec()));
                Ok(pruned)
            }
            State::Ready(engine) => engine.set_nodes(nodes),
            other => Err(Self::closed(other, self.kind)),
        }
    }

    fn set_links(&mut self, links: &[LinkSpec]) -> Result<()> {
        self.mutate(
            |shadow| Ok(shadow.set_links(links)?),
            Call::SetLinks(links.to_vec()),
        )
    }

    fn configure_force(&mut self, name: &str, params: ForceParams) -> Result<()> {
        let check = params.clone();
        self.mutate(
            |shadow| Ok(shadow.configure_force(name, check)?),
            Call::ConfigureForce(name.to_string(), params),
        )
    }

    fn enable_force(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.mutate(
            |shadow| Ok(shadow.enable_force(name, enabled)?),
            Call::EnableForce(name.to_string(), enabled),
        )
    }

    fn register_force(&mut self, name: &str, params: ForceParams, enabled: bool) -> Result<()> {
        let check = params.clone();
        self.mutate(
            |shadow| Ok(shadow.register_force(name, check, enabled)?),
            Call::RegisterForce(name.to_string(), params, enabled),
        )
    }

    fn set_forces(&mut self, forces: ForceSet) -> Result<()> {
        let check = forces.clone();
        self.mutate(
            |shadow| Ok(shadow.set_forces(check)?),
            Call::SetForces(forces),
        )
    }

    fn set_alpha_schedule(&mut self, schedule: AlphaSchedule) -> Result<()> {
        self.mutate(
            |shadow| Ok(shadow.set_alpha_schedule(schedule)?),
            Call::SetAlphaSchedule(schedule),
        )
    }

    fn alpha_schedule(&self) -> Result<AlphaSchedule> {
        self.ready()?.alpha_schedule()
    }

    fn set_velocity_decay(&mut self, decay: f64) -> Result<()> {
        self.mutate(
            |shadow| Ok(shadow.set_velocity_decay(decay)?),
            Call::SetVelocityDecay(decay),
        )
    }

    fn tick(&mut self, n: u32) -> Result<TickReport> {
        self.ready_mut()?.tick(n)
    }

    fn positions(&self) -> Result<Positions> {
        self.ready()?.positions()
    }

    fn velocities(&self) -> Result<Positions> {
        self.ready()?.velocities()
    }

    fn position_buffer(&self) -> Result<Option<PositionBuffer<'_>>> {
        self.ready()?.position_buffer()
    }

    fn pin(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        self.mutate(
            |shadow| {
                shadow.slot(id)?;
                error::finite("pin.x", x)?;
                error::finite("pin.y", y)?;
                Ok(())
            },
            Call::Pin(id, x, y),
        )
    }

    fn unpin(&mut self, id: NodeId) -> Result<()> {
        self.mutate(
            |shadow| {
                shadow.slot(id)?;
                Ok(())
            },
            Call::Unpin(id),
        )
    }

    fn reheat(&mut self, alpha: f64) -> Result<()> {
        self.mutate(
            |shadow| Ok(shadow.reheat(alpha)?),
            Call::Reheat(alpha),
        )
    }

    fn alpha(&self) -> Result<f64> {
        self.ready()?.alpha()
    }

    fn is_converged(&self) -> Result<bool> {
        self.ready()?.is_converged()
    }

    fn node_count(&self) -> Result<usize> {
        self.ready()?.node_count()
    }

    fn link_count(&self) -> Result<usize> {
        self.ready()?.link_count()
    }

    fn set_tick_observer(&mut self, observer: Option<TickObserver>) -> Result<()> {
        self.mutate(
            |_| Ok(()),
            Call::SetTickObserver(observer),
        )
    }

    fn dispose(&mut self) {
        if let State::Ready(engine) = &mut self.state {
            engine.dispose();
        }
        self.state = State::Disposed;
    }
}
