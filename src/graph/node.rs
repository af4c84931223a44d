//! Node identifiers, ingest records, and pin flags.
//!
//! Nodes are identified by an externally assigned `NodeId` that never
//! depends on where the node sits in any kernel array. Each node has:
//! - A position (x, y) and velocity (vx, vy)
//! - An optional per-axis pin (fx, fy) that overrides the simulated position
//! - An optional collision radius

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable node identifier.
///
/// Assigned by the caller and preserved across `setNodes` calls. It wraps a
/// u32 for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Accepts integers and integer strings; object keys arrive as strings.
impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = NodeId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a u32 node id")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<NodeId, E> {
                u32::try_from(v)
                    .map(NodeId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<NodeId, E> {
                u32::try_from(v)
                    .map(NodeId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<NodeId, E> {
                if v.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&v) {
                    Ok(NodeId(v as u32))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeId, E> {
                v.parse()
                    .map(NodeId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation toward `other`.
    #[inline]
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A node as supplied to `setNodes`.
///
/// Omitted coordinates are filled in by the kernel: an existing node keeps its
/// current state, a new one is placed on the phyllotaxis spiral.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
    /// Collision radius; falls back to the collide force's radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl NodeSpec {
    /// A node with no position; the kernel chooses one.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// A node at an explicit position.
    pub fn at(id: impl Into<NodeId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Pin this node on both axes.
    pub fn pinned(mut self, fx: f64, fy: f64) -> Self {
        self.fx = Some(fx);
        self.fy = Some(fy);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }
}

/// Per-node pin flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinFlags {
    flags: u8,
}

impl PinFlags {
    const PIN_X: u8 = 0b0000_0001;
    const PIN_Y: u8 = 0b0000_0010;

    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Flags for an optional per-axis pin.
    #[inline]
    pub fn from_pins(fx: Option<f64>, fy: Option<f64>) -> Self {
        let mut flags = Self::new();
        flags.set_x(fx.is_some());
        flags.set_y(fy.is_some());
        flags
    }

    #[inline]
    pub fn is_x(self) -> bool {
        self.flags & Self::PIN_X != 0
    }

    #[inline]
    pub fn set_x(&mut self, pinned: bool) {
        if pinned {
            self.flags |= Self::PIN_X;
        } else {
            self.flags &= !Self::PIN_X;
        }
    }

    #[inline]
    pub fn is_y(self) -> bool {
        self.flags & Self::PIN_Y != 0
    }

    #[inline]
    pub fn set_y(&mut self, pinned: bool) {
        if pinned {
            self.flags |= Self::PIN_Y;
        } else {
            self.flags &= !Self::PIN_Y;
        }
    }

    /// True when either axis is pinned.
    #[inline]
    pub fn any(self) -> bool {
        self.flags != 0
    }
}
