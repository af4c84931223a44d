//! Barnes–Hut quadtree over node positions.
//!
//! The tree is stored as an arena of quads indexed by `u32` and rebuilt from
//! scratch every tick; the arena and scratch buffers are reused between
//! rebuilds so steady-state ticks do not allocate.
//!
//! Construction follows the reference force-layout algorithm exactly:
//! - The extent starts as the unit square at the floor of the first corner and
//!   doubles toward each further corner until it contains all points.
//! - Points are inserted in body order; a point landing on an existing leaf
//!   splits it until the two points fall into different quadrants.
//! - Exactly coincident points share one leaf as a chain, newest first.
//! - Non-finite points are skipped.
//!
//! Child `i` of an internal quad is `(bottom << 1) | right` where `right` means
//! `x >= xm` and `bottom` means `y >= ym`.

/// Sentinel for "no quad" / "end of chain".
const NONE: u32 = u32::MAX;

/// Axis-aligned bounding box of a quad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Bounds {
    #[inline]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    #[inline]
    fn mid(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Bounds of child quadrant `i`.
    #[inline]
    fn child(&self, i: usize) -> Bounds {
        let (xm, ym) = self.mid();
        match i {
            0 => Bounds { x0: self.x0, y0: self.y0, x1: xm, y1: ym },
            1 => Bounds { x0: xm, y0: self.y0, x1: self.x1, y1: ym },
            2 => Bounds { x0: self.x0, y0: ym, x1: xm, y1: self.y1 },
            _ => Bounds { x0: xm, y0: ym, x1: self.x1, y1: self.y1 },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Cell {
    Internal([u32; 4]),
    /// Head body of the coincident-point chain.
    Leaf(u32),
}

/// One quad of the tree with its aggregates.
#[derive(Debug, Clone, Copy)]
pub struct Quad {
    cell: Cell,
    /// Total charge of the subtree (many-body).
    pub value: f64,
    /// Charge-weighted centroid of the subtree.
    pub cx: f64,
    pub cy: f64,
    /// Largest collision radius in the subtree.
    pub radius: f64,
}

impl Quad {
    fn new(cell: Cell) -> Self {
        Self {
            cell,
            value: 0.0,
            cx: 0.0,
            cy: 0.0,
            radius: 0.0,
        }
    }

    /// First body of a leaf's chain.
    #[inline]
    pub fn head(&self) -> Option<usize> {
        match self.cell {
            Cell::Leaf(head) => Some(head as usize),
            Cell::Internal(_) => None,
        }
    }
}

/// Traversal stack reused across visits.
pub type VisitStack = Vec<(u32, Bounds)>;

/// Quadtree arena.
#[derive(Debug, Clone)]
pub struct Quadtree {
    quads: Vec<Quad>,
    root: u32,
    extent: Option<Bounds>,
    px: Vec<f64>,
    py: Vec<f64>,
    /// Coincident chain links, indexed by body.
    next: Vec<u32>,
    len: usize,
    /// Scratch for post-order aggregation.
    order: Vec<u32>,
}

impl Quadtree {
    /// Create an empty quadtree.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a quadtree sized for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            quads: Vec::with_capacity(capacity * 2),
            root: NONE,
            extent: None,
            px: Vec::with_capacity(capacity),
            py: Vec::with_capacity(capacity),
            next: Vec::with_capacity(capacity),
            len: 0,
            order: Vec::with_capacity(capacity * 2),
        }
    }

    /// Rebuild the tree from points given in body order.
    pub fn rebuild<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        self.clear();
        for (x, y) in points {
            self.px.push(x);
            self.py.push(y);
        }
        self.next.resize(self.px.len(), NONE);

        let mut x0 = f64::INFINITY;
        let mut y0 = f64::INFINITY;
        let mut x1 = f64::NEG_INFINITY;
        let mut y1 = f64::NEG_INFINITY;
        for (&x, &y) in self.px.iter().zip(&self.py) {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        if x0 > x1 || y0 > y1 {
            return;
        }

        self.cover(x0, y0);
        self.cover(x1, y1);
        for body in 0..self.px.len() {
            self.insert(body as u32);
        }
    }

    /// Remove all points, keeping allocations.
    pub fn clear(&mut self) {
        self.quads.clear();
        self.root = NONE;
        self.extent = None;
        self.px.clear();
        self.py.clear();
        self.next.clear();
        self.len = 0;
    }

    /// Number of points stored in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Root extent, or None when the tree is empty.
    pub fn extent(&self) -> Option<Bounds> {
        self.extent
    }

    /// Position a body was inserted at.
    #[inline]
    pub fn point(&self, body: usize) -> (f64, f64) {
        (self.px[body], self.py[body])
    }

    /// True when another body shares this body's position and leaf.
    #[inline]
    pub fn has_next(&self, body: usize) -> bool {
        self.next[body] != NONE
    }

    /// Bodies in the coincident chain starting at `head`.
    pub fn chain(&self, head: usize) -> Chain<'_> {
        Chain {
            next: &self.next,
            current: head as u32,
        }
    }

    /// Pre-order traversal from the root.
    ///
    /// Children are visited in quadrant order 0..4. Returning `true` from the
    /// callback skips the quad's children.
    pub fn visit<F>(&self, stack: &mut VisitStack, mut callback: F)
    where
        F: FnMut(&Quad, Bounds) -> bool,
    {
        stack.clear();
        let Some(extent) = self.extent else {
            return;
        };
        if self.root == NONE {
            return;
        }

        stack.push((self.root, extent));
        while let Some((index, bounds)) = stack.pop() {
            let quad = &self.quads[index as usize];
            if callback(quad, bounds) {
                continue;
            }
            if let Cell::Internal(children) = quad.cell {
                for i in (0..4).rev() {
                    if children[i] != NONE {
                        stack.push((children[i], bounds.child(i)));
                    }
                }
            }
        }
    }

    /// Compute subtree charge and centroid for the many-body force.
    ///
    /// A leaf's charge is the sum over its chain; an internal quad's centroid
    /// is weighted by the absolute charge of its children.
    pub fn accumulate_charge(&mut self, strengths: &[f64]) {
        self.collect_post_order();
        for k in 0..self.order.len() {
            let index = self.order[k] as usize;
            let cell = self.quads[index].cell;
            match cell {
                Cell::Leaf(head) => {
                    let mut strength = 0.0;
                    let mut body = head;
                    while body != NONE {
                        strength += strengths[body as usize];
                        body = self.next[body as usize];
                    }
                    let quad = &mut self.quads[index];
                    quad.cx = self.px[head as usize];
                    quad.cy = self.py[head as usize];
                    quad.value = strength;
                }
                Cell::Internal(children) => {
                    let mut strength = 0.0;
                    let mut weight = 0.0;
                    let mut x = 0.0;
                    let mut y = 0.0;
                    for child in children {
                        if child == NONE {
                            continue;
                        }
                        let q = &self.quads[child as usize];
                        let c = q.value.abs();
                        if c > 0.0 {
                            strength += q.value;
                            weight += c;
                            x += c * q.cx;
                            y += c * q.cy;
                        }
                    }
                    let quad = &mut self.quads[index];
                    if weight > 0.0 {
                        quad.cx = x / weight;
                        quad.cy = y / weight;
                    }
                    quad.value = strength;
                }
            }
        }
    }

    /// Compute the largest collision radius per subtree.
    ///
    /// A leaf takes the radius of its head body only.
    pub fn accumulate_radius(&mut self, radii: &[f64]) {
        self.collect_post_order();
        for k in 0..self.order.len() {
            let index = self.order[k] as usize;
            let cell = self.quads[index].cell;
            let radius = match cell {
                Cell::Leaf(head) => radii[head as usize],
                Cell::Internal(children) => children
                    .iter()
                    .filter(|&&child| child != NONE)
                    .map(|&child| self.quads[child as usize].radius)
                    .fold(0.0, |r: f64, c| if c > r { c } else { r }),
            };
            self.quads[index].radius = radius;
        }
    }

    /// Fill `order` so that every child precedes its parent.
    fn collect_post_order(&mut self) {
        self.order.clear();
        if self.root == NONE {
            return;
        }
        self.order.push(self.root);
        let mut k = 0;
        while k < self.order.len() {
            if let Cell::Internal(children) = self.quads[self.order[k] as usize].cell {
                for child in children {
                    if child != NONE {
                        self.order.push(child);
                    }
                }
            }
            k += 1;
        }
        self.order.reverse();
    }

    /// Grow the extent to contain (x, y). Only called before insertion.
    fn cover(&mut self, x: f64, y: f64) {
        let Some(mut b) = self.extent else {
            let x0 = x.floor();
            let y0 = y.floor();
            self.extent = Some(Bounds {
                x0,
                y0,
                x1: x0 + 1.0,
                y1: y0 + 1.0,
            });
            return;
        };

        let mut z = b.x1 - b.x0;
        if z == 0.0 {
            z = 1.0;
        }
        while b.x0 > x || x >= b.x1 || b.y0 > y || y >= b.y1 {
            let i = ((y < b.y0) as usize) << 1 | (x < b.x0) as usize;
            z *= 2.0;
            match i {
                0 => {
                    b.x1 = b.x0 + z;
                    b.y1 = b.y0 + z;
                }
                1 => {
                    b.x0 = b.x1 - z;
                    b.y1 = b.y0 + z;
                }
                2 => {
                    b.x1 = b.x0 + z;
                    b.y0 = b.y1 - z;
                }
                _ => {
                    b.x0 = b.x1 - z;
                    b.y0 = b.y1 - z;
                }
            }
        }
        self.extent = Some(b);
    }

    fn insert(&mut self, body: u32) {
        let (x, y) = self.point(body as usize);
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        let Some(mut b) = self.extent else {
            return;
        };
        self.len += 1;

        if self.root == NONE {
            self.root = self.push(Cell::Leaf(body));
            return;
        }

        // Descend to an empty slot or an occupied leaf.
        let mut node = self.root;
        let mut parent: Option<(u32, usize)> = None;
        let existing = loop {
            match self.quads[node as usize].cell {
                Cell::Leaf(head) => break head,
                Cell::Internal(children) => {
                    let i = Self::quadrant(&mut b, x, y);
                    if children[i] == NONE {
                        let leaf = self.push(Cell::Leaf(body));
                        self.set_child(node, i, leaf);
                        return;
                    }
                    parent = Some((node, i));
                    node = children[i];
                }
            }
        };

        let (xp, yp) = self.point(existing as usize);
        if x == xp && y == yp {
            self.next[body as usize] = existing;
            self.quads[node as usize].cell = Cell::Leaf(body);
            return;
        }

        // Split until the two points separate.
        let leaf = node;
        let mut slot = parent;
        loop {
            let internal = self.push(Cell::Internal([NONE; 4]));
            match slot {
                Some((p, i)) => self.set_child(p, i, internal),
                None => self.root = internal,
            }
            let (xm, ym) = b.mid();
            let i = Self::quadrant(&mut b, x, y);
            let j = ((yp >= ym) as usize) << 1 | (xp >= xm) as usize;
            if i != j {
                let new_leaf = self.push(Cell::Leaf(body));
                self.set_child(internal, j, leaf);
                self.set_child(internal, i, new_leaf);
                return;
            }
            slot = Some((internal, i));
        }
    }

    /// Quadrant of (x, y) within `b`; narrows `b` to that quadrant.
    #[inline]
    fn quadrant(b: &mut Bounds, x: f64, y: f64) -> usize {
        let (xm, ym) = b.mid();
        let right = x >= xm;
        if right {
            b.x0 = xm;
        } else {
            b.x1 = xm;
        }
        let bottom = y >= ym;
        if bottom {
            b.y0 = ym;
        } else {
            b.y1 = ym;
        }
        (bottom as usize) << 1 | right as usize
    }

    fn push(&mut self, cell: Cell) -> u32 {
        self.quads.push(Quad::new(cell));
        (self.quads.len() - 1) as u32
    }

    fn set_child(&mut self, parent: u32, i: usize, child: u32) {
        if let Cell::Internal(children) = &mut self.quads[parent as usize].cell {
            children[i] = child;
        }
    }
}

impl Default for Quadtree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a coincident-point chain.
pub struct Chain<'a> {
    next: &'a [u32],
    current: u32,
}

impl Iterator for Chain<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.current == NONE {
            return None;
        }
        let body = self.current as usize;
        self.current = self.next[body];
        Some(body)
    }
}
