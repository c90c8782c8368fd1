//! Clustering of a difference mask into bounding boxes.
//!
//! Components are found with a single top-to-bottom pass using 8-connectivity:
//! only the previous and current rows of provisional labels are kept, and
//! label equivalences go into an index-based disjoint set. Component boxes that
//! sit within `merge_gap` empty pixels of each other are then merged, tiny
//! boxes are dropped, and the rest is sorted row-major.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bitmap::DifferenceMask;

/// Axis-aligned box around one concentration of differing pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Differing pixels inside the box that belong to this region.
    pub pixel_count: u64,
}

impl Region {
    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Tunables for [`RegionExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Boxes separated by at most this many empty columns *and* rows are merged.
    /// 0 still merges boxes that overlap or touch.
    #[serde(default = "default_merge_gap")]
    pub merge_gap: u32,
    /// Boxes whose area (width * height) is at or below this are dropped as noise.
    /// 0 keeps every component.
    #[serde(default = "default_noise_floor")]
    pub noise_floor: u64,
}

fn default_merge_gap() -> u32 {
    2
}

fn default_noise_floor() -> u64 {
    10
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            merge_gap: default_merge_gap(),
            noise_floor: default_noise_floor(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionExtractor {
    pub config: RegionConfig,
}

impl RegionExtractor {
    pub fn new(config: RegionConfig) -> Self {
        Self { config }
    }

    /// Summarize `mask` as row-major sorted regions.
    pub fn extract(&self, mask: &DifferenceMask) -> Vec<Region> {
        if mask.is_empty() {
            return Vec::new();
        }

        let components = label_components(mask);
        let component_count = components.len();
        let merged = merge_nearby(components, self.config.merge_gap);
        let merged_count = merged.len();

        let mut regions: Vec<Region> = merged
            .into_iter()
            .map(Bounds::into_region)
            .filter(|r| r.area() > self.config.noise_floor)
            .collect();
        regions.sort_by_key(|r| (r.y, r.x, r.height, r.width));

        debug!(
            components = component_count,
            merged = merged_count,
            kept = regions.len(),
            "regions extracted"
        );
        regions
    }
}

/// Inclusive pixel bounds plus member count, used while clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    count: u64,
}

impl Bounds {
    fn empty() -> Self {
        Self {
            min_x: u32::MAX,
            min_y: u32::MAX,
            max_x: 0,
            max_y: 0,
            count: 0,
        }
    }

    fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.count += 1;
    }

    fn absorb(&mut self, other: &Bounds) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
        self.count += other.count;
    }

    /// Both the column gap and the row gap are at most `gap` empty pixels.
    fn is_near(&self, other: &Bounds, gap: u32) -> bool {
        let col_gap = axis_gap(self.min_x, self.max_x, other.min_x, other.max_x);
        let row_gap = axis_gap(self.min_y, self.max_y, other.min_y, other.max_y);
        col_gap <= gap as u64 && row_gap <= gap as u64
    }

    fn into_region(self) -> Region {
        Region {
            x: self.min_x,
            y: self.min_y,
            width: self.max_x - self.min_x + 1,
            height: self.max_y - self.min_y + 1,
            pixel_count: self.count,
        }
    }
}

/// Empty pixels strictly between two inclusive intervals; 0 when they touch or overlap.
fn axis_gap(a_min: u32, a_max: u32, b_min: u32, b_max: u32) -> u64 {
    if a_max < b_min {
        (b_min - a_max - 1) as u64
    } else if b_max < a_min {
        (a_min - b_max - 1) as u64
    } else {
        0
    }
}

/// Disjoint set over dense `u32` indices. Roots are always the smallest index
/// of their set, which keeps the output independent of union order.
#[derive(Debug, Default)]
struct DisjointSet {
    parent: Vec<u32>,
}

impl DisjointSet {
    fn with_len(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn make(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut i: u32) -> u32 {
        while self.parent[i as usize] != i {
            let grand = self.parent[self.parent[i as usize] as usize];
            self.parent[i as usize] = grand;
            i = grand;
        }
        i
    }

    /// Returns `true` when `a` and `b` were in different sets.
    fn union(&mut self, a: u32, b: u32) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi as usize] = lo;
        true
    }

    fn len(&self) -> usize {
        self.parent.len()
    }
}

/// Collapse per-member bounds onto their set roots, in root order.
fn fold_by_root(sets: &mut DisjointSet, members: &[Bounds]) -> Vec<Bounds> {
    const UNASSIGNED: u32 = u32::MAX;
    let mut slot = vec![UNASSIGNED; sets.len()];
    let mut out: Vec<Bounds> = Vec::new();
    for (i, b) in members.iter().enumerate() {
        let root = sets.find(i as u32) as usize;
        if slot[root] == UNASSIGNED {
            slot[root] = out.len() as u32;
            out.push(Bounds::empty());
        }
        out[slot[root] as usize].absorb(b);
    }
    out
}

const NO_LABEL: u32 = u32::MAX;

/// 8-connected components of the set cells.
fn label_components(mask: &DifferenceMask) -> Vec<Bounds> {
    let w = mask.width() as usize;
    let mut sets = DisjointSet::default();
    let mut bounds: Vec<Bounds> = Vec::new();
    let mut prev = vec![NO_LABEL; w];
    let mut cur = vec![NO_LABEL; w];

    for y in 0..mask.height() {
        let row = mask.row(y);
        for x in 0..w {
            if !row[x] {
                cur[x] = NO_LABEL;
                continue;
            }

            let west = if x > 0 { cur[x - 1] } else { NO_LABEL };
            let north_west = if x > 0 { prev[x - 1] } else { NO_LABEL };
            let north_east = if x + 1 < w { prev[x + 1] } else { NO_LABEL };

            let mut label = NO_LABEL;
            for n in [west, north_west, prev[x], north_east] {
                if n == NO_LABEL {
                    continue;
                }
                if label == NO_LABEL {
                    label = n;
                } else {
                    sets.union(label, n);
                }
            }
            if label == NO_LABEL {
                label = sets.make();
                bounds.push(Bounds::empty());
            }

            bounds[label as usize].include(x as u32, y);
            cur[x] = label;
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    fold_by_root(&mut sets, &bounds)
}

/// Merge boxes within `gap` of each other until no pair qualifies.
///
/// Each pass buckets the boxes into a uniform grid and only compares a box
/// with the boxes registered in the cells within reach of its bounds.
fn merge_nearby(mut boxes: Vec<Bounds>, gap: u32) -> Vec<Bounds> {
    loop {
        boxes.sort_by_key(|b| (b.min_x, b.min_y, b.max_x, b.max_y));
        let grid = CellGrid::build(&boxes, gap);
        let mut sets = DisjointSet::with_len(boxes.len());
        let mut merged_any = false;

        for (i, b) in boxes.iter().enumerate() {
            let (cols, rows) = grid.reach(b, gap);
            for row in rows {
                for col in cols.clone() {
                    for &j in grid.cell(col, row) {
                        if j as usize > i
                            && b.is_near(&boxes[j as usize], gap)
                            && sets.union(i as u32, j)
                        {
                            merged_any = true;
                        }
                    }
                }
            }
        }

        if !merged_any {
            return boxes;
        }
        boxes = fold_by_root(&mut sets, &boxes);
    }
}

/// Box ids bucketed by square cells. A box is listed in every cell its bounds
/// cover; cell contents are stored back to back in `ids`.
struct CellGrid {
    size: u32,
    cols: usize,
    rows: usize,
    starts: Vec<usize>,
    ids: Vec<u32>,
}

impl CellGrid {
    /// Cell side is the median box extent, at least `gap + 1`, doubled until
    /// the grid has no more cells than a small multiple of the box count.
    fn build(boxes: &[Bounds], gap: u32) -> Self {
        let mut extents: Vec<u32> = boxes
            .iter()
            .map(|b| (b.max_x - b.min_x).max(b.max_y - b.min_y) + 1)
            .collect();
        let median = if extents.is_empty() {
            1
        } else {
            let mid = extents.len() / 2;
            *extents.select_nth_unstable(mid).1
        };

        let width = boxes.iter().map(|b| b.max_x as u64 + 1).max().unwrap_or(1);
        let height = boxes.iter().map(|b| b.max_y as u64 + 1).max().unwrap_or(1);
        let max_cells = 4 * boxes.len() as u64 + 64;

        let mut size = median.max(gap.saturating_add(1)) as u64;
        while width.div_ceil(size) * height.div_ceil(size) > max_cells {
            size *= 2;
        }
        let cols = width.div_ceil(size) as usize;
        let rows = height.div_ceil(size) as usize;
        let size = size.min(u32::MAX as u64) as u32;

        let mut grid = Self {
            size,
            cols,
            rows,
            starts: vec![0; cols * rows + 1],
            ids: Vec::new(),
        };

        for b in boxes {
            let (cs, rs) = grid.covered(b.min_x, b.max_x, b.min_y, b.max_y);
            for row in rs {
                for col in cs.clone() {
                    grid.starts[row * cols + col + 1] += 1;
                }
            }
        }
        for c in 1..grid.starts.len() {
            grid.starts[c] += grid.starts[c - 1];
        }

        let mut next = grid.starts.clone();
        grid.ids = vec![0; grid.starts[cols * rows]];
        for (i, b) in boxes.iter().enumerate() {
            let (cs, rs) = grid.covered(b.min_x, b.max_x, b.min_y, b.max_y);
            for row in rs {
                for col in cs.clone() {
                    let c = row * cols + col;
                    grid.ids[next[c]] = i as u32;
                    next[c] += 1;
                }
            }
        }
        grid
    }

    /// Column and row cell ranges covering the inclusive pixel bounds, clamped to the grid.
    fn covered(
        &self,
        min_x: u32,
        max_x: u32,
        min_y: u32,
        max_y: u32,
    ) -> (RangeInclusive<usize>, RangeInclusive<usize>) {
        let cell = |v: u32, limit: usize| ((v / self.size) as usize).min(limit - 1);
        (
            cell(min_x, self.cols)..=cell(max_x, self.cols),
            cell(min_y, self.rows)..=cell(max_y, self.rows),
        )
    }

    /// Cells a box within `gap` empty pixels of `b` must be registered in.
    fn reach(&self, b: &Bounds, gap: u32) -> (RangeInclusive<usize>, RangeInclusive<usize>) {
        let step = gap.saturating_add(1);
        self.covered(
            b.min_x.saturating_sub(step),
            b.max_x.saturating_add(step),
            b.min_y.saturating_sub(step),
            b.max_y.saturating_add(step),
        )
    }

    fn cell(&self, col: usize, row: usize) -> &[u32] {
        let c = row * self.cols + col;
        &self.ids[self.starts[c]..self.starts[c + 1]]
    }
}
