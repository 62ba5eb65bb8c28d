//! Uniform spatial hash over particle centres.
//!
//! Rebuilt from scratch whenever it is needed; with at most a couple of
//! thousand dots a rebuild is cheaper and simpler than maintaining an
//! incremental index. Cell size is chosen by the caller so that any pair
//! close enough to interact lands within one cell of each other, which
//! makes the 3x3 neighbourhood query exhaustive.

use fnv::FnvHashMap;
use glam::Vec2;
use smallvec::SmallVec;

use crate::particle::Particle;

pub struct SpatialHash {
    cell: f32,
    cells: FnvHashMap<(i32, i32), SmallVec<[u32; 8]>>,
}

impl SpatialHash {
    pub fn new(cell: f32) -> Self {
        Self {
            cell: cell.max(1.0),
            cells: FnvHashMap::default(),
        }
    }

    pub fn build(particles: &[Particle], cell: f32) -> Self {
        let mut hash = Self::new(cell);
        for (i, p) in particles.iter().enumerate() {
            hash.insert(i as u32, p.pos);
        }
        hash
    }

    pub fn insert(&mut self, index: u32, pos: Vec2) {
        self.cells.entry(self.key(pos)).or_default().push(index);
    }

    /// Visits every index stored in the 3x3 block of cells around `pos`.
    pub fn for_each_neighbor(&self, pos: Vec2, mut visit: impl FnMut(u32)) {
        let (cx, cy) = self.key(pos);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &index in bucket {
                        visit(index);
                    }
                }
            }
        }
    }

    #[inline]
    fn key(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell).floor() as i32,
            (pos.y / self.cell).floor() as i32,
        )
    }
}
