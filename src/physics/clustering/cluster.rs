//! Same-colour cluster search over bubble proximity.
//!
//! A `BubbleField` is a snapshot of bubble centres bucketed in a uniform spatial hash.
//! `overlapping` answers "which bubble colliders intersect a circle of radius r around p",
//! and `find_matching_cluster` walks those overlaps breadth-first, only expanding through
//! bubbles of the start colour.
use bevy::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
struct Cell(i32, i32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldEntry {
    pub entity: Entity,
    pub position: Vec2,
    pub color_index: usize,
}

#[derive(Debug, Clone)]
pub struct BubbleField {
    entries: Vec<FieldEntry>,
    index: HashMap<Entity, usize>,
    grid: HashMap<Cell, Vec<usize>>,
    inv_cell: f32,
    bubble_radius: f32,
}

impl BubbleField {
    /// `cell_size` should be around the typical query reach; any positive value is correct.
    pub fn new(bubble_radius: f32, cell_size: f32) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            grid: HashMap::new(),
            inv_cell: 1.0 / cell_size.max(1.0),
            bubble_radius: bubble_radius.max(0.0),
        }
    }

    pub fn from_entries<I>(bubble_radius: f32, cell_size: f32, entries: I) -> Self
    where
        I: IntoIterator<Item = FieldEntry>,
    {
        let mut field = Self::new(bubble_radius, cell_size);
        for e in entries {
            field.insert(e);
        }
        field
    }

    fn cell_of(&self, p: Vec2) -> Cell {
        Cell(
            (p.x * self.inv_cell).floor() as i32,
            (p.y * self.inv_cell).floor() as i32,
        )
    }

    pub fn insert(&mut self, entry: FieldEntry) {
        if !entry.position.is_finite() || self.index.contains_key(&entry.entity) {
            return;
        }
        let i = self.entries.len();
        let cell = self.cell_of(entry.position);
        self.entries.push(entry);
        self.index.insert(entry.entity, i);
        self.grid.entry(cell).or_default().push(i);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, entity: Entity) -> Option<&FieldEntry> {
        self.index.get(&entity).map(|&i| &self.entries[i])
    }

    pub fn bubble_radius(&self) -> f32 {
        self.bubble_radius
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.iter()
    }

    /// Bubbles whose collider intersects a circle of `radius` around `center`.
    pub fn overlapping(&self, center: Vec2, radius: f32) -> Vec<Entity> {
        let reach = radius.max(0.0) + self.bubble_radius;
        let reach2 = reach * reach;
        let lo = self.cell_of(center - Vec2::splat(reach));
        let hi = self.cell_of(center + Vec2::splat(reach));
        let mut out = Vec::new();
        for cx in lo.0..=hi.0 {
            for cy in lo.1..=hi.1 {
                let Some(list) = self.grid.get(&Cell(cx, cy)) else {
                    continue;
                };
                for &i in list {
                    let e = &self.entries[i];
                    if e.position.distance_squared(center) <= reach2 {
                        out.push(e.entity);
                    }
                }
            }
        }
        out
    }
}

/// Breadth-first walk from `start` through overlapping bubbles of the same colour.
/// Returns members in visit order (start first); empty if `start` is not in the field.
pub fn find_matching_cluster(field: &BubbleField, start: Entity, neighbor_radius: f32) -> Vec<Entity> {
    let Some(origin) = field.get(start) else {
        return Vec::new();
    };
    let color = origin.color_index;
    let mut cluster = Vec::new();
    let mut visited: HashSet<Entity> = HashSet::new();
    let mut queue: VecDeque<Entity> = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if visited.contains(&current) {
            continue;
        }
        let Some(entry) = field.get(current) else {
            continue;
        };
        if entry.color_index != color {
            continue;
        }
        visited.insert(current);
        cluster.push(current);
        for n in field.overlapping(entry.position, neighbor_radius) {
            if !visited.contains(&n) {
                queue.push_back(n);
            }
        }
    }
    cluster
}

/// True when another bubble of the same colour overlaps a probe circle around `entity`.
pub fn has_same_color_neighbor(field: &BubbleField, entity: Entity, probe_radius: f32) -> bool {
    let Some(entry) = field.get(entity) else {
        return false;
    };
    field
        .overlapping(entry.position, probe_radius)
        .into_iter()
        .filter(|&e| e != entity)
        .any(|e| field.get(e).is_some_and(|o| o.color_index == entry.color_index))
}
