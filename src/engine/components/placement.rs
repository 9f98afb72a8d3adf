//! Declarative placement rules for scene components.
//!
//! A rule says where one mesh component sits in the world and how often it
//! repeats along the X axis. The table maps component names to rules and is
//! built once, before the first frame, then only read.

use std::collections::HashMap;

use glam::Vec3;

/// Where and how often one mesh component appears in the scene.
///
/// `angle` is in degrees; zero means no rotation at all. Repetition steps
/// instance `k` by `k * stride` board squares along +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRule {
    pub count: u32,
    pub stride: u32,
    pub angle: f32,
    pub axis: Vec3,
    pub scale: Vec3,
    pub position: Vec3,
}

impl PlacementRule {
    /// The same placement reflected to the opposite side of the board.
    /// Only the Y coordinate flips.
    pub fn mirrored(&self) -> Self {
        let mut rule = *self;
        rule.position.y = -rule.position.y;
        rule
    }

    /// One rule per repeated instance. Instance `k` offsets the base X by
    /// `k * stride * square_size`; a count of one yields the rule unchanged.
    pub fn expand(&self, square_size: f32) -> impl Iterator<Item = PlacementRule> + '_ {
        (0..self.count).map(move |k| {
            let mut rule = *self;
            rule.position.x += k as f32 * self.stride as f32 * square_size;
            rule
        })
    }
}

/// Immutable name-to-rule map, owned by the scene.
#[derive(Debug, Clone, Default)]
pub struct PlacementTable {
    rules: HashMap<String, PlacementRule>,
}

impl PlacementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, rule: PlacementRule) {
        let name = name.into();
        debug_assert!(
            !self.rules.contains_key(&name),
            "duplicate placement entry {name:?}"
        );
        self.rules.insert(name, rule);
    }

    pub fn get(&self, name: &str) -> Option<&PlacementRule> {
        self.rules.get(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlacementRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }
}
