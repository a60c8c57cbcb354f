// SPDX-License-Identifier: MPL-2.0

//! Marker reconciliation: turn the fetched memory list, the timeline year,
//! and the feed mode into the exact marker and polyline set the map should
//! show. Pure data in, pure data out; the widget layer only applies diffs.

use crate::supabase::{FeedMode, Memory};
use std::collections::HashMap;

/// Everything the map needs to materialize one marker. Like counts and card
/// content deliberately stay out: they live on the card widget, so a like
/// never forces a marker rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSpec {
    pub memory_id: i64,
    pub lat: f64,
    pub lng: f64,
    /// Colors the marker: own pin vs someone else's.
    pub own: bool,
}

/// Keyed diff between the markers on screen and the markers that should be.
#[derive(Debug, Default, PartialEq)]
pub struct MarkerDiff {
    pub add: Vec<MarkerSpec>,
    pub update: Vec<MarkerSpec>,
    pub remove: Vec<i64>,
}

impl MarkerDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.remove.is_empty()
    }
}

/// Memories visible under the timeline filter: everything dated up to and
/// including the selected year.
pub fn visible(memories: &[Memory], view_year: i32) -> Vec<&Memory> {
    memories.iter().filter(|m| m.year <= view_year).collect()
}

/// Marker set for the visible list, colored by ownership.
pub fn desired_markers(memories: &[Memory], view_year: i32, identity: &str) -> Vec<MarkerSpec> {
    visible(memories, view_year)
        .into_iter()
        .map(|m| MarkerSpec {
            memory_id: m.id,
            lat: m.lat,
            lng: m.lng,
            own: m.is_owned_by(identity),
        })
        .collect()
}

/// Plan the minimal transition from `existing` to `desired`, keyed by memory
/// id. Planning against an already-reconciled set yields an empty diff.
pub fn plan(existing: &HashMap<i64, MarkerSpec>, desired: &[MarkerSpec]) -> MarkerDiff {
    let mut diff = MarkerDiff::default();

    for spec in desired {
        match existing.get(&spec.memory_id) {
            None => diff.add.push(*spec),
            Some(current) if current != spec => diff.update.push(*spec),
            Some(_) => {}
        }
    }

    let mut remove: Vec<i64> = existing
        .keys()
        .filter(|id| !desired.iter().any(|s| s.memory_id == **id))
        .copied()
        .collect();
    remove.sort_unstable();
    diff.remove = remove;

    diff
}

/// The connective thread through the user's own pins: every visible
/// coordinate in list order when the feed is `Mine`, nothing in `Explore`.
pub fn polyline(memories: &[Memory], view_year: i32, feed_mode: FeedMode) -> Vec<(f64, f64)> {
    if !feed_mode.is_mine() {
        return Vec::new();
    }
    visible(memories, view_year)
        .into_iter()
        .map(|m| (m.lat, m.lng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(id: i64, owner: &str, lat: f64, lng: f64, year: i32) -> Memory {
        Memory {
            id,
            user_id: owner.into(),
            title: format!("m{id}"),
            description: None,
            date: format!("{year}-05-01"),
            year,
            lat,
            lng,
            media_url: None,
            username: "ada".into(),
            like_count: 0,
            viewer_liked: false,
        }
    }

    fn materialize(existing: &mut HashMap<i64, MarkerSpec>, diff: &MarkerDiff) {
        for id in &diff.remove {
            existing.remove(id);
        }
        for spec in diff.add.iter().chain(&diff.update) {
            existing.insert(spec.memory_id, *spec);
        }
    }

    #[test]
    fn test_single_owned_memory_scenario() {
        // Identity u1, mode mine: one marker at (10, 20) colored as own,
        // polyline with exactly that point.
        let memories = vec![memory(1, "u1", 10.0, 20.0, 2021)];
        let markers = desired_markers(&memories, 2030, "u1");
        assert_eq!(markers.len(), 1);
        assert_eq!((markers[0].lat, markers[0].lng), (10.0, 20.0));
        assert!(markers[0].own);

        assert_eq!(
            polyline(&memories, 2030, FeedMode::Mine),
            vec![(10.0, 20.0)]
        );
    }

    #[test]
    fn test_foreign_memories_use_shared_color() {
        let memories = vec![memory(1, "u1", 0.0, 0.0, 2021), memory(2, "u2", 1.0, 1.0, 2021)];
        let markers = desired_markers(&memories, 2030, "u1");
        assert!(markers[0].own);
        assert!(!markers[1].own);
    }

    #[test]
    fn test_year_filter_is_inclusive_upper_bound() {
        let memories = vec![
            memory(1, "u1", 0.0, 0.0, 2019),
            memory(2, "u1", 1.0, 1.0, 2021),
            memory(3, "u1", 2.0, 2.0, 2025),
        ];
        let shown: Vec<i64> = visible(&memories, 2021).iter().map(|m| m.id).collect();
        assert_eq!(shown, vec![1, 2]);
        // At the slider maximum the full list is visible.
        assert_eq!(visible(&memories, 2030).len(), 3);
    }

    #[test]
    fn test_plan_is_idempotent() {
        let memories = vec![memory(1, "u1", 10.0, 20.0, 2021), memory(2, "u2", 3.0, 4.0, 2022)];
        let desired = desired_markers(&memories, 2030, "u1");

        let mut on_screen = HashMap::new();
        let first = plan(&on_screen, &desired);
        assert_eq!(first.add.len(), 2);
        materialize(&mut on_screen, &first);

        // Unchanged list: nothing to do, and the marker set is identical.
        let second = plan(&on_screen, &desired);
        assert!(second.is_empty());
        assert_eq!(on_screen.len(), 2);
    }

    #[test]
    fn test_plan_removes_markers_that_left_the_list() {
        let before = desired_markers(&[memory(1, "u1", 0.0, 0.0, 2021)], 2030, "u1");
        let mut on_screen = HashMap::new();
        let diff = plan(&on_screen, &before);
        materialize(&mut on_screen, &diff);

        let after = desired_markers(&[memory(2, "u2", 5.0, 5.0, 2022)], 2030, "u1");
        let diff = plan(&on_screen, &after);
        assert_eq!(diff.remove, vec![1]);
        assert_eq!(diff.add.len(), 1);
        assert_eq!(diff.add[0].memory_id, 2);
    }

    #[test]
    fn test_plan_updates_on_ownership_change_only() {
        // Same id seen from a different identity flips the color via update,
        // not remove + add.
        let memories = vec![memory(1, "u1", 0.0, 0.0, 2021)];
        let mut on_screen = HashMap::new();
        let initial = plan(&on_screen, &desired_markers(&memories, 2030, "u1"));
        materialize(&mut on_screen, &initial);

        let diff = plan(&on_screen, &desired_markers(&memories, 2030, "u2"));
        assert!(diff.add.is_empty());
        assert!(diff.remove.is_empty());
        assert_eq!(diff.update.len(), 1);
        assert!(!diff.update[0].own);
    }

    #[test]
    fn test_like_counts_do_not_disturb_markers() {
        let mut memories = vec![memory(1, "u1", 0.0, 0.0, 2021)];
        let mut on_screen = HashMap::new();
        let initial = plan(&on_screen, &desired_markers(&memories, 2030, "u1"));
        materialize(&mut on_screen, &initial);

        memories[0].like_count = 7;
        memories[0].viewer_liked = true;
        let diff = plan(&on_screen, &desired_markers(&memories, 2030, "u1"));
        assert!(diff.is_empty());
    }

    #[test]
    fn test_polyline_follows_list_order_in_mine() {
        // List order, not chronological order.
        let memories = vec![
            memory(1, "u1", 3.0, 3.0, 2025),
            memory(2, "u1", 1.0, 1.0, 2019),
            memory(3, "u1", 2.0, 2.0, 2021),
        ];
        assert_eq!(
            polyline(&memories, 2030, FeedMode::Mine),
            vec![(3.0, 3.0), (1.0, 1.0), (2.0, 2.0)]
        );
    }

    #[test]
    fn test_polyline_empty_in_explore() {
        let memories = vec![memory(1, "u1", 3.0, 3.0, 2021)];
        assert!(polyline(&memories, 2030, FeedMode::Explore).is_empty());
    }

    #[test]
    fn test_polyline_respects_year_filter() {
        let memories = vec![
            memory(1, "u1", 1.0, 1.0, 2019),
            memory(2, "u1", 2.0, 2.0, 2027),
        ];
        assert_eq!(
            polyline(&memories, 2020, FeedMode::Mine),
            vec![(1.0, 1.0)]
        );
    }
}
