// SPDX-License-Identifier: MPL-2.0

//! Client-local view state: the fetched memory list plus the UI filters that
//! drive rendering. One instance, owned by the application controller and
//! passed to whoever needs it, never read from globals.

use crate::config;
use crate::supabase::{FeedMode, Memory};

#[derive(Debug)]
pub struct ViewState {
    memories: Vec<Memory>,
    pub feed_mode: FeedMode,
    pub view_year: i32,
    pub pin_mode: bool,
    pub pending_location: Option<(f64, f64)>,
}

impl ViewState {
    pub fn new(feed_mode: FeedMode, view_year: i32) -> Self {
        Self {
            memories: Vec::new(),
            feed_mode,
            view_year,
            pin_mode: false,
            pending_location: None,
        }
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    /// Replace the whole list; fetch results are never merged in place.
    pub fn replace_memories(&mut self, memories: Vec<Memory>) {
        self.memories = memories;
    }

    pub fn memory(&self, memory_id: i64) -> Option<&Memory> {
        self.memories.iter().find(|m| m.id == memory_id)
    }

    /// Whether the signed-in user already liked this memory. Unknown ids
    /// count as liked so a stale click cannot produce an insert.
    pub fn viewer_liked(&self, memory_id: i64) -> bool {
        self.memory(memory_id).is_none_or(|m| m.viewer_liked)
    }

    /// Record a successful like: bump that one memory's count by exactly 1
    /// and mark it liked, leaving every other entry untouched.
    pub fn apply_like(&mut self, memory_id: i64) -> bool {
        match self.memories.iter_mut().find(|m| m.id == memory_id) {
            Some(memory) if !memory.viewer_liked => {
                memory.like_count += 1;
                memory.viewer_liked = true;
                true
            }
            _ => false,
        }
    }

    pub fn enter_pin_mode(&mut self) {
        self.pin_mode = true;
        self.pending_location = None;
    }

    pub fn exit_pin_mode(&mut self) {
        self.pin_mode = false;
        self.pending_location = None;
    }

    pub fn set_pending_location(&mut self, lat: f64, lng: f64) {
        self.pending_location = Some((lat, lng));
    }

    /// Wholesale reset on sign-out.
    pub fn clear(&mut self) {
        self.memories.clear();
        self.feed_mode = FeedMode::Mine;
        self.view_year = config::YEAR_MAX;
        self.pin_mode = false;
        self.pending_location = None;
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(FeedMode::Mine, config::YEAR_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(id: i64, like_count: u32) -> Memory {
        Memory {
            id,
            user_id: "u1".into(),
            title: format!("m{id}"),
            description: None,
            date: "2021-05-01".into(),
            year: 2021,
            lat: 10.0,
            lng: 20.0,
            media_url: None,
            username: "ada".into(),
            like_count,
            viewer_liked: false,
        }
    }

    #[test]
    fn test_apply_like_touches_exactly_one_memory() {
        let mut state = ViewState::default();
        state.replace_memories(vec![memory(1, 0), memory(2, 5)]);

        assert!(state.apply_like(1));
        assert_eq!(state.memory(1).unwrap().like_count, 1);
        assert_eq!(state.memory(2).unwrap().like_count, 5);
    }

    #[test]
    fn test_second_like_is_a_no_op() {
        let mut state = ViewState::default();
        state.replace_memories(vec![memory(1, 0)]);

        assert!(state.apply_like(1));
        assert!(!state.apply_like(1));
        assert_eq!(state.memory(1).unwrap().like_count, 1);
        assert!(state.viewer_liked(1));
    }

    #[test]
    fn test_unknown_memory_counts_as_liked() {
        let state = ViewState::default();
        assert!(state.viewer_liked(99));
    }

    #[test]
    fn test_pin_mode_lifecycle() {
        let mut state = ViewState::default();
        state.enter_pin_mode();
        state.set_pending_location(5.0, 5.0);
        assert_eq!(state.pending_location, Some((5.0, 5.0)));

        state.exit_pin_mode();
        assert!(!state.pin_mode);
        assert_eq!(state.pending_location, None);
    }
}
