//! Bounded-size buffer partitions.
//!
//! Element buffers address vertices with u16 indices relative to a
//! group's `vertex_start_index`; a group therefore never spans more
//! vertices than the index type can address. Groups are appended, never
//! removed, within one build pass.

use serde::{Deserialize, Serialize};

/// Largest vertex count one group may hold with 16-bit element indices.
pub const INDEX_MAX: usize = u16::MAX as usize;

/// `{vertex start, vertex length, element lengths}` of one draw call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementGroup {
    pub vertex_start_index: usize,
    pub vertex_length: usize,
    pub element_length: usize,
    pub second_element_length: usize,
}

impl ElementGroup {
    fn open_at(vertex_start_index: usize) -> Self {
        Self {
            vertex_start_index,
            ..Self::default()
        }
    }
}

/// The ordered groups of one logical buffer.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ElementGroups {
    groups: Vec<ElementGroup>,
}

impl ElementGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure the active group can accept `vertex_count` more vertices
    /// without an element index exceeding the u16 range; otherwise close
    /// it and open a new group starting at the buffer's current length.
    /// Returns the active group.
    pub fn make_room_for(
        &mut self,
        vertex_buffer_len: usize,
        vertex_count: usize,
    ) -> &mut ElementGroup {
        let needs_new_group = match self.groups.last() {
            None => true,
            Some(current) => current.vertex_length + vertex_count > INDEX_MAX,
        };
        if needs_new_group {
            self.groups.push(ElementGroup::open_at(vertex_buffer_len));
        }
        self.groups
            .last_mut()
            .expect("a group was just ensured")
    }

    pub fn current(&self) -> Option<&ElementGroup> {
        self.groups.last()
    }

    pub fn groups(&self) -> &[ElementGroup] {
        &self.groups
    }

    pub fn has_data(&self) -> bool {
        self.groups.iter().any(|g| g.vertex_length > 0)
    }
}
