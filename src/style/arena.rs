use crate::render::Render;

/// Reference to an instruction of one particular load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u64,
}

impl Handle {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Append-only instruction storage tagged with the load generation.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    generation: u64,
    items: Vec<Render>,
}

impl Arena {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            items: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, render: Render) -> Handle {
        let index = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        self.items.push(render);
        Handle {
            index,
            generation: self.generation,
        }
    }

    /// `None` when `handle` belongs to another generation.
    pub(crate) fn get(&self, handle: Handle) -> Option<&Render> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get(handle.index as usize)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
