//! Text buffers and the ordered segments of the emitted stylesheet.

/// Handle of a buffer owned by a [`BufferPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(usize);

/// Arena of reusable text buffers.
///
/// Released buffers keep their capacity and are handed out again by the
/// next `acquire`, so scratch buffers used to stringify sub-expressions do
/// not allocate once the pool is warm.
#[derive(Debug, Default)]
pub struct BufferPool {
    buffers: Vec<String>,
    free: Vec<usize>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> BufferId {
        match self.free.pop() {
            Some(idx) => {
                self.buffers[idx].clear();
                BufferId(idx)
            }
            None => {
                self.buffers.push(String::new());
                BufferId(self.buffers.len() - 1)
            }
        }
    }

    pub fn release(&mut self, id: BufferId) {
        debug_assert!(!self.free.contains(&id.0), "buffer released twice");
        self.free.push(id.0);
    }

    pub fn get(&self, id: BufferId) -> &str {
        &self.buffers[id.0]
    }

    pub fn get_mut(&mut self, id: BufferId) -> &mut String {
        &mut self.buffers[id.0]
    }

    /// Number of buffers currently handed out
    pub fn in_use(&self) -> usize {
        self.buffers.len() - self.free.len()
    }
}

/// One piece of the final output, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSegment {
    /// Text copied verbatim (directives, comments, top level output)
    Plain { buffer: BufferId },
    /// Declarations of a rule block, wrapped in its selectors at finalization
    Rule {
        selectors: Vec<String>,
        buffer: BufferId,
    },
}

impl OutputSegment {
    pub fn buffer(&self) -> BufferId {
        match self {
            OutputSegment::Plain { buffer } | OutputSegment::Rule { buffer, .. } => *buffer,
        }
    }
}
