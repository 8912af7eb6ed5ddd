// Tasklet handles
//
// A tasklet is identified by its slot in the scheduler's link arena.
// Components keep their handle as a field (usually a `const`) and match
// on it when the scheduler hands it back during a drain.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u16);

impl TaskId {
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    // slot in the link arena
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tasklet#{}", self.0)
    }
}
