/// Allocates and recycles non-zero `u32` object names.
///
/// Name 0 is reserved (the "no object" / default-framebuffer name), so the
/// first name handed out is 1. Freed names are recycled on subsequent
/// allocations, most recently freed first.
///
/// # Example
///
/// ```ignore
/// let mut names = NameAllocator::new();
/// let a = names.alloc();  // 1
/// let b = names.alloc();  // 2
/// names.free(a);          // 1 is now available
/// let c = names.alloc();  // 1 (recycled)
/// ```
pub struct NameAllocator {
    free_list: Vec<u32>,
    next_name: u32,
    len: u32,
}

impl NameAllocator {
    /// Create a new empty allocator
    pub fn new() -> Self {
        Self {
            free_list: Vec::new(),
            next_name: 1,
            len: 0,
        }
    }

    /// Allocate the next available name
    pub fn alloc(&mut self) -> u32 {
        self.len += 1;
        self.free_list.pop().unwrap_or_else(|| {
            let name = self.next_name;
            self.next_name += 1;
            name
        })
    }

    /// Return a name to the pool for reuse
    pub fn free(&mut self, name: u32) {
        debug_assert!(name != 0 && name < self.next_name, "freeing an unallocated name: {}", name);
        self.len -= 1;
        self.free_list.push(name);
    }

    /// Number of names currently in use
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no names are currently in use
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "name_allocator_tests.rs"]
mod tests;
