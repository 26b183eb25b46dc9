/// Worker pool sizing.
///
/// Zero values mean "use the default"; see [`PoolConfig::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl PoolConfig {
    pub const DEFAULT_WORKERS: usize = 4;
    pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers,
            queue_capacity,
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            workers: if self.workers == 0 {
                Self::DEFAULT_WORKERS
            } else {
                self.workers
            },
            queue_capacity: if self.queue_capacity == 0 {
                Self::DEFAULT_QUEUE_CAPACITY
            } else {
                self.queue_capacity
            },
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORKERS, Self::DEFAULT_QUEUE_CAPACITY)
    }
}
