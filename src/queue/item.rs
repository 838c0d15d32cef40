use std::fmt;

/// Scheduling priority. Lower values are serviced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u32);

impl Priority {
    /// Most urgent priority; used for stop signals.
    pub const STOP: Priority = Priority(0);
    /// Priority every input gets unless the caller says otherwise.
    pub const DEFAULT: Priority = Priority(100);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

impl From<u32> for Priority {
    fn from(value: u32) -> Self {
        Priority(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a worker finds when it dequeues an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<T> {
    Work(T),
    /// Tells the worker that dequeues it to exit.
    Stop,
}

impl<T> Payload<T> {
    pub fn is_stop(&self) -> bool {
        matches!(self, Payload::Stop)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem<T> {
    pub priority: Priority,
    pub payload: Payload<T>,
}

impl<T> QueueItem<T> {
    pub fn work(item: T, priority: Priority) -> Self {
        Self {
            priority,
            payload: Payload::Work(item),
        }
    }

    pub fn stop() -> Self {
        Self {
            priority: Priority::STOP,
            payload: Payload::Stop,
        }
    }
}
