//! Sample buffering and the live analysis pipeline

pub mod buffer;
pub mod frames;
pub mod processor;
pub mod rolling;
pub mod shared;

pub use buffer::{FeedConsumer, FeedProducer, SampleFeed};
pub use frames::{FramePool, ReadSlot, WriteSlot};
pub use processor::{MonitorStats, SpectrumFrame, SpectrumMonitor};
pub use rolling::RollingBuffer;
pub use shared::{HistorySnapshot, SharedRollingBuffer, TimedMutex, DEFAULT_LOCK_TIMEOUT};
