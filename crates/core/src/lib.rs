pub mod category;
pub mod classify;
pub mod content;
pub mod event;
pub mod hooks;
pub mod label;
pub mod load;
pub mod merge;
pub mod normalize;
pub mod tally;
pub mod thread;
pub mod timeline;

pub use category::Category;
pub use event::{EventKind, EventPayload, NormalizedEvent, WireEvent};
pub use hooks::{adapt_hook_events, HookEventRecord};
pub use merge::merge_events;
pub use normalize::{normalize_records, SessionRecord};
pub use tally::tally_categories;
pub use thread::{build_thread_map, ThreadNode, ThreadRecord};
pub use timeline::{build_timeline, ActionItem, TimelineConfig, TimelineItem};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
