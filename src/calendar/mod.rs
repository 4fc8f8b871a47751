pub mod aggregator;
pub mod event;
pub mod fetch;
pub mod source;

pub use aggregator::{AggregateState, Aggregator};
pub use event::{DisplayEvent, EventTime, RawEvent};
pub use fetch::{EventSource, HomeAssistantClient};
