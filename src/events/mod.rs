//! Display-event fan-out for the simulator.
//!
//! The simulator emits [`SimEvent`]s describing everything a renderer needs
//! to animate: run start/end, edge traversals, stage transitions, narrated
//! messages. An [`EventBus`] receives them over a channel and broadcasts to
//! pluggable [`EventSink`]s (stdout for demos, memory for tests); async
//! consumers subscribe through [`event_stream`] instead of a sink.

mod bus;
mod event;
mod sink;

use futures_util::Stream;

pub use bus::EventBus;
pub use event::SimEvent;
pub use sink::{EventSink, MemorySink, StdOutSink};

/// Adapt a raw event receiver into a [`Stream`] for async consumers (an SSE
/// endpoint, a websocket pump). Pairs with [`EventBus::get_sender`] when no
/// sink fan-out is needed.
pub fn event_stream(receiver: flume::Receiver<SimEvent>) -> impl Stream<Item = SimEvent> {
    receiver.into_stream()
}
