#![forbid(unsafe_code)]

//! Unified event bus for inline media rendering.

mod bus;
mod event;
mod render;
mod set;

pub use bus::EventBus;
pub use event::Event;
pub use render::RenderEvent;
pub use set::SetEvent;
