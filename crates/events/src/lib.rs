//! Session events and the in-process bus that distributes them.
//!
//! The client publishes sign-in/sign-out transitions, session expiry and
//! user-facing notices here; UI layers subscribe and react (toasts, route
//! changes, cache resets).

pub mod bus;
pub mod in_memory_bus;
pub mod session;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use session::{Notice, NoticeLevel, SessionEvent, SignOutReason};
