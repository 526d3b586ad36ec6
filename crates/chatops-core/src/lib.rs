//! chatops-core: Automation Bridge Core Library
//!
//! Decision logic for bridging a chat front end to an automation hub:
//! session registration, command dispatch, broadcast fan-out and the hub
//! API client. Chat providers plug in through the `Transport` and
//! `EventHandler` seams and never leak wire types into this crate.

pub mod broadcast;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod hub;
pub mod menu;
pub mod registry;
pub mod transport;

pub use broadcast::Broadcaster;
pub use config::{BridgeConfig, HubConfig, PushConfig};
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use event::{Button, EventKind, InboundEvent, Keyboard, SendPayload, Target};
pub use hub::{CommandBackend, ExecOutcome, HubClient};
pub use menu::CommandMenu;
pub use registry::SessionRegistry;
pub use transport::{EventHandler, Transport};
