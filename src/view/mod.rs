//! Session view controller and the navigation surface around it

pub mod controller;
pub mod navigation;
pub mod state;
pub mod welcome;

pub use controller::{
    FinalizeOutcome, SessionView, SessionViewParts, ViewOptions, DEFAULT_AGENT_JOIN_TIMEOUT,
};
pub use navigation::{ChannelNavigator, Navigator, Route};
pub use state::{derive_view_state, Controls, ViewState};
pub use welcome::{begin_interview, validate_email, EmailError};
