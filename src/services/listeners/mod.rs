pub mod creation_listener;
pub mod listener;

pub use creation_listener::{decode_creation, dispatch_logs, Correlations, Creation, CreationListener};
pub use listener::EventListener;
