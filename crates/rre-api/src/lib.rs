pub mod auth;
pub mod chat;
pub mod comments;
pub mod error;
pub mod likes;
pub mod registrations;
pub mod router;
pub mod state;
pub mod storage;
pub mod uploads;
pub mod wall;

pub use router::router;
pub use state::{AppState, AppStateInner};
