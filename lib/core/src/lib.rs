pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod module;
pub mod types;

pub use auth::{Actor, ActorResolver, HeaderResolver, Role, StaticResolver};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use module::Module;
pub use types::{new_id, ListResult};
