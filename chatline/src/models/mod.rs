mod contact;
mod message;
mod session;
mod types;
mod user;

pub use contact::*;
pub use message::*;
pub use session::*;
pub use types::*;
pub use user::*;
