//! Item-backed pack inventories, the container session layer, and the
//! shift-click transfer policy.

mod backed;
mod player;
mod session;
mod views;

pub use backed::*;
pub use player::*;
pub use session::*;
pub use views::*;
