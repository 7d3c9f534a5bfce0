pub mod handlers;
pub mod roster;
