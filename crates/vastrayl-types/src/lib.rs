pub mod claim;
pub mod config;
pub mod general;

pub use general::UserId;
