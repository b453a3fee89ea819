pub mod account;
pub mod correlation;
pub mod permission;
pub mod session;
pub mod user;
