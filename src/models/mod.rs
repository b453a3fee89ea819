pub mod agreement;
pub mod card_type;
pub mod charge;
pub mod gateway_account;
pub mod json_patch;
pub mod product;
pub mod service;
pub mod stripe;
pub mod transaction;
pub mod user;
pub mod webhook;
