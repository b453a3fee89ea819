//! View-model shaping shared by the controllers.

pub mod card_types;
pub mod filters;
pub mod pagination;
pub mod stripe_details;
