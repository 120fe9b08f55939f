pub mod composition;
pub mod definition;
pub mod grape;
pub mod ownership;
pub mod place;
pub mod rule;
