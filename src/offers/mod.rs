pub mod code;
mod dto;
pub mod handlers;
pub mod issuer;
pub mod repo;
pub mod store;
