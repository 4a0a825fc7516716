pub mod dto;
pub mod handlers;
pub mod repo;
pub mod status;
pub mod store;

pub use dto::Appointment;
