pub mod auth;
pub mod bookings;
pub mod notifications;
pub mod reclamations;
pub mod tickets;
pub mod users;
