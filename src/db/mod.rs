pub mod bookingdb;
pub mod db;
pub mod reclamationdb;
pub mod ticketdb;
pub mod userdb;
