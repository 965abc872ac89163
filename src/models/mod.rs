pub mod bookingmodel;
pub mod reclamationmodel;
pub mod ticketmodel;
pub mod usermodel;
