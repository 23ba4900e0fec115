pub mod admin;
pub mod bookings;
pub mod dialog;
pub mod slots;
pub mod templates;
