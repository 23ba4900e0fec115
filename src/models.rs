pub mod booking;
pub mod dialog;
pub mod events;
pub mod schedule;
pub mod subject;
