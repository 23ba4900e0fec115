pub mod events;
pub mod materializer;
pub mod generation_task;

pub mod schedule_service;
pub use schedule_service::ScheduleService;
pub mod booking_service;
pub use booking_service::BookingService;
pub mod dialog;
pub use dialog::DialogStore;
