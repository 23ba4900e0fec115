pub mod store;
pub mod memory;
pub mod pg_store;

pub mod template_repo;
pub use template_repo::TemplateRepository;
pub mod slot_repo;
pub use slot_repo::SlotRepository;
pub mod booking_repo;
pub use booking_repo::BookingRepository;
pub mod subject_repo;
pub use subject_repo::SubjectRepository;

pub use memory::MemoryStore;
pub use pg_store::PgStore;
