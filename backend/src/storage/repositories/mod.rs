// Repository modules
pub mod area_repository;
pub mod attendant_repository;
pub mod payment_repository;
pub mod session_repository;

// Re-export repository types
pub use area_repository::AreaRepository;
pub use attendant_repository::AttendantRepository;
pub use payment_repository::PaymentRepository;
pub use session_repository::SessionRepository;
