pub mod revenue_mapper;
pub mod session_mapper;
