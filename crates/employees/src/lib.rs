//! Employee records for the Staffdesk backend.

pub mod entity;
pub mod repository;

pub use entity::Employee;
pub use repository::EmployeeRepository;
