pub mod router;
pub mod scheduler;
