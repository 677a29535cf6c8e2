pub mod attendance;
pub mod core;
pub mod exchange;
pub mod stats;
pub mod students;
