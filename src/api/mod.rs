pub mod attendance;
pub mod teacher;
