pub mod feedback;
pub mod student;
pub mod teacher;
