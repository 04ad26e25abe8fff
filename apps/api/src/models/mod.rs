pub mod resume;
pub mod survey;
pub mod user;
