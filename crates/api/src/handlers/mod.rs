pub mod admin;
pub mod submissions;
