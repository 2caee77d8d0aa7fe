//! Client side of the video form: the HTTP submission client and a terminal
//! driver that walks a user through the form.

pub mod api;
pub mod config;
pub mod terminal;
