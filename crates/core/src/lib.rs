//! Domain core of the video form: step definitions, the step sequencer and
//! its collaborators, and the read-side projections shared by the server
//! and the clients.

pub mod answers;
pub mod error;
pub mod gate;
pub mod pagination;
pub mod progress;
pub mod render;
pub mod sequencer;
pub mod steps;
pub mod submission;
pub mod types;
pub mod validation;
pub mod viewer;
