pub mod check;
pub mod cli;
pub mod command;
pub mod diff;
pub mod error;
pub mod extract;
pub mod github;
pub mod model;
pub mod report;
