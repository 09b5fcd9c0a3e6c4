// Library exports for docpreview
pub mod auth_url;
pub mod cli;
pub mod clone;
pub mod command;
pub mod config;
pub mod git;
pub mod http;
pub mod lock;
pub mod output;
pub mod preview;
pub mod probe;
pub mod site;
pub mod status;
pub mod tail;
pub mod target;
