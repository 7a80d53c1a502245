// src/model/mod.rs

//! Core data model: the [`Application`] catalog record and its derived
//! [`Screenshot`] assets.

mod application;
mod screenshot;

pub use application::{AppType, Application, Icon, Release};
pub use screenshot::Screenshot;
