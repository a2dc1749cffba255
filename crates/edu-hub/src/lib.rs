//! Browser-driven end-to-end suite for the Education Hub web application.
//!
//! The suite drives a real Chrome through WebDriver: it logs in as each
//! role, walks the role's pages, submits forms and checks both what the
//! pages render and which pages each role is kept out of.

pub use self::workflows::EducationHub;

pub mod access;
pub mod auth;
pub mod config;
pub mod fixtures;
pub mod pages;
pub mod session;
pub mod workflows;
