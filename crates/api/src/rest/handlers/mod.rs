//! REST-Handler Module

pub mod media;
pub mod sessions;
