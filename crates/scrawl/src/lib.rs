#![forbid(unsafe_code)]

//! `scrawl` turns diagram layout output into finished, self-consistent element scenes and renders
//! them to images.
//!
//! # Features
//!
//! - `render` (default): the rasterizer (`scrawl::render`) and the request-handling service
//!   (`scrawl::service`) with admission control and a shared, lazily created render backend

pub use scrawl_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use scrawl_render::*;
}

#[cfg(feature = "render")]
pub mod service;
