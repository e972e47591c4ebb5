// src/lib.rs

//! newspipe: scheduled crawl-then-analyze pipeline runner

pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod utils;
