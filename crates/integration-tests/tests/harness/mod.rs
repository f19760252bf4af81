#![allow(dead_code)]

pub mod app;
pub mod config;
pub mod server;
pub mod sink;
