//! Runnable modules bundling jobs and providing a unified configuration

pub mod options;

pub mod proxy;
