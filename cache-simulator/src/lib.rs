// Cache Simulator Library

pub mod demo;
pub mod generator;
pub mod models;
pub mod runner;
pub mod stats;
