pub mod city;
pub mod filters;
pub mod loader;
pub mod output;
pub mod prompt;
pub mod session;
pub mod stats;
