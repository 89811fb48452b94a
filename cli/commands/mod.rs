pub mod cat;
pub mod completion;
pub mod config;
pub mod export;
pub mod session;
pub mod tree;
