pub mod client;

pub use client::MockChainClient;
