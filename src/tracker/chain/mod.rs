pub mod api;
pub mod electrum;
pub mod mock;

#[cfg(test)]
mod tests;

pub use api::ChainApi;
pub use electrum::ElectrumChainClient;
pub use mock::MockChainClient;
