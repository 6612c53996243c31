pub mod follow;

#[cfg(test)]
mod tests;

pub use follow::{follow, FollowStats};
