pub mod client;

pub use client::GuardianClient;

pub mod prelude {
    pub use super::GuardianClient;
    pub use gs_core::{Result, SearchClient, SearchError, SearchQuery};
}
