pub mod fetch;
pub mod index;
pub mod quote;
pub mod search;
pub mod stats;
pub mod sync_all;
