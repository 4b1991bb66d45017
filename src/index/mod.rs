pub mod store;

pub use store::{IndexStore, PostingsByField};
