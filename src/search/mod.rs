pub mod results;
pub mod suggest;

pub use results::{project, wildcard_hits};
pub use suggest::{group_into_suggestions, Suggestion};
