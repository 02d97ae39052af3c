pub mod compile;
pub mod link;
pub mod recipe;
