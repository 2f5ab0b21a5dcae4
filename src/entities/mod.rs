pub mod prelude;

pub mod keywords;
