pub mod defaults;

pub use defaults::DefaultKeywordList;
