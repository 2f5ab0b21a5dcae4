pub use super::keywords::Entity as Keywords;
