//! Minimal markup parsing for application pages

pub mod tokenizer;
pub mod tree;

pub use tokenizer::{Attribute, Token, Tokenizer};
pub use tree::{escape_attr, serialize, Document, Element, Node};
