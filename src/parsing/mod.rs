pub mod article;
pub mod bibliography;
pub mod footnotes;
pub mod macros;
pub mod math;
pub mod sections;
pub mod tables;
pub mod text;

pub use article::{AppendixLink, ArticleParser};
pub use macros::MacroTable;
