pub mod document;
pub mod mcq_item;
pub use document::Document;
pub use mcq_item::McqItem;
