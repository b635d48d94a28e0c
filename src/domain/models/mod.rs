mod answer;
mod chunk;
mod collection;
mod embedding;
mod page;
mod scope;
mod search_result;

pub use answer::*;
pub use chunk::*;
pub use collection::*;
pub use embedding::*;
pub use page::*;
pub use scope::*;
pub use search_result::*;
