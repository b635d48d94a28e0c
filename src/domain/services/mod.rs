mod collection_catalog;
mod metadata_filter;
mod prompt;
mod similarity_ranker;

pub use collection_catalog::*;
pub use metadata_filter::*;
pub use prompt::*;
pub use similarity_ranker::*;
