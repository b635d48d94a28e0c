use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Chunk, embed and index a document's extracted pages
    Ingest {
        /// A `.json` page list or a plain-text file with form-feed page breaks
        path: String,

        /// Document id; defaults to the file name without extension
        #[arg(long)]
        document_id: Option<String>,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Retrieve the chunks closest to a question
    Search {
        query: String,

        #[arg(short = 'k', long, default_value = "10")]
        top_k: usize,

        #[arg(short, long)]
        collection: Option<String>,

        /// Restrict to these document ids (repeatable)
        #[arg(short, long)]
        document: Option<Vec<String>>,

        #[arg(long)]
        json: bool,
    },

    /// Answer a question from the indexed documents, with citations
    Ask {
        query: String,

        #[arg(short = 'k', long, default_value = "10")]
        top_k: usize,

        #[arg(short, long)]
        collection: Option<String>,

        #[arg(short, long)]
        document: Option<Vec<String>>,

        #[arg(long)]
        json: bool,
    },

    /// Remove chunks by id
    Delete {
        #[arg(required = true)]
        chunk_ids: Vec<String>,
    },

    Stats,

    /// List indexed collections with document, page and chunk counts
    Collections {
        #[arg(long)]
        json: bool,
    },

    /// Serve the query and ingest API over HTTP
    Serve {
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,
    },
}
