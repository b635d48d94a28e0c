use anyhow::{bail, Result};

use crate::Commands;

use super::container::Container;
use super::controller::{
    AskController, CollectionsController, DeleteController, IngestController, SearchController, StatsController,
};

pub struct Router<'a> {
    ingest_controller: IngestController<'a>,
    search_controller: SearchController<'a>,
    ask_controller: AskController<'a>,
    delete_controller: DeleteController<'a>,
    stats_controller: StatsController<'a>,
    collections_controller: CollectionsController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            ingest_controller: IngestController::new(container),
            search_controller: SearchController::new(container),
            ask_controller: AskController::new(container),
            delete_controller: DeleteController::new(container),
            stats_controller: StatsController::new(container),
            collections_controller: CollectionsController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Ingest {
                path,
                document_id,
                title,
                collection,
            } => {
                self.ingest_controller
                    .ingest(path, document_id, title, collection)
                    .await
            }
            Commands::Search {
                query,
                top_k,
                collection,
                document,
                json,
            } => {
                self.search_controller
                    .search(query, top_k, collection, document, json)
                    .await
            }
            Commands::Ask {
                query,
                top_k,
                collection,
                document,
                json,
            } => {
                self.ask_controller
                    .ask(query, top_k, collection, document, json)
                    .await
            }
            Commands::Delete { chunk_ids } => self.delete_controller.delete(chunk_ids).await,
            Commands::Stats => self.stats_controller.stats().await,
            Commands::Collections { json } => self.collections_controller.list(json).await,
            Commands::Serve { .. } => bail!("the serve command is handled by the binary"),
        }
    }
}
