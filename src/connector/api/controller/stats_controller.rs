use anyhow::Result;

use crate::application::IndexStats;

use super::super::Container;

pub struct StatsController<'a> {
    container: &'a Container,
}

impl<'a> StatsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn stats(&self) -> Result<String> {
        let stats = self.container.stats_use_case().execute().await?;
        Ok(self.format_stats(&stats))
    }

    fn format_stats(&self, stats: &IndexStats) -> String {
        format!(
            "Scriptorium Statistics\n======================\nBackend:      {}\nTotal Chunks: {}\nDocuments:    {}\nPages:        {}\nCollections:  {}\nEmbeddings:   {} ({} dims)\nData Dir:     {}",
            stats.backend,
            stats.chunk_count,
            stats.total_documents,
            stats.total_pages,
            stats.total_collections,
            stats.embedding_model,
            stats.dimensions,
            self.container.data_dir()
        )
    }
}
