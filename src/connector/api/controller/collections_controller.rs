use anyhow::Result;

use crate::domain::CollectionSummary;

use super::super::Container;

pub struct CollectionsController<'a> {
    container: &'a Container,
}

impl<'a> CollectionsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn list(&self, json: bool) -> Result<String> {
        let collections = self.container.collections_use_case().execute().await?;
        if json {
            return Ok(serde_json::to_string_pretty(&collections)?);
        }
        Ok(format_collections(&collections))
    }
}

fn format_collections(collections: &[CollectionSummary]) -> String {
    if collections.is_empty() {
        return "No collections indexed.".to_string();
    }

    let width = collections
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        .max("Collection".len());

    let mut output = format!(
        "{:<width$}  {:>9}  {:>6}  {:>7}\n",
        "Collection", "Documents", "Pages", "Chunks"
    );
    for c in collections {
        output.push_str(&format!(
            "{:<width$}  {:>9}  {:>6}  {:>7}\n",
            c.name, c.document_count, c.page_count, c.chunk_count
        ));
    }
    output
}
