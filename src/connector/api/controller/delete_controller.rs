use anyhow::Result;

use super::super::Container;

pub struct DeleteController<'a> {
    container: &'a Container,
}

impl<'a> DeleteController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn delete(&self, chunk_ids: Vec<String>) -> Result<String> {
        let removed = self.container.delete_use_case().execute(&chunk_ids).await?;
        Ok(format!(
            "Deleted {} of {} requested chunks.",
            removed,
            chunk_ids.len()
        ))
    }
}
