use crate::error::BackendResult;
use crate::index::IndexManager;
use crate::model::Document;

/// Adds every document and commits once, so the batch becomes visible as a unit.
pub fn batch_add_documents(manager: &IndexManager, documents: &[Document]) -> BackendResult<usize> {
    let schema = manager.schema();
    let mut writer = manager.writer();

    for document in documents {
        if let Err(err) = writer.add_document(schema.to_document(document)) {
            if let Err(rollback_err) = writer.rollback() {
                tracing::error!("Rollback after failed add also failed: {}", rollback_err);
            }
            return Err(err.into());
        }
    }

    writer.commit()?;
    drop(writer);

    manager.refresh()?;
    Ok(documents.len())
}
