//! Fixture helpers for pre-populated project storage.

use crate::storage::StorageGateway;

/// Writes a representative set of pipeline artifacts into a project.
///
/// The project gets a raw upload, extraction output with its status files,
/// chunked and embedded documents, an indexing report, and a results file,
/// mirroring the layout left behind by a full pipeline run.
pub async fn populate_pipeline_output(storage: &dyn StorageGateway, project: &str) {
    storage
        .write_file(project, "documents/a.pdf", b"%PDF-1.4 fixture")
        .await;

    for (path, body) in [
        ("output/extraction_results/a.md", "# Extracted from a.pdf"),
        ("output/extraction_results/b.md", "# Extracted from b.pdf"),
        ("output/chunked_documents/a_chunks.json", r#"{"chunks": []}"#),
        ("output/chunked_documents/b_chunks.json", r#"{"chunks": []}"#),
        (
            "output/embedded_documents/a_embedded.json",
            r#"{"vectors": []}"#,
        ),
        ("output/indexing_reports/upload_1.md", "# Upload report"),
        ("output/embedding_report.md", "# Embedding report"),
    ] {
        storage.write_file(project, path, body.as_bytes()).await;
    }

    let status = serde_json::json!({ "documents_processed": 2 });
    storage
        .write_json(project, "output/extraction_status.json", &status)
        .await;
    let inventory = serde_json::json!({ "documents": ["a.pdf", "b.pdf"] });
    storage
        .write_json(project, "output/document_inventory.json", &inventory)
        .await;
    let results = serde_json::json!({ "sections": {} });
    storage
        .write_json(project, "output/results.json", &results)
        .await;
}
