use crate::db::*;
use crate::types::TaskId;
use tempfile::NamedTempFile;


/// Fresh database with one project ("Proj") and one task under it
async fn seeded_db() -> (Database, TaskId, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let project_id = db
        .insert_project(&NewProject {
            name: "Proj".to_string(),
            settings: serde_json::json!({ "export_page_size": 2 }),
        })
        .await
        .unwrap();
    let task_id = db.insert_task(project_id).await.unwrap();

    (db, task_id, temp_file)
}
