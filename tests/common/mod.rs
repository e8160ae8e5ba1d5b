//! Shared fixtures for result-export integration tests

use std::io::Read;
use std::path::Path;

use result_export::{Config, Database, NewProject, TaskId};
use tempfile::TempDir;

/// Config whose database and export scratch space live under `root`
pub fn test_config(root: &TempDir) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = root.path().join("results.db");
    config.export.temp_dir = root.path().join("exports");
    config.server.api.swagger_ui = false;
    config
}

/// Create a project and a task, then store `payloads` as the task's results
pub async fn seed(
    config: &Config,
    project_name: &str,
    settings: serde_json::Value,
    payloads: &[&str],
) -> TaskId {
    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();
    let project_id = db
        .insert_project(&NewProject {
            name: project_name.to_string(),
            settings,
        })
        .await
        .unwrap();
    let task_id = db.insert_task(project_id).await.unwrap();
    for payload in payloads {
        db.insert_result(task_id, payload).await.unwrap();
    }
    db.close().await;
    task_id
}

/// Entry name and contents of a single-entry tar.gz
pub fn unpack(archive: &Path) -> (String, String) {
    let file = std::fs::File::open(archive).unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let mut entry = archive.entries().unwrap().next().unwrap().unwrap();
    let name = entry.path().unwrap().to_string_lossy().into_owned();
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    (name, contents)
}

/// Number of entries left in the export scratch root
pub fn scratch_entries(config: &Config) -> usize {
    match std::fs::read_dir(&config.export.temp_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
