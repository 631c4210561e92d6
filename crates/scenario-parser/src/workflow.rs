use std::path::Path;

use text_tester_core_types::WorkflowId;
use tracing::debug;

use crate::errors::ParseError;

/// Derives the workflow for a scenario file and makes sure its cache
/// directory exists under `cache_root`.
pub fn determine_workflow(path: &Path, cache_root: &Path) -> Result<WorkflowId, ParseError> {
    let workflow = WorkflowId::from_scenario_path(path);
    let dir = cache_root.join(workflow.as_str());
    std::fs::create_dir_all(&dir).map_err(|source| ParseError::CacheDir {
        path: dir.clone(),
        source,
    })?;
    debug!(workflow = %workflow, cache = %dir.display(), "workflow resolved");
    Ok(workflow)
}
