pub const HISTORY_LIMIT: usize = 100;
pub const RECENT_HISTORY_CONTEXT: usize = 5;
pub const WORKFLOW_VERSION: u32 = 1;

pub const DEFAULT_PREVIEW_PATH: &str = "index.html";
pub const EXPORT_HTML_FILENAME: &str = "appletflow-app.html";
pub const EXPORT_ZIP_FILENAME: &str = "appletflow-project.zip";
pub const README_FILENAME: &str = "README.txt";

// local store keys
pub const WORKFLOW_KEY: &str = "appletflow.workflow";
pub const LAST_PROJECT_KEY: &str = "appletflow.last_project";
pub const HISTORY_KEY: &str = "appletflow.history";
pub const PREVIEW_ID_KEY: &str = "appletflow.preview_id";
