use crate::classification::{Role, SemanticType};
use crate::session::View;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DataFile {
    pub bucket: String,
    pub key: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub semantic_type: Option<SemanticType>,
}

/// Event handled by the anonymize job.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymizeJob {
    pub data: DataFile,
    pub columns: Vec<ColumnSpec>,
    /// Table written to the output object, the anonymized one unless asked otherwise.
    #[serde(default = "default_view")]
    pub view: View,
}

fn default_view() -> View {
    View::Anonymized
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct JobResult {
    pub bucket: String,
    pub key: String,
    pub rows: usize,
    pub columns: usize,
}
