use crate::classification::{ClassificationStore, Role, SemanticType};
use crate::record::Dataset;
use serde::{Deserialize, Serialize};

/// Wire code for a column role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdType {
    #[serde(rename = "i")]
    Identifier,
    #[serde(rename = "qi")]
    QuasiIdentifier,
    #[serde(rename = "s")]
    Sensitive,
    #[serde(rename = "n")]
    NonSensitive,
}

/// Wire code for a quasi-identifier's data type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Place,
    Date,
    Int,
    Double,
}

impl From<Option<Role>> for IdType {
    fn from(role: Option<Role>) -> Self {
        match role {
            Some(Role::Identifier) => IdType::Identifier,
            Some(Role::QuasiIdentifier) => IdType::QuasiIdentifier,
            Some(Role::Sensitive) => IdType::Sensitive,
            Some(Role::NonSensitive) | None => IdType::NonSensitive,
        }
    }
}

impl From<Option<SemanticType>> for DataType {
    fn from(semantic_type: Option<SemanticType>) -> Self {
        match semantic_type {
            Some(SemanticType::Place) => DataType::Place,
            Some(SemanticType::Date) => DataType::Date,
            Some(SemanticType::Age) => DataType::Int,
            Some(SemanticType::Numeric) => DataType::Double,
            Some(SemanticType::Text) | None => DataType::String,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "IDType")]
    pub id_type: IdType,
    #[serde(rename = "DateType")]
    pub data_type: DataType,
    /// Primary keys are not supported, always false.
    #[serde(rename = "PK")]
    pub primary_key: bool,
}

/// Body of `POST /api/anonymize`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizationRequest {
    pub dataset: Dataset,
    pub metadata: Vec<ColumnMetadata>,
}

impl AnonymizationRequest {
    /// Names of the columns sent as sensitive, in metadata order.
    pub fn sensitive_columns(&self) -> Vec<&str> {
        sensitive_columns(&self.metadata)
    }
}

/// Body returned by the service; `dataset` is itself a JSON-encoded matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizationResponse {
    pub dataset: String,
}

pub fn sensitive_columns(metadata: &[ColumnMetadata]) -> Vec<&str> {
    metadata
        .iter()
        .filter(|column| column.id_type == IdType::Sensitive)
        .map(|column| column.name.as_str())
        .collect()
}

///
/// Builds the request payload from the dataset and its committed classifications.
///
/// Metadata follows the store's column order. No side effects.
///
pub fn build_request(dataset: &Dataset, store: &ClassificationStore) -> AnonymizationRequest {
    let metadata = store
        .iter()
        .map(|(name, classification)| ColumnMetadata {
            name: name.to_string(),
            id_type: IdType::from(classification.role),
            data_type: DataType::from(classification.semantic_type),
            primary_key: false,
        })
        .collect();
    AnonymizationRequest {
        dataset: dataset.clone(),
        metadata,
    }
}
