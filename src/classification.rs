use crate::error::ServiceError;
use crate::record::Dataset;
use serde::{Deserialize, Serialize};

/// Privacy role of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Identifier,
    QuasiIdentifier,
    Sensitive,
    NonSensitive,
}

/// Semantic type of a quasi-identifier, used by the service to pick a generalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticType {
    Text,
    Place,
    Date,
    Age,
    Numeric,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnClassification {
    pub role: Option<Role>,
    pub semantic_type: Option<SemanticType>,
}

impl ColumnClassification {
    /// A role is set, and quasi-identifiers also carry a semantic type.
    pub fn is_complete(&self) -> bool {
        match self.role {
            None => false,
            Some(Role::QuasiIdentifier) => self.semantic_type.is_some(),
            Some(_) => true,
        }
    }
}

///
/// The edit in progress for the active column. Nothing reaches the store until
/// it is committed, either explicitly or by switching to another column.
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub column: String,
    pub classification: ColumnClassification,
}

///
/// Classification of every column of the loaded dataset, in header order.
///
/// Entries exist exactly for the header columns: they are created by `initialize`
/// and only ever updated afterwards.
///
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationStore {
    entries: Vec<(String, ColumnClassification)>,
    draft: Option<Draft>,
}

impl ClassificationStore {
    pub fn new(dataset: &Dataset) -> Self {
        let mut store = Self::default();
        store.initialize(dataset);
        store
    }

    /// Replaces every entry with an unset classification per header column.
    pub fn initialize(&mut self, dataset: &Dataset) {
        self.entries = dataset
            .headers()
            .iter()
            .map(|column| (column.clone(), ColumnClassification::default()))
            .collect();
        self.draft = None;
    }

    pub fn get(&self, column: &str) -> Option<&ColumnClassification> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, classification)| classification)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnClassification)> {
        self.entries
            .iter()
            .map(|(name, classification)| (name.as_str(), classification))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_column(&self) -> Option<&str> {
        self.draft.as_ref().map(|draft| draft.column.as_str())
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    ///
    /// Makes `column` the active column.
    ///
    /// The draft of the previously active column is committed first, then the draft
    /// is loaded with whatever is already stored for `column`.
    ///
    pub fn set_active_column(&mut self, column: &str) -> Result<(), ServiceError> {
        let stored = *self.get(column).ok_or_else(|| unknown_column(column))?;
        self.commit();
        self.draft = Some(Draft {
            column: column.to_string(),
            classification: stored,
        });
        Ok(())
    }

    pub fn set_role(&mut self, role: Role) -> Result<(), ServiceError> {
        let draft = self.draft_mut()?;
        draft.classification.role = Some(role);
        Ok(())
    }

    /// Only quasi-identifiers take a semantic type.
    pub fn set_semantic_type(&mut self, semantic_type: SemanticType) -> Result<(), ServiceError> {
        let draft = self.draft_mut()?;
        if draft.classification.role != Some(Role::QuasiIdentifier) {
            return Err(ServiceError::validation(format!(
                "Column '{}' must be a quasi-identifier to take a data type",
                draft.column
            )));
        }
        draft.classification.semantic_type = Some(semantic_type);
        Ok(())
    }

    /// Persists the active draft into the store. The column stays active.
    /// Returns whether the stored classification changed.
    pub fn commit(&mut self) -> bool {
        let Some(draft) = self.draft.as_ref() else {
            return false;
        };
        match self
            .entries
            .iter_mut()
            .find(|(name, _)| *name == draft.column)
        {
            Some((_, slot)) if *slot != draft.classification => {
                *slot = draft.classification;
                tracing::debug!(
                    column = %draft.column,
                    role = ?draft.classification.role,
                    semantic_type = ?draft.classification.semantic_type,
                    "committed classification"
                );
                true
            }
            _ => false,
        }
    }

    /// Columns whose committed classification does not allow anonymization yet.
    pub fn incomplete_columns(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, classification)| !classification.is_complete())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, classification)| classification.is_complete())
    }

    /// Same check as `is_complete`, reported as the blocking validation message.
    pub fn ensure_complete(&self) -> Result<(), ServiceError> {
        let missing = self.incomplete_columns();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::validation(format!(
                "Please configure all attributes before proceeding (missing: {})",
                missing.join(", ")
            )))
        }
    }

    fn draft_mut(&mut self) -> Result<&mut Draft, ServiceError> {
        self.draft
            .as_mut()
            .ok_or_else(|| ServiceError::validation("No column selected"))
    }
}

fn unknown_column(column: &str) -> ServiceError {
    ServiceError::validation(format!("Unknown column '{}'", column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::parse_csv;

    fn store() -> ClassificationStore {
        ClassificationStore::new(&parse_csv("A,B,C\n1,2,3\n").unwrap())
    }

    fn classify(
        store: &mut ClassificationStore,
        column: &str,
        role: Role,
        semantic_type: Option<SemanticType>,
    ) {
        store.set_active_column(column).unwrap();
        store.set_role(role).unwrap();
        if let Some(semantic_type) = semantic_type {
            store.set_semantic_type(semantic_type).unwrap();
        }
        store.commit();
    }

    #[test]
    fn starts_unset_in_header_order() {
        let store = store();
        let columns: Vec<&str> = store.iter().map(|(name, _)| name).collect();
        assert_eq!(columns, vec!["A", "B", "C"]);
        assert!(store
            .iter()
            .all(|(_, c)| *c == ColumnClassification::default()));
        assert!(!store.is_complete());
    }

    #[test]
    fn draft_commits_on_switch() {
        let mut store = store();
        store.set_active_column("A").unwrap();
        store.set_role(Role::Identifier).unwrap();
        assert_eq!(store.get("A").unwrap().role, None);

        store.set_active_column("B").unwrap();
        assert_eq!(store.get("A").unwrap().role, Some(Role::Identifier));
        assert_eq!(store.active_column(), Some("B"));
    }

    #[test]
    fn switching_back_loads_stored_values() {
        let mut store = store();
        classify(&mut store, "C", Role::QuasiIdentifier, Some(SemanticType::Date));
        store.set_active_column("A").unwrap();
        store.set_active_column("C").unwrap();
        let draft = store.draft().unwrap();
        assert_eq!(draft.classification.role, Some(Role::QuasiIdentifier));
        assert_eq!(draft.classification.semantic_type, Some(SemanticType::Date));
    }

    #[test]
    fn unset_role_is_incomplete() {
        let mut store = store();
        classify(&mut store, "A", Role::Identifier, None);
        classify(&mut store, "B", Role::Sensitive, None);
        assert!(!store.is_complete());
        assert_eq!(store.incomplete_columns(), vec!["C"]);
    }

    #[test]
    fn quasi_identifier_needs_semantic_type() {
        let mut store = store();
        classify(&mut store, "A", Role::Identifier, None);
        classify(&mut store, "B", Role::Sensitive, None);
        classify(&mut store, "C", Role::QuasiIdentifier, None);
        assert!(!store.is_complete());
        let err = store.ensure_complete().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.msg.contains("missing: C"));

        classify(&mut store, "C", Role::QuasiIdentifier, Some(SemanticType::Age));
        assert!(store.is_complete());
        assert!(store.ensure_complete().is_ok());
    }

    #[test]
    fn non_sensitive_counts_as_set() {
        let mut store = store();
        for column in ["A", "B", "C"] {
            classify(&mut store, column, Role::NonSensitive, None);
        }
        assert!(store.is_complete());
    }

    #[test]
    fn semantic_type_requires_quasi_identifier() {
        let mut store = store();
        store.set_active_column("A").unwrap();
        store.set_role(Role::Sensitive).unwrap();
        let err = store.set_semantic_type(SemanticType::Text).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn edits_need_an_active_column() {
        let mut store = store();
        assert!(store.set_role(Role::Identifier).is_err());
        assert!(store.set_active_column("Z").is_err());
    }

    #[test]
    fn uncommitted_draft_does_not_count() {
        let mut store = store();
        classify(&mut store, "A", Role::Identifier, None);
        classify(&mut store, "B", Role::Identifier, None);
        store.set_active_column("C").unwrap();
        store.set_role(Role::Sensitive).unwrap();
        assert!(!store.is_complete());
        store.commit();
        assert!(store.is_complete());
    }

    #[test]
    fn initialize_discards_previous_columns() {
        let mut store = store();
        classify(&mut store, "A", Role::Identifier, None);
        store.initialize(&parse_csv("X,Y\n1,2\n").unwrap());
        let columns: Vec<&str> = store.iter().map(|(name, _)| name).collect();
        assert_eq!(columns, vec!["X", "Y"]);
        assert_eq!(store.active_column(), None);
        assert!(store.get("A").is_none());
    }

    #[test]
    fn commit_reports_changes() {
        let mut store = store();
        assert!(!store.commit());
        store.set_active_column("A").unwrap();
        assert!(!store.commit());
        store.set_role(Role::Identifier).unwrap();
        assert!(store.commit());
        assert!(!store.commit());
    }
}
