use crate::classification::{ClassificationStore, Role, SemanticType};
use crate::client::AnonymizerClient;
use crate::error::ServiceError;
use crate::export::{to_csv, ExportFormat};
use crate::parser::parse_csv;
use crate::reassemble::{decode_matrix, merge_sensitive};
use crate::record::Dataset;
use crate::request::{build_request, AnonymizationRequest, AnonymizationResponse, ColumnMetadata};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Empty,
    Loaded,
    Classifying,
    Submitting,
    Anonymized,
    Failed {
        reason: String,
    },
}

/// Which table is displayed. Switching view never changes the phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    #[default]
    Original,
    Anonymized,
}

///
/// State of one dashboard session: the loaded dataset, its classifications and
/// the last anonymized result.
///
/// Every transition goes through a method here. At most one anonymization runs
/// at a time; a second submit while `Submitting` fails with an in-flight error.
///
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    phase: Phase,
    #[serde(with = "crate::record::framed")]
    dataset: Option<Dataset>,
    store: ClassificationStore,
    in_flight: Option<Vec<ColumnMetadata>>,
    #[serde(with = "crate::record::framed")]
    anonymized: Option<Dataset>,
    view: View,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn store(&self) -> &ClassificationStore {
        &self.store
    }

    pub fn anonymized(&self) -> Option<&Dataset> {
        self.anonymized.as_ref()
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Parses `text` and replaces the session contents. On a parse error nothing changes.
    pub fn load_csv(&mut self, text: &str) -> Result<(), ServiceError> {
        let dataset = parse_csv(text)?;
        self.load(dataset);
        Ok(())
    }

    /// Replaces the dataset, resetting classifications and any anonymized result.
    pub fn load(&mut self, dataset: Dataset) {
        if self.in_flight.take().is_some() {
            tracing::warn!("dataset replaced while an anonymization was in flight");
        }
        tracing::info!(
            rows = dataset.len(),
            columns = dataset.headers().len(),
            "dataset loaded"
        );
        self.store.initialize(&dataset);
        self.dataset = Some(dataset);
        self.anonymized = None;
        self.view = View::Original;
        self.phase = Phase::Loaded;
    }

    pub fn set_active_column(&mut self, column: &str) -> Result<(), ServiceError> {
        self.ensure_editable()?;
        self.store.set_active_column(column)?;
        self.phase = Phase::Classifying;
        Ok(())
    }

    pub fn set_role(&mut self, role: Role) -> Result<(), ServiceError> {
        self.ensure_editable()?;
        self.store.set_role(role)?;
        self.phase = Phase::Classifying;
        Ok(())
    }

    pub fn set_semantic_type(&mut self, semantic_type: SemanticType) -> Result<(), ServiceError> {
        self.ensure_editable()?;
        self.store.set_semantic_type(semantic_type)?;
        self.phase = Phase::Classifying;
        Ok(())
    }

    /// The phase only moves to `Classifying` when the store actually changed.
    pub fn commit(&mut self) -> Result<(), ServiceError> {
        self.ensure_editable()?;
        if self.store.commit() {
            self.phase = Phase::Classifying;
        }
        Ok(())
    }

    ///
    /// Moves to `Submitting` and returns the payload to send.
    ///
    /// Refused while another request is in flight, or while the committed
    /// classification is incomplete (the phase is left as it was).
    ///
    pub fn begin_submit(&mut self) -> Result<AnonymizationRequest, ServiceError> {
        if self.phase == Phase::Submitting {
            return Err(ServiceError::in_flight(
                "An anonymization is already in progress",
            ));
        }
        let dataset = self.loaded_dataset()?;
        if let Err(err) = self.store.ensure_complete() {
            tracing::warn!(msg = %err.msg, "not all attributes are configured");
            return Err(err);
        }
        let request = build_request(dataset, &self.store);
        self.in_flight = Some(request.metadata.clone());
        self.phase = Phase::Submitting;
        Ok(request)
    }

    ///
    /// Applies the outcome of the request started by `begin_submit`.
    ///
    /// A decoded response is merged with the original sensitive values and shown.
    /// A transport error or an undecodable response moves to `Failed` and is
    /// returned to the caller.
    ///
    pub fn complete_submit(
        &mut self,
        outcome: Result<AnonymizationResponse, ServiceError>,
    ) -> Result<&Dataset, ServiceError> {
        let metadata = match (&self.phase, self.in_flight.take()) {
            (Phase::Submitting, Some(metadata)) => metadata,
            _ => {
                return Err(ServiceError::internal_server_error(
                    "No anonymization in flight",
                ))
            }
        };
        let merged = outcome
            .and_then(|response| decode_matrix(&response.dataset))
            .and_then(|anonymized| {
                let original = self.loaded_dataset()?;
                Ok(merge_sensitive(original, anonymized, &metadata))
            });
        match merged {
            Ok(dataset) => {
                tracing::info!(rows = dataset.len(), "anonymized dataset received");
                self.phase = Phase::Anonymized;
                self.view = View::Anonymized;
                Ok(&*self.anonymized.insert(dataset))
            }
            Err(err) => {
                tracing::error!(kind = ?err.kind, msg = %err.msg, "anonymization failed");
                self.phase = Phase::Failed {
                    reason: err.msg.clone(),
                };
                self.anonymized = None;
                self.view = View::Original;
                Err(err)
            }
        }
    }

    /// Runs one full request/response cycle against `client`.
    pub async fn anonymize(&mut self, client: &AnonymizerClient) -> Result<&Dataset, ServiceError> {
        let request = self.begin_submit()?;
        let outcome = client.anonymize(&request).await;
        self.complete_submit(outcome)
    }

    /// Commits the active column's draft, then anonymizes.
    pub async fn commit_and_anonymize(
        &mut self,
        client: &AnonymizerClient,
    ) -> Result<&Dataset, ServiceError> {
        self.commit()?;
        self.anonymize(client).await
    }

    pub fn show_anonymized(&mut self, show: bool) -> Result<(), ServiceError> {
        if show && self.anonymized.is_none() {
            return Err(ServiceError::validation("No anonymized data to show"));
        }
        self.view = if show { View::Anonymized } else { View::Original };
        Ok(())
    }

    pub fn current_view(&self) -> Option<&Dataset> {
        match self.view {
            View::Original => self.dataset.as_ref(),
            View::Anonymized => self.anonymized.as_ref(),
        }
    }

    pub fn export_current(&self, format: ExportFormat) -> Result<String, ServiceError> {
        let dataset = self
            .current_view()
            .ok_or_else(|| ServiceError::export("No anonymized data to download."))?;
        to_csv(dataset, format)
    }

    fn loaded_dataset(&self) -> Result<&Dataset, ServiceError> {
        self.dataset
            .as_ref()
            .ok_or_else(|| ServiceError::validation("No dataset loaded"))
    }

    fn ensure_editable(&self) -> Result<(), ServiceError> {
        if self.phase == Phase::Submitting {
            return Err(ServiceError::in_flight(
                "Classifications are locked while an anonymization is in progress",
            ));
        }
        self.loaded_dataset().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::record::RowRecord;

    const PEOPLE: &str = "Name,City,Age\nAlice,Rome,30\nBob,Milan,41\n";

    fn classified() -> Session {
        let mut session = Session::new();
        session.load_csv(PEOPLE).unwrap();
        session.set_active_column("Name").unwrap();
        session.set_role(Role::Sensitive).unwrap();
        session.set_active_column("City").unwrap();
        session.set_role(Role::QuasiIdentifier).unwrap();
        session.set_semantic_type(SemanticType::Place).unwrap();
        session.set_active_column("Age").unwrap();
        session.set_role(Role::QuasiIdentifier).unwrap();
        session.set_semantic_type(SemanticType::Age).unwrap();
        session.commit().unwrap();
        session
    }

    fn response(matrix: &str) -> Result<AnonymizationResponse, ServiceError> {
        Ok(AnonymizationResponse {
            dataset: matrix.to_string(),
        })
    }

    #[test]
    fn load_moves_to_loaded() {
        let mut session = Session::new();
        assert_eq!(session.phase(), &Phase::Empty);
        session.load_csv(PEOPLE).unwrap();
        assert_eq!(session.phase(), &Phase::Loaded);
        assert_eq!(session.store().len(), 3);
        assert_eq!(session.current_view().unwrap().len(), 2);
    }

    #[test]
    fn failed_parse_keeps_previous_dataset() {
        let mut session = classified();
        let err = session.load_csv("A,B\n1\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert_eq!(session.phase(), &Phase::Classifying);
        assert_eq!(session.dataset().unwrap().headers(), ["Name", "City", "Age"]);
        assert!(session.store().is_complete());
    }

    #[test]
    fn edits_need_a_dataset() {
        let mut session = Session::new();
        let err = session.set_active_column("Name").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(session.phase(), &Phase::Empty);
    }

    #[test]
    fn incomplete_classification_blocks_submit() {
        let mut session = Session::new();
        session.load_csv(PEOPLE).unwrap();
        session.set_active_column("Name").unwrap();
        session.set_role(Role::Sensitive).unwrap();
        let err = session.begin_submit().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(session.phase(), &Phase::Classifying);
    }

    #[test]
    fn second_submit_is_rejected_while_in_flight() {
        let mut session = classified();
        session.begin_submit().unwrap();
        assert_eq!(session.phase(), &Phase::Submitting);
        assert_eq!(session.begin_submit().unwrap_err().kind, ErrorKind::InFlight);
        assert_eq!(
            session.set_role(Role::Identifier).unwrap_err().kind,
            ErrorKind::InFlight
        );
    }

    #[test]
    fn response_is_merged_and_shown() {
        let mut session = classified();
        session.begin_submit().unwrap();
        session
            .complete_submit(response(
                r#"[["Name","City","Age"],["XXX","IT-Center","3*"],["YYY","IT-North","4*"]]"#,
            ))
            .unwrap();
        assert_eq!(session.phase(), &Phase::Anonymized);
        assert_eq!(session.view(), View::Anonymized);
        assert_eq!(
            session.current_view().unwrap().rows(),
            [
                RowRecord::from_pairs([("Name", "Alice"), ("City", "IT-Center"), ("Age", "3*")]),
                RowRecord::from_pairs([("Name", "Bob"), ("City", "IT-North"), ("Age", "4*")]),
            ]
        );
    }

    #[test]
    fn transport_failure_is_an_explicit_state() {
        let mut session = classified();
        session.begin_submit().unwrap();
        let err = session
            .complete_submit(Err(ServiceError::network("connection refused")))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(
            session.phase(),
            &Phase::Failed {
                reason: "connection refused".to_string()
            }
        );
        assert!(session.anonymized().is_none());
        assert_eq!(session.view(), View::Original);

        session.begin_submit().unwrap();
        assert_eq!(session.phase(), &Phase::Submitting);
    }

    #[test]
    fn malformed_response_fails() {
        let mut session = classified();
        session.begin_submit().unwrap();
        let err = session.complete_submit(response("oops")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
        assert!(matches!(session.phase(), Phase::Failed { .. }));
    }

    #[test]
    fn completion_without_submit_is_refused() {
        let mut session = classified();
        assert!(session.complete_submit(response("[[\"A\"]]")).is_err());
        assert_eq!(session.phase(), &Phase::Classifying);
    }

    #[test]
    fn toggle_switches_view_only() {
        let mut session = classified();
        assert!(session.show_anonymized(true).is_err());
        session.begin_submit().unwrap();
        session
            .complete_submit(response(r#"[["Name","City","Age"],["X","C","3*"]]"#))
            .unwrap();
        session.show_anonymized(false).unwrap();
        assert_eq!(session.current_view().unwrap().rows()[0].get("City"), Some("Rome"));
        assert_eq!(session.phase(), &Phase::Anonymized);
        session.show_anonymized(true).unwrap();
        assert_eq!(session.current_view().unwrap().rows()[0].get("City"), Some("C"));
    }

    #[test]
    fn new_load_discards_anonymized_result() {
        let mut session = classified();
        session.begin_submit().unwrap();
        session
            .complete_submit(response(r#"[["Name","City","Age"],["X","C","3*"]]"#))
            .unwrap();

        session.load_csv("Id,Zip\n1,00100\n").unwrap();
        assert_eq!(session.phase(), &Phase::Loaded);
        assert!(session.anonymized().is_none());
        assert_eq!(session.view(), View::Original);
        let columns: Vec<&str> = session.store().iter().map(|(name, _)| name).collect();
        assert_eq!(columns, vec!["Id", "Zip"]);
        assert!(session
            .store()
            .iter()
            .all(|(_, classification)| classification.role.is_none()));
    }

    #[test]
    fn load_during_flight_drops_late_response() {
        let mut session = classified();
        session.begin_submit().unwrap();
        session.load_csv("Id\n1\n").unwrap();
        assert!(session
            .complete_submit(response(r#"[["Name"],["X"]]"#))
            .is_err());
        assert_eq!(session.phase(), &Phase::Loaded);
    }

    #[test]
    fn export_follows_view() {
        let mut session = classified();
        assert_eq!(
            session.export_current(ExportFormat::Rfc4180).unwrap(),
            PEOPLE
        );
        assert_eq!(
            Session::new().export_current(ExportFormat::Rfc4180).unwrap_err().kind,
            ErrorKind::Export
        );
        session.begin_submit().unwrap();
        session
            .complete_submit(response(r#"[["Name","City","Age"],["X","C","3*"]]"#))
            .unwrap();
        assert_eq!(
            session.export_current(ExportFormat::Rfc4180).unwrap(),
            "Name,City,Age\nAlice,C,3*\n"
        );
    }

    #[test]
    fn commit_without_changes_keeps_phase() {
        let mut session = Session::new();
        session.load_csv(PEOPLE).unwrap();
        session.commit().unwrap();
        assert_eq!(session.phase(), &Phase::Loaded);

        let mut session = classified();
        session.begin_submit().unwrap();
        session
            .complete_submit(response(r#"[["Name","City","Age"],["X","C","3*"]]"#))
            .unwrap();
        session.commit().unwrap();
        assert_eq!(session.phase(), &Phase::Anonymized);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut session = Session::new();
        session.load_csv("A,B\n").unwrap();
        session.set_active_column("A").unwrap();
        session.set_role(Role::Identifier).unwrap();
        session.commit().unwrap();

        let text = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&text).unwrap();
        assert_eq!(back.dataset(), session.dataset());
        assert_eq!(back.dataset().unwrap().headers(), ["A", "B"]);
        assert_eq!(back.store(), session.store());
        assert_eq!(back.phase(), &Phase::Classifying);

        let mut session = classified();
        session.begin_submit().unwrap();
        session
            .complete_submit(response(r#"[["Name","City","Age"],["X","C","3*"]]"#))
            .unwrap();
        let text = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&text).unwrap();
        assert_eq!(back.anonymized(), session.anonymized());
        assert_eq!(back.view(), View::Anonymized);
        assert_eq!(back.phase(), &Phase::Anonymized);
    }
}
