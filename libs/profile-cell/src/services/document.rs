// libs/profile-cell/src/services/document.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, instrument};

use shared_backend::BackendClient;

use crate::models::{Document, ProfileError};
use crate::services::profile::map_remote_error;

/// Document/report listing for the viewer screens.
pub struct DocumentService {
    backend: Arc<BackendClient>,
}

impl DocumentService {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, auth_token))]
    pub async fn fetch_documents(
        &self,
        customer_id: &str,
        auth_token: &str,
    ) -> Result<Vec<Document>, ProfileError> {
        let path = format!("/api/customers/{}/documents", customer_id);
        let mut documents: Vec<Document> = self
            .backend
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_remote_error)?;

        // Server-relative file paths become absolute for the viewer.
        for document in &mut documents {
            document.file_url = self.backend.get_file_url(&document.file_url);
        }

        debug!("Fetched {} documents", documents.len());
        Ok(documents)
    }

    /// Group documents by report type for the sectioned list view. Types
    /// sort alphabetically; untyped documents land under "Other".
    pub fn group_by_report_type(documents: Vec<Document>) -> BTreeMap<String, Vec<Document>> {
        let mut groups: BTreeMap<String, Vec<Document>> = BTreeMap::new();

        for document in documents {
            let key = if document.report_type.is_empty() {
                "Other".to_string()
            } else {
                document.report_type.clone()
            };
            groups.entry(key).or_default().push(document);
        }

        groups
    }
}
