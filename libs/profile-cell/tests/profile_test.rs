use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use profile_cell::{Document, DocumentService, ProfileError, ProfileService};
use shared_backend::BackendClient;
use shared_utils::test_support::TestConfig;

const TOKEN: &str = "tok-1";

fn backend_against(server: &MockServer) -> Arc<BackendClient> {
    let config = TestConfig::with_base_url(&server.uri()).to_app_config();
    Arc::new(BackendClient::new(&config))
}

#[tokio::test]
async fn fetch_profile_and_company_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers/cust-1/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customer_id": "cust-1",
            "name": "Pat Jones",
            "email": "pat@example.com"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/company"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Riverside Clinic",
            "phone": "555-0101"
        })))
        .mount(&server)
        .await;

    let service = ProfileService::new(backend_against(&server));
    let profile = service.fetch_profile("cust-1", TOKEN).await.unwrap();
    assert_eq!(profile.name, "Pat Jones");

    let company = service.fetch_company_info(TOKEN).await.unwrap();
    assert_eq!(company.name, "Riverside Clinic");
}

#[tokio::test]
async fn missing_profile_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers/ghost/profile"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such customer"))
        .mount(&server)
        .await;

    let service = ProfileService::new(backend_against(&server));
    let result = service.fetch_profile("ghost", TOKEN).await;

    assert_matches!(result, Err(ProfileError::NotFound(_)));
}

#[tokio::test]
async fn documents_get_absolute_urls_and_group_by_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers/cust-1/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "d1", "name": "Blood panel", "report_type": "Lab", "file_url": "/files/d1.pdf"},
            {"id": "d2", "name": "X-ray", "report_type": "Imaging", "file_url": "https://cdn.example/d2.pdf"},
            {"id": "d3", "name": "Lipids", "report_type": "Lab", "file_url": "/files/d3.pdf"},
            {"id": "d4", "name": "Referral letter", "report_type": "", "file_url": "/files/d4.pdf"}
        ])))
        .mount(&server)
        .await;

    let service = DocumentService::new(backend_against(&server));
    let documents = service.fetch_documents("cust-1", TOKEN).await.unwrap();

    assert!(documents[0].file_url.starts_with(&server.uri()));
    assert_eq!(documents[1].file_url, "https://cdn.example/d2.pdf");

    let groups = DocumentService::group_by_report_type(documents);
    let keys: Vec<&String> = groups.keys().collect();
    assert_eq!(keys, ["Imaging", "Lab", "Other"]);
    assert_eq!(groups["Lab"].len(), 2);
    assert_eq!(groups["Other"][0].id, "d4");
}

#[test]
fn grouping_empty_list_is_empty() {
    let groups = DocumentService::group_by_report_type(Vec::<Document>::new());
    assert!(groups.is_empty());
}
