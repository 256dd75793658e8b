use anyhow::Result;
use httpmock::prelude::*;
use lead_intake::adapters::{FileMemory, ManualClock, NominatimGeocoder, SupabaseLeadStore};
use lead_intake::core::{BusinessId, Field};
use lead_intake::{DisplayState, FormSettings, SubmissionController, SubmitError, TomlConfig};
use std::time::Duration;
use tempfile::TempDir;

const BUSINESS: &str = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";

fn stored_row() -> serde_json::Value {
    serde_json::json!([{
        "id": "9b2d7c1e-1111-4000-8000-000000000042",
        "created_at": "2026-10-18T09:30:00+00:00",
        "status": "new"
    }])
}

fn build_controller(
    server: &MockServer,
    memory_path: &std::path::Path,
    clock: ManualClock,
) -> SubmissionController<NominatimGeocoder, SupabaseLeadStore, FileMemory, ManualClock> {
    let geocoder = NominatimGeocoder::new(
        server.url("/search"),
        "QuoteFlow-WebForm/1.0",
        Duration::from_secs(5),
    )
    .unwrap();
    let store =
        SupabaseLeadStore::new(server.base_url(), "anon-key", "leads", Duration::from_secs(5))
            .unwrap();

    SubmissionController::new(
        BusinessId::from_route(&format!("/b/{}", BUSINESS)),
        FormSettings::default(),
        geocoder,
        store,
        FileMemory::new(memory_path),
        clock,
    )
}

fn fill_form<G, S, M, C>(controller: &mut SubmissionController<G, S, M, C>)
where
    G: lead_intake::core::Geocoder,
    S: lead_intake::core::LeadStore,
    M: lead_intake::core::LocalMemory,
    C: lead_intake::core::Clock,
{
    controller.set_field(Field::Title, "Roof repair");
    controller.set_field(Field::Description, "Leak near chimney");
    controller.set_field(Field::ContactName, "Anna");
    controller.set_field(Field::ContactEmail, "anna@example.fi");
}

#[tokio::test]
async fn test_end_to_end_submission_with_geocoded_address() {
    let temp_dir = TempDir::new().unwrap();
    let memory_path = temp_dir.path().join("memory.json");
    let server = MockServer::start();

    let geocode_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", "Hameenkatu 1, Tampere")
            .query_param("format", "json")
            .query_param("limit", "1")
            .header("user-agent", "QuoteFlow-WebForm/1.0");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([{"lat": "61.4981", "lon": "23.7610"}]));
    });

    let insert_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/leads")
            .header("apikey", "anon-key")
            .body_contains(format!("\"business_id\":\"{}\"", BUSINESS).as_str())
            .body_contains("\"email\":\"anna@example.fi\"")
            .body_contains("\"latitude\":61.4981")
            .body_contains("\"longitude\":23.761");
        then.status(201)
            .header("Content-Type", "application/json")
            .json_body(stored_row());
    });

    let mut controller = build_controller(&server, &memory_path, ManualClock::new(1_700_000_000_000));
    fill_form(&mut controller);
    controller.set_field(Field::Address, "  Hameenkatu 1, Tampere ");

    let lead = controller.submit().await.unwrap();

    geocode_mock.assert();
    insert_mock.assert();
    assert_eq!(lead.id, "9b2d7c1e-1111-4000-8000-000000000042");
    assert!(matches!(controller.display_state(), DisplayState::Success { .. }));

    let saved = std::fs::read_to_string(&memory_path).unwrap();
    assert!(saved.contains("quoteFlow:lastSubmitAt"));
    assert!(saved.contains("1700000000000"));
}

#[tokio::test]
async fn test_geocoder_outage_still_stores_lead_without_coordinates() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let geocode_mock = server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(503).body("Service Unavailable");
    });
    let insert_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/leads")
            .body_contains("\"latitude\":null")
            .body_contains("\"longitude\":null")
            .body_contains("\"address\":\"Katu 1, 90100 Oulu\"");
        then.status(201)
            .header("Content-Type", "application/json")
            .json_body(stored_row());
    });

    let mut controller = build_controller(
        &server,
        &temp_dir.path().join("memory.json"),
        ManualClock::new(1_700_000_000_000),
    );
    fill_form(&mut controller);
    controller.set_field(Field::Address, "Katu 1, 90100 Oulu");

    assert!(controller.submit().await.is_ok());
    geocode_mock.assert();
    insert_mock.assert();
}

#[tokio::test]
async fn test_rate_limit_survives_a_restart() {
    let temp_dir = TempDir::new().unwrap();
    let memory_path = temp_dir.path().join("nested").join("memory.json");
    let server = MockServer::start();

    let insert_mock = server.mock(|when, then| {
        when.method(POST).path("/rest/v1/leads");
        then.status(201)
            .header("Content-Type", "application/json")
            .json_body(stored_row());
    });

    let clock = ManualClock::new(1_700_000_000_000);
    let mut first = build_controller(&server, &memory_path, clock.clone());
    fill_form(&mut first);
    first.submit().await.unwrap();
    drop(first);

    // 新的控制器共用同一個記憶檔，仍然在時間窗內
    clock.advance(4_000);
    let mut second = build_controller(&server, &memory_path, clock.clone());
    fill_form(&mut second);

    let err = second.submit().await.unwrap_err();
    assert_eq!(err, SubmitError::RateLimited { seconds_left: 6 });
    assert_eq!(
        second.display_state().error_message(),
        Some("Submission limit reached. Please try again in 6 seconds.")
    );
    insert_mock.assert_hits(1);

    second.return_to_form();
    clock.advance(6_000);
    assert!(second.submit().await.is_ok());
    insert_mock.assert_hits(2);
}

#[tokio::test]
async fn test_store_rejection_shows_error_and_keeps_window_open() {
    let temp_dir = TempDir::new().unwrap();
    let memory_path = temp_dir.path().join("memory.json");
    let server = MockServer::start();

    let insert_mock = server.mock(|when, then| {
        when.method(POST).path("/rest/v1/leads");
        then.status(401)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"message": "new row violates row-level security policy"}));
    });

    let mut controller = build_controller(&server, &memory_path, ManualClock::new(1_700_000_000_000));
    fill_form(&mut controller);

    let err = controller.submit().await.unwrap_err();

    insert_mock.assert();
    assert!(matches!(err, SubmitError::PersistenceFailed { .. }));
    assert_eq!(
        controller.display_state().error_message(),
        Some("Saving to the database failed. Please try again.")
    );
    // 失敗的送出不會記錄時間戳
    assert!(!memory_path.exists());

    controller.return_to_form();
    assert_eq!(controller.draft().title, "Roof repair");
}

#[tokio::test]
async fn test_invalid_business_id_never_reaches_network() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    let insert_mock = server.mock(|when, then| {
        when.method(POST).path("/rest/v1/leads");
        then.status(201).json_body(stored_row());
    });

    let store =
        SupabaseLeadStore::new(server.base_url(), "anon-key", "leads", Duration::from_secs(5))
            .unwrap();
    let geocoder =
        NominatimGeocoder::new(server.url("/search"), "QuoteFlow-WebForm/1.0", Duration::from_secs(5))
            .unwrap();
    let mut controller = SubmissionController::new(
        BusinessId::from_route("/b/not-a-uuid"),
        FormSettings::default(),
        geocoder,
        store,
        FileMemory::new(temp_dir.path().join("memory.json")),
        ManualClock::new(1_700_000_000_000),
    );
    fill_form(&mut controller);

    assert!(!controller.submit_enabled());
    let err = controller.submit().await.unwrap_err();

    assert_eq!(err, SubmitError::InvalidBusinessIdentifier);
    insert_mock.assert_hits(0);
}

#[tokio::test]
async fn test_toml_configuration_drives_the_controller() -> Result<()> {
    let config = TomlConfig::from_toml_str(
        r#"
[form]
require_email = false
rate_limit_window_ms = 2000

[[location.cities]]
name = "Rovaniemi"
lat = 66.5039
lng = 25.7294
"#,
    )?;

    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let insert_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/leads")
            .body_contains("\"latitude\":66.5039");
        then.status(201)
            .header("Content-Type", "application/json")
            .json_body(stored_row());
    });

    let store =
        SupabaseLeadStore::new(server.base_url(), "anon-key", "leads", Duration::from_secs(5))?;
    let geocoder =
        NominatimGeocoder::new(server.url("/search"), "QuoteFlow-WebForm/1.0", Duration::from_secs(5))?;
    let clock = ManualClock::new(1_700_000_000_000);
    let mut controller = SubmissionController::new(
        BusinessId::new(BUSINESS),
        config.form_settings(),
        geocoder,
        store,
        FileMemory::new(temp_dir.path().join("memory.json")),
        clock.clone(),
    );
    controller.set_field(Field::Title, "Sauna heater");
    controller.set_field(Field::Description, "Install a new heater");
    controller.set_field(Field::ContactName, "Mikko");
    controller.location_mut().decline_gps()?;
    controller.location_mut().select_city("Rovaniemi")?;

    controller.submit().await?;
    insert_mock.assert();

    controller.return_to_form();
    clock.advance(2_000);
    assert!(controller.submit().await.is_ok());
    Ok(())
}
