//! Integration tests over saved responses
//!
//! Tests the end-to-end flow: request envelope → saved response → records →
//! fan-out and checkpoints → JSON lines / Parquet output

use chrono::NaiveDate;
use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;
use workday_connector::cli::{Cli, Runner};
use workday_connector::output::{
    arrow_to_records, records_to_arrow, write_records_to_parquet, MessageWriter,
};
use workday_connector::partition::{ListRouter, PartitionRouter, WorkerRouter};
use workday_connector::{
    page_info, Credentials, Error, ErrorCategory, FeedRegistry, Normalizer, RawResponse,
    RequestParams, RequestTemplates, StateManager, WorkerCheckpoints, WorkerDayRouter,
};

const WORKERS_PAGE: &str = include_str!("fixtures/workers_page.xml");
const LOCATIONS_PAGE: &str = include_str!("fixtures/locations_page.xml");
const JOB_HISTORY: &str = include_str!("fixtures/job_history.xml");
const SNAPSHOT: &[u8] = include_bytes!("fixtures/snapshot.csv");

const EMPTY_PAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <wd:Get_Response xmlns:wd="urn:com.workday/bsvc">
      <wd:Response_Results><wd:Total_Results>0</wd:Total_Results></wd:Response_Results>
      <wd:Response_Data/>
    </wd:Get_Response>
  </env:Body>
</env:Envelope>"#;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn credentials() -> Credentials {
    Credentials::new("acme", "isu_connector", "s3cret&<pw>")
}

// ============================================================================
// Per-Feed Properties
// ============================================================================

#[test_case("workers")]
#[test_case("worker_details")]
#[test_case("worker_details_history")]
#[test_case("worker_details_photo")]
#[test_case("organization_hierarchies")]
#[test_case("ethnicities")]
#[test_case("gender_identities")]
#[test_case("locations")]
#[test_case("job_profiles")]
#[test_case("positions")]
#[test_case("sexual_orientations")]
#[test_case("references")]
fn test_empty_page_yields_no_records(feed: &str) {
    let records = Normalizer::new()
        .normalize(feed, &RawResponse::ok(EMPTY_PAGE))
        .unwrap();
    assert!(records.is_empty());
}

#[test_case("base_snapshot_report", "")]
#[test_case("base_snapshot_report", "Employee_ID,Worker\n")]
#[test_case("base_historical_report_compensation", "<wd:Report_Data xmlns:wd=\"urn:r\"/>")]
#[test_case("base_historical_report_job", "<wd:Report_Data xmlns:wd=\"urn:r\"/>")]
fn test_empty_report_yields_no_records(feed: &str, body: &str) {
    let records = Normalizer::new()
        .normalize(feed, &RawResponse::ok(body))
        .unwrap();
    assert!(records.is_empty());
}

#[test_case("workers", "<wd:Response_Data>")]
#[test_case("locations", "<env:Envelope><unclosed></env:Envelope>")]
#[test_case("references", "not xml at all")]
#[test_case("worker_details_history", "<a><b></a>")]
#[test_case("base_historical_report_job", "<wd:Report_Data>")]
#[test_case("base_snapshot_report", "a,b\n1,2,3\n")]
fn test_malformed_payload_names_feed(feed: &str, body: &str) {
    let err = Normalizer::new()
        .normalize(feed, &RawResponse::ok(body))
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::MalformedPayload);
    match err {
        Error::MalformedPayload { feed: ref got, .. } => assert_eq!(got, feed),
        other => panic!("expected MalformedPayload, got {other:?}"),
    }
}

#[test_case(401)]
#[test_case(500)]
fn test_failure_status_never_reaches_extraction(status: u16) {
    let err = Normalizer::new()
        .normalize("workers", &RawResponse::new(status, WORKERS_PAGE))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Transport);
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn test_every_templated_feed_builds_a_request() {
    let templates = RequestTemplates::builtin();
    let params = RequestParams::default()
        .worker_id("21001")
        .as_of(day("2020-01-01"))
        .subcategory("Job_Level_ID");

    for feed in FeedRegistry::new().iter() {
        let Some(template) = feed.request_template else {
            continue;
        };
        let request = templates
            .build_request(template, &credentials(), &params)
            .unwrap();

        assert!(request.contains("isu_connector@acme"), "{}", feed.name);
        assert!(request.contains("s3cret&amp;&lt;pw&gt;"), "{}", feed.name);
        assert!(!request.contains("SOAP_BODY"), "{}", feed.name);
        assert!(!request.contains("PAGE_NUMBER"), "{}", feed.name);
        roxmltree::Document::parse(&request).unwrap();
    }
}

#[test]
fn test_missing_worker_id_fails_before_rendering() {
    let err = RequestTemplates::builtin()
        .build_request("worker_details.xml", &credentials(), &RequestParams::default())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MissingTemplateValue { ref token, .. } if token == "WORKER_ID"
    ));
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn test_locations_page() {
    let response = RawResponse::ok(LOCATIONS_PAGE);
    let records = Normalizer::new().normalize("locations", &response).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0]["Location_Data"]["Location_Name"],
        json!("San Francisco")
    );
    assert_eq!(
        records[0]["Location_Reference"]["ID"][1],
        json!({"#content": "San_Francisco_site", "-type": "Location_ID"})
    );

    let paging = page_info(&response).unwrap().unwrap();
    assert_eq!(paging.total_results, Some(250));
    assert_eq!(paging.next_page(), Some(2));
}

#[test]
fn test_snapshot_report() {
    let records = Normalizer::new()
        .normalize("base_snapshot_report", &RawResponse::ok(SNAPSHOT))
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        Value::Object(records[1].clone()),
        json!({
            "Employee_ID": "21002",
            "Worker": "Serrano, Teresa",
            "Location": "Boston",
            "Hire_Date": ""
        })
    );
}

#[test]
fn test_job_history_report() {
    let records = Normalizer::new()
        .normalize("base_historical_report_job", &RawResponse::ok(JOB_HISTORY))
        .unwrap();

    assert_eq!(records.len(), 1);
    let history = records[0]["Job_History_from_Previous_System_group"]
        .as_array()
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["Job_Title"], json!("Founder"));
    assert_eq!(
        history[0]["Job_Position_History_Record_from_Previous_System"]["-Descriptor"],
        json!("Hire")
    );
    assert_eq!(records[0]["Worker"]["-Descriptor"], json!("Logan McNeil"));
}

// ============================================================================
// Fan-Out and Checkpoints
// ============================================================================

#[test]
fn test_reference_fan_out() {
    let router = ListRouter::reference_categories();
    let partitions = router.partitions().unwrap();
    assert_eq!(partitions.len(), 12);

    let templates = RequestTemplates::builtin();
    for partition in &partitions {
        let params = RequestParams::default().with_partition(partition).unwrap();
        let request = templates
            .build_request("references.xml", &credentials(), &params)
            .unwrap();
        assert!(request.contains(&format!(
            "<bsvc:Reference_ID_Type>{}</bsvc:Reference_ID_Type>",
            partition.id
        )));
    }
}

#[test]
fn test_worker_fan_out() {
    let workers = Normalizer::new()
        .normalize("workers", &RawResponse::ok(WORKERS_PAGE))
        .unwrap();
    let partitions = WorkerRouter::from_records(&workers).partitions().unwrap();

    let ids: Vec<&str> = partitions.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["21001", "21002"]);
}

#[test]
fn test_history_slices_resume_from_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let feed = "worker_details_history";

    let workers = Normalizer::new()
        .normalize("workers", &RawResponse::ok(WORKERS_PAGE))
        .unwrap();
    assert_eq!(workers[0]["Termination_Date"], json!("2020-01-03-08:00"));

    // First run: 21001 is terminated on the 3rd, 21002 hired on the 4th
    let mut state = StateManager::from_file(&state_path).unwrap();
    let first =
        WorkerDayRouter::from_records(&workers, state.checkpoints(feed), day("2020-01-05"))
            .expand();
    let ids: Vec<String> = first
        .slices
        .iter()
        .map(|s| s.to_partition().id)
        .collect();
    assert_eq!(
        ids,
        vec![
            "21001_2020-01-01",
            "21001_2020-01-02",
            "21001_2020-01-03",
            "21002_2020-01-04",
            "21002_2020-01-05",
        ]
    );
    assert_eq!(
        first.checkpoints,
        WorkerCheckpoints::new()
            .with_resume_point("21001", day("2020-01-04"))
            .with_resume_point("21002", day("2020-01-06"))
    );
    state.set_checkpoints(feed, first.checkpoints).unwrap();

    // Second run a day later only picks up the new day
    let state = StateManager::from_file(&state_path).unwrap();
    let second =
        WorkerDayRouter::from_records(&workers, state.checkpoints(feed), day("2020-01-06"))
            .expand();
    assert_eq!(second.slices.len(), 1);
    assert_eq!(second.slices[0].worker_id, "21002");
    assert_eq!(second.slices[0].as_of, day("2020-01-06"));

    // Each slice turns into a detail request and stamps its records
    let slice = second.slices[0].to_partition();
    let params = RequestParams::default().with_partition(&slice).unwrap();
    let request = RequestTemplates::builtin()
        .build_request("worker_details_history.xml", &credentials(), &params)
        .unwrap();
    assert!(request.contains(">21002</bsvc:ID>"));
    assert!(request.contains("<bsvc:As_Of_Effective_Date>2020-01-06</bsvc:As_Of_Effective_Date>"));

    let records = Normalizer::new()
        .normalize_partition(feed, &RawResponse::ok(WORKERS_PAGE), &slice)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["as_of_effective_date"], json!("2020-01-06"));
    assert_eq!(records[0]["worker_id"], json!("21002"));
}

#[test]
fn test_cli_sync_keeps_full_fan_out_and_unfetched_days() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let response = dir.path().join("response.xml");
    let workers = dir.path().join("workers.json");
    std::fs::write(&response, EMPTY_PAGE).unwrap();
    std::fs::write(
        &workers,
        r#"[{"Worker_Data": {"Worker_ID": "21001"}, "Hire_Date": "2020-01-01", "Termination_Date": "2020-01-03"}]"#,
    )
    .unwrap();

    let run = |args: &[&str]| {
        let mut argv = vec!["workday-connector", "-s", state_path.to_str().unwrap()];
        argv.extend_from_slice(args);
        Runner::new(Cli::try_parse_from(argv).unwrap()).run().unwrap();
    };
    let response = response.to_str().unwrap();
    let workers = workers.to_str().unwrap();
    let history = "worker_details_history";

    run(&["normalize", "references", "-r", response, "--subcategory", "Job_Level_ID"]);
    assert!(StateManager::from_file(&state_path)
        .unwrap()
        .is_partition_completed("references", "Job_Level_ID"));

    // the next listing is a new run
    run(&["partitions", "references"]);
    assert!(!StateManager::from_file(&state_path)
        .unwrap()
        .is_partition_completed("references", "Job_Level_ID"));

    // listing slices twice without fetching keeps every day pending
    run(&["partitions", history, "-w", workers, "--today", "2024-01-01"]);
    run(&["partitions", history, "-w", workers, "--today", "2024-01-01"]);
    assert!(StateManager::from_file(&state_path)
        .unwrap()
        .checkpoints(history)
        .is_empty());

    run(&[
        "normalize",
        history,
        "-r",
        response,
        "--worker-id",
        "21001",
        "--as-of",
        "2020-01-01",
    ]);
    let state = StateManager::from_file(&state_path).unwrap();
    assert_eq!(
        state.checkpoints(history).resume_point("21001"),
        Some(day("2020-01-02"))
    );
    assert!(state.is_partition_completed(history, "21001_2020-01-01"));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_workers_to_parquet_and_messages() {
    let dir = tempfile::tempdir().unwrap();
    let workers = Normalizer::new()
        .normalize("workers", &RawResponse::ok(WORKERS_PAGE))
        .unwrap();

    let rows = write_records_to_parquet(dir.path().join("workers.parquet"), &workers, None)
        .unwrap();
    assert_eq!(rows, 2);

    let batch = records_to_arrow(&workers, None).unwrap();
    let back = arrow_to_records(&batch).unwrap();
    assert_eq!(back[1]["Hire_Date"], json!("2020-01-04-08:00"));
    assert_eq!(back[1]["Termination_Date"], Value::Null);

    let mut writer = MessageWriter::new(Vec::new());
    writer.write_records("workers", workers).unwrap();
    let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(out.lines().count(), 2);
}
