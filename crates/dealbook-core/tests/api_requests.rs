//! End-to-end requests through the `Api` facade

use dealbook_core::access::{hash_token, ApiToken};
use dealbook_core::config::AccessConfig;
use dealbook_core::validation::parse_json;
use dealbook_core::{Api, ApiError, Backend, Config, DealPatch, DealStatus, NewDeal, PositionUpdate};
use tempfile::TempDir;

const TOKEN: Option<&str> = Some("pipeline-token");

fn locked_config(temp_dir: &TempDir) -> Config {
    Config {
        data_dir: temp_dir.path().to_path_buf(),
        backend: Backend::File,
        access: AccessConfig {
            tokens: vec![ApiToken {
                user: "sales".to_string(),
                token_hash: hash_token("pipeline-token"),
            }],
        },
        ..Config::default()
    }
}

#[test]
fn json_payloads_flow_through_to_disk() {
    let temp_dir = TempDir::new().unwrap();
    let config = locked_config(&temp_dir);

    {
        let mut api = Api::from_config(&config).unwrap();
        let body = r#"{
            "accountName": "Acme",
            "dealName": "Renewal",
            "quarter": "Q1/2024",
            "status": "Progress",
            "priority": "High",
            "area": "Đà Nẵng",
            "forecastAmount": 15000
        }"#;
        let new: NewDeal = parse_json(body).unwrap();
        let deal = api.create_deal(TOKEN, new).unwrap();
        assert_eq!(deal.id, 1);

        let patch: DealPatch = parse_json(r#"{"status": "Done"}"#).unwrap();
        api.update_deal(TOKEN, deal.id, patch).unwrap();
    }

    let api = Api::from_config(&config).unwrap();
    let deal = api.get_deal(TOKEN, 1).unwrap();
    assert_eq!(deal.status, DealStatus::Done);
    assert_eq!(deal.forecast_amount, Some(15000));

    let summary = api.deal_summary(TOKEN, None).unwrap();
    assert_eq!(summary.by_status.done, 1);
    assert_eq!(summary.forecast_total, 15000);
}

#[test]
fn unknown_status_label_is_a_body_error() {
    let result: Result<DealPatch, _> = parse_json(r#"{"status": "Won"}"#);
    let errors = result.unwrap_err();
    assert!(errors.has("body"));

    let err = ApiError::from(errors);
    assert_eq!(err.status_code(), 400);
}

#[test]
fn token_is_required_when_configured() {
    let temp_dir = TempDir::new().unwrap();
    let mut api = Api::from_config(&locked_config(&temp_dir)).unwrap();

    let err = api.list_deals(None).unwrap_err();
    assert_eq!(err.status_code(), 401);

    let err = api
        .reorder_deals(Some("stolen"), vec![PositionUpdate { id: 1, position: 0 }])
        .unwrap_err();
    assert_eq!(err.status_code(), 401);
}

#[test]
fn reorder_skips_unknown_ids() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        backend: Backend::Memory,
        ..locked_config(&temp_dir)
    };
    let mut api = Api::from_config(&config).unwrap();

    let body = r#"{"accountName": "Acme", "dealName": "Renewal", "quarter": "Q4/2025",
                   "status": "Stuck", "priority": "Low", "area": "Huế"}"#;
    api.create_deal(TOKEN, parse_json(body).unwrap()).unwrap();

    let updates: Vec<PositionUpdate> =
        parse_json(r#"[{"id": 1, "position": 5}, {"id": 77, "position": 0}]"#).unwrap();
    let applied = api.reorder_deals(TOKEN, updates).unwrap();
    assert_eq!(applied, 1);
    assert_eq!(api.get_deal(TOKEN, 1).unwrap().position, 5);
}
