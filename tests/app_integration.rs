use bullion::core::holding::{FormType, NewHolding};
use bullion::core::price::{Metal, PriceSource};
use bullion::core::pricing::HistoryQuery;
use bullion::{AppCommand, HoldingsCommand};
use rust_decimal::Decimal;
use std::fs;
use tempfile::TempDir;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const LATEST_RESPONSE: &str = r#"{
        "status": "success",
        "currency": "AUD",
        "unit": "toz",
        "metals": {"gold": 3600.5, "silver": 45.25},
        "timestamps": {"metal": "2024-06-01T09:30:00.000Z"}
    }"#;

    pub async fn create_metals_dev_mock_server(
        status_code: u16,
        mock_response: &str,
        expected_calls: u64,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/latest"))
            .and(query_param("api_key", "integration-key"))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;

        mock_server
    }
}

/// Writes a config pointing the provider at `base_url` and the store into a
/// fresh temporary directory.
fn write_config(base_url: &str, with_key: bool) -> (TempDir, String) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = dir.path().join("config.yaml");
    let data_path = dir.path().join("data");
    let api_key = if with_key {
        "    api_key: \"integration-key\"\n"
    } else {
        ""
    };
    let config_content = format!(
        "user: \"alice\"\ncurrency: \"AUD\"\nunit: \"toz\"\nproviders:\n  metals_dev:\n    base_url: \"{}\"\n{}data_path: \"{}\"\n",
        base_url,
        api_key,
        data_path.display()
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    let config_path = config_path.to_str().unwrap().to_string();
    (dir, config_path)
}

fn gold_coin() -> NewHolding {
    NewHolding {
        metal: Metal::Gold,
        weight_oz: Decimal::ONE,
        form: FormType::Coin,
        denomination: "1oz Kangaroo".to_string(),
        quantity: 2,
        purchase_price: Some(Decimal::from(3000)),
        purchase_date: None,
        notes: None,
    }
}

#[test_log::test(tokio::test)]
async fn test_prices_refresh_once_then_served_from_cache() {
    let mock_server =
        test_utils::create_metals_dev_mock_server(200, test_utils::LATEST_RESPONSE, 1).await;
    let (_dir, config_path) = write_config(&mock_server.uri(), true);

    // The first call refreshes, the second is inside the freshness window.
    for _ in 0..2 {
        let result = bullion::run_command(AppCommand::Prices, Some(&config_path), None).await;
        assert!(result.is_ok(), "Prices failed with: {:?}", result.err());
    }

    let result = bullion::run_command(AppCommand::CachedPrices, Some(&config_path), None).await;
    assert!(result.is_ok(), "Cached prices failed with: {:?}", result.err());

    let result = bullion::run_command(
        AppCommand::History(HistoryQuery {
            metal: Some(Metal::Silver),
            days: 7,
        }),
        Some(&config_path),
        None,
    )
    .await;
    assert!(result.is_ok(), "History failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_holdings_and_summary_flow() {
    let mock_server =
        test_utils::create_metals_dev_mock_server(200, test_utils::LATEST_RESPONSE, 1).await;
    let (_dir, config_path) = write_config(&mock_server.uri(), true);

    let result = bullion::run_command(
        AppCommand::Holdings(HoldingsCommand::Add(gold_coin())),
        Some(&config_path),
        None,
    )
    .await;
    assert!(result.is_ok(), "Add failed with: {:?}", result.err());

    for command in [
        AppCommand::Holdings(HoldingsCommand::List { metal: None }),
        AppCommand::Summary,
        AppCommand::Analytics,
    ] {
        let result = bullion::run_command(command, Some(&config_path), None).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }

    // Holdings are stored under the configured user only.
    let config = bullion::core::config::AppConfig::load_from_path(&config_path).unwrap();
    let app = bullion::App::from_config(config).unwrap();
    let alice = bullion::core::identity::UserId::parse("alice").unwrap();
    let bob = bullion::core::identity::UserId::parse("bob").unwrap();
    let stored = app.holdings.list(&alice).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].denomination, "1oz Kangaroo");
    assert!(app.holdings.list(&bob).await.unwrap().is_empty());

    // Prices were cached by the summary above.
    let prices = app.prices.get_detailed_prices().await;
    assert_eq!(prices.source, PriceSource::Cache);
    assert_eq!(prices.gold.price, "3600.5".parse::<Decimal>().unwrap());
    app.close().unwrap();
}

#[test_log::test(tokio::test)]
async fn test_provider_outage_still_succeeds() {
    let mock_server = test_utils::create_metals_dev_mock_server(500, "Server Error", 1).await;
    let (_dir, config_path) = write_config(&mock_server.uri(), true);

    let result = bullion::run_command(AppCommand::Prices, Some(&config_path), None).await;
    assert!(result.is_ok(), "Prices failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_invalid_history_range_is_an_error() {
    let (_dir, config_path) = write_config("http://127.0.0.1:9", false);

    let result = bullion::run_command(
        AppCommand::History(HistoryQuery {
            metal: None,
            days: 400,
        }),
        Some(&config_path),
        None,
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_per_user_commands_require_identity() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(
        &config_path,
        format!("data_path: \"{}\"\n", dir.path().join("data").display()),
    )
    .unwrap();
    let config_path = config_path.to_str().unwrap();

    let result = bullion::run_command(AppCommand::Summary, Some(config_path), None).await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("No user configured"));

    let result = bullion::run_command(AppCommand::Summary, Some(config_path), Some("bob")).await;
    assert!(result.is_ok(), "Summary failed with: {:?}", result.err());
}
