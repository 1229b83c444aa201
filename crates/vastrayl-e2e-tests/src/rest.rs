use anyhow::Result;
use serde_json::{Value, json};
use tracing::info;
use vastrayl_dal::item::RateableItem;

use crate::TestEnv;

pub async fn create_item(
    env: &TestEnv,
    client: &reqwest::Client,
    title: &str,
    contest_id: Option<i64>,
) -> Result<RateableItem> {
    let payload = json!({"title": title, "contest_id": contest_id});
    let response = client.post(env.url("api/item")).json(&payload).send().await?;
    info!("Create item response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 201);

    let item: RateableItem = response.json().await?;
    Ok(item)
}

/// Returns status and JSON body of the rating response.
pub async fn rate_item(
    env: &TestEnv,
    client: &reqwest::Client,
    item_id: i64,
    rating: f64,
    flag: bool,
) -> Result<(u16, Value)> {
    let payload = json!({"rating": rating, "flag": flag});
    let response = client
        .post(env.url(&format!("api/item/{item_id}/rating")))
        .json(&payload)
        .send()
        .await?;
    let status = response.status().as_u16();
    let body: Value = response.json().await?;
    Ok((status, body))
}

pub async fn get_item(
    env: &TestEnv,
    client: &reqwest::Client,
    item_id: i64,
) -> Result<RateableItem> {
    let response = client
        .get(env.url(&format!("api/item/{item_id}")))
        .send()
        .await?;
    assert!(response.status().is_success());
    Ok(response.json().await?)
}
