use serde_json::{Value, json};
use tracing::info;
use tracing_test::traced_test;
use vastrayl_e2e_tests::{
    launch_env,
    rest::{create_item, get_item, rate_item},
};

#[tokio::test]
#[traced_test]
async fn test_item_lifecycle() {
    let env = launch_env("test_item_lifecycle").await.unwrap();
    let alice = env.client_for("alice").unwrap();
    let bob = env.client_for("bob").unwrap();

    let item = create_item(&env, &alice, "Green linen suit", Some(1))
        .await
        .unwrap();
    assert_eq!(item.owner_id, "alice");
    assert_eq!(item.ratings_count, 0);
    assert_eq!(item.average_rating, 0.0);
    assert_eq!(item.max_rating, 10.0);

    let fetched = get_item(&env, &bob, item.id).await.unwrap();
    assert_eq!(fetched.title, "Green linen suit");

    let item_url = env.url(&format!("api/item/{}", item.id));
    let response = bob.delete(item_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = alice.delete(item_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = alice.get(item_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = alice.delete(item_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_item_validation() {
    let env = launch_env("test_item_validation").await.unwrap();
    let alice = env.client_for("alice").unwrap();

    let response = alice
        .post(env.url("api/item"))
        .json(&json!({"title": ""}))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 422);

    let response = alice
        .post(env.url("api/item"))
        .json(&json!({"title": "Hat", "max_rating": 0.5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    let response = alice
        .post(env.url("api/item"))
        .json(&json!({"title": "Hat", "max_rating": 5.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
#[traced_test]
async fn test_listing() {
    let env = launch_env("test_listing").await.unwrap();
    let alice = env.client_for("alice").unwrap();

    for i in 0..25 {
        let contest = if i % 2 == 0 { Some(7) } else { None };
        create_item(&env, &alice, &format!("Outfit {i:02}"), contest)
            .await
            .unwrap();
    }

    let mut url = env.url("api/item");
    url.set_query(Some("page=2&page_size=10&sort=-title"));
    let response = alice.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["total"], 25);
    assert_eq!(page["total_pages"], 3);
    assert_eq!(page["page"], 2);
    let rows = page["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0]["title"], "Outfit 14");

    let mut url = env.url("api/item");
    url.set_query(Some("contest_id=7&page_size=100"));
    let response = alice.get(url).send().await.unwrap();
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["total"], 13);

    let mut url = env.url("api/item");
    url.set_query(Some("sort=owner_secret"));
    let response = alice.get(url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let mut url = env.url("api/item");
    url.set_query(Some("page_size=5000"));
    let response = alice.get(url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
#[traced_test]
async fn test_leaderboard() {
    let env = launch_env("test_leaderboard").await.unwrap();
    let owner = env.client_for("owner").unwrap();
    let first = create_item(&env, &owner, "First", Some(3)).await.unwrap();
    let second = create_item(&env, &owner, "Second", Some(3)).await.unwrap();
    let third = create_item(&env, &owner, "Third", Some(3)).await.unwrap();
    let other_contest = create_item(&env, &owner, "Elsewhere", Some(4)).await.unwrap();

    let votes = [
        ("u1", first.id, 9.0),
        ("u2", first.id, 7.0),
        ("u1", second.id, 8.0),
        ("u2", second.id, 8.0),
        ("u1", third.id, 10.0),
        ("u1", other_contest.id, 10.0),
    ];
    for (user, item_id, rating) in votes {
        let client = env.client_for(user).unwrap();
        let (status, _) = rate_item(&env, &client, item_id, rating, false)
            .await
            .unwrap();
        assert_eq!(status, 200);
    }

    let response = owner
        .get(env.url("api/contest/3/leaderboard"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let entries: Vec<Value> = response.json().await.unwrap();
    let titles: Vec<&str> = entries
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    // First and Second tie on average and count, lower id wins
    assert_eq!(titles, vec!["Third", "First", "Second"]);

    let mut url = env.url("api/contest/3/leaderboard");
    url.set_query(Some("min_ratings=2&limit=1"));
    let response = owner.get(url).send().await.unwrap();
    let entries: Vec<Value> = response.json().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "First");
}
