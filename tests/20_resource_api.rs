mod common;

use anyhow::{Context, Result};
use reqwest::{header, StatusCode};
use serde_json::Value;

#[tokio::test]
async fn school_lifecycle() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let schools = format!("{}/ed-fi/schools", server.data_url);

    // Insert
    let res = client.post(&schools).json(&common::school(255901)).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res
        .headers()
        .get(header::LOCATION)
        .context("missing Location header")?
        .to_str()?
        .to_string();
    assert!(location.starts_with("/data/ed-fi/schools/"), "unexpected location {}", location);
    let id = location.rsplit('/').next().context("location has no id")?.to_string();

    // Same identity again is an update
    let res = client.post(&schools).json(&common::school(255901)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Read back
    let res = client.get(format!("{}{}", server.base_url, location)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["schoolId"], 255901);

    // Update without changing identity
    let mut update = common::school(255901);
    update["id"] = Value::String(id.clone());
    update["nameOfInstitution"] = Value::String("Grand Bend Senior High".into());
    let res = client.put(format!("{}/{}", schools, id)).json(&update).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Identity changes are refused for School
    let mut renamed = update.clone();
    renamed["schoolId"] = Value::from(255902);
    let res = client.put(format!("{}/{}", schools, id)).json(&renamed).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["errors"][0],
        "Identifying values for the School resource cannot be changed. Delete and recreate the resource item instead."
    );

    // Delete, then it is gone
    let res = client.delete(format!("{}/{}", schools, id)).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = client.get(format!("{}/{}", schools, id)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.delete(format!("{}/{}", schools, id)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn query_filters_and_counts() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let schools = format!("{}/ed-fi/schools", server.data_url);

    for school_id in [100, 200, 300] {
        let res = client.post(&schools).json(&common::school(school_id)).send().await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(&schools)
        .query(&[("schoolId", "200"), ("totalCount", "true")])
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("Total-Count").and_then(|v| v.to_str().ok()),
        Some("1")
    );
    let body = res.json::<Value>().await?;
    let items = body.as_array().context("query body must be an array")?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["schoolId"], 200);

    let res = client.get(&schools).query(&[("limit", "2"), ("offset", "1")]).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("Total-Count").is_none());
    let body = res.json::<Value>().await?;
    assert_eq!(body.as_array().map(|a| a.len()), Some(2));

    Ok(())
}

#[tokio::test]
async fn bad_queries_are_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let schools = format!("{}/ed-fi/schools", server.data_url);

    let res = client.get(&schools).query(&[("limit", "10000")]).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(&schools).query(&[("favoriteColor", "blue")]).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["errors"][0],
        "The query field 'favoriteColor' is not valid for this resource."
    );

    let res = client.get(&schools).query(&[("schoolId", "abc")]).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn unknown_resource_is_404() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::get(format!("{}/ed-fi/notAResource", server.data_url)).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn put_with_mismatched_body_id_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let schools = format!("{}/ed-fi/schools", server.data_url);

    let res = client.post(&schools).json(&common::school(255950)).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res
        .headers()
        .get(header::LOCATION)
        .context("missing Location header")?
        .to_str()?
        .to_string();
    let id = location.rsplit('/').next().context("location has no id")?.to_string();

    let mut update = common::school(255950);
    update["id"] = Value::String("00000000-0000-4000-8000-000000000000".into());
    let res = client.put(format!("{}/{}", schools, id)).json(&update).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(
        body["validationErrors"]["$.id"][0],
        "Request body id must match the id in the url."
    );

    // The stored document is untouched
    let res = client.get(format!("{}/{}", schools, id)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
