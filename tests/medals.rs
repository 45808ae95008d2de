mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{get, post};

#[tokio::test]
async fn managers_award_students_and_counters_follow() {
    let db_pool = common::pool().await;
    let gestor = common::manager(&db_pool, "Gil Prado").await;
    let ana = common::student(&db_pool, "Ana Souza").await;
    let router = common::as_user(&db_pool, &gestor);

    let (status, res) = post(&router, "/medals/award", json!({
        "medalType": "GOLD",
        "userId": ana.id,
        "reason": "Liderança no hackathon"
    })).await;
    assert_eq!(status, StatusCode::CREATED, "{res}");
    assert_eq!(res["data"]["medalType"], "GOLD");

    let (status, _) = post(&router, "/medals/award", json!({ "medalType": "BRONZE", "userId": ana.id })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, res) = get(&router, &format!("/users/{}", ana.id)).await;
    let data = &res["data"];
    assert_eq!(data["goldMedals"], 1);
    assert_eq!(data["silverMedals"], 0);
    assert_eq!(data["bronzeMedals"], 1);
    assert_eq!(data["badgesReceived"].as_array().unwrap().len(), 2);

    let (_, res) = get(&router, &format!("/medals/{}", ana.id)).await;
    assert_eq!(res["data"].as_array().unwrap().len(), 2);
    assert_eq!(common::unread_count(&db_pool, &ana.id).await, 2);
}

#[tokio::test]
async fn award_rules() {
    let db_pool = common::pool().await;
    let gestor = common::manager(&db_pool, "Gil Prado").await;
    let rec = common::recruiter(&db_pool, "Rita Lima").await;
    let ana = common::student(&db_pool, "Ana Souza").await;
    let bruno = common::student(&db_pool, "Bruno Reis").await;
    let router = common::as_user(&db_pool, &gestor);

    let (status, _) = post(&common::as_user(&db_pool, &bruno), "/medals/award", json!({ "medalType": "GOLD", "userId": ana.id })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post(&router, "/medals/award", json!({ "medalType": "GOLD", "userId": rec.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&router, "/medals/award", json!({ "medalType": "GOLD", "userId": "nobody" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&router, "/medals/award", json!({
        "medalType": "SILVER",
        "userId": ana.id,
        "activityId": "missing"
    })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&router, "/medals/award", json!({ "medalType": "PLATINUM", "userId": ana.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, res) = get(&router, &format!("/users/{}", ana.id)).await;
    assert_eq!(res["data"]["silverMedals"], 0);
    assert_eq!(res["data"]["goldMedals"], 0);

    let (status, _) = get(&router, "/medals/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn award_linked_to_activity_survives_its_deletion() {
    let db_pool = common::pool().await;
    let gestor = common::manager(&db_pool, "Gil Prado").await;
    let ana = common::student(&db_pool, "Ana Souza").await;
    let student = common::as_user(&db_pool, &ana);

    let (_, res) = post(&student, "/activities", json!({ "title": "Maratona" })).await;
    let activity_id = res["data"]["id"].as_str().unwrap().to_owned();

    let (status, _) = post(&common::as_user(&db_pool, &gestor), "/medals/award", json!({
        "medalType": "SILVER",
        "userId": ana.id,
        "activityId": activity_id
    })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, res) = get(&student, &format!("/medals/{}", ana.id)).await;
    assert_eq!(res["data"][0]["activityTitle"], "Maratona");

    let (status, _) = common::delete(&student, &format!("/activities/{activity_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, res) = get(&student, &format!("/medals/{}", ana.id)).await;
    assert_eq!(res["data"].as_array().unwrap().len(), 1);
    assert_eq!(res["data"][0]["activityId"], serde_json::Value::Null);
}
