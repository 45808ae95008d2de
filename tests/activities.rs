mod common;

use axum::{http::StatusCode, Router};
use needuk::{activities::repo::{self, NewLink}, session::Principal};
use serde_json::json;

use common::{delete, get, post, put};

async fn create_activity(router: &Router) -> String {
    let (status, res) = post(router, "/activities", json!({
        "title": "Hackathon de verão",
        "description": "Projeto em equipe",
        "startDate": "2025-01-10",
        "endDate": "2025-01-20",
        "links": [{ "title": "Repositório", "url": "https://example.com/repo" }]
    })).await;
    assert_eq!(status, StatusCode::CREATED, "{res}");
    res["data"]["id"].as_str().unwrap().to_owned()
}

async fn join(db_pool: &sqlx::SqlitePool, activity_id: &str, user: &Principal) {
    sqlx::query("INSERT INTO activity_participants (activity_id,user_id,joined_at) VALUES (?,?,?)")
        .bind(activity_id)
        .bind(&user.id)
        .bind(needuk::db::now().unwrap())
        .execute(db_pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn creator_leads_and_participates() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;
    let router = common::as_user(&db_pool, &u1);
    let id = create_activity(&router).await;

    let (status, res) = get(&router, &format!("/activities/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &res["data"];
    assert_eq!(data["leaderId"], u1.id.as_str());
    assert_eq!(data["isLeader"], true);
    assert_eq!(data["participants"][0]["userId"], u1.id.as_str());
    assert_eq!(data["links"][0]["url"], "https://example.com/repo");

    let (_, res) = get(&router, "/activities").await;
    assert_eq!(res["data"][0]["participantCount"], 1);
    assert_eq!(res["data"][0]["isLeader"], true);
}

#[tokio::test]
async fn end_date_before_start_is_rejected() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;

    let (status, res) = post(&common::as_user(&db_pool, &u1), "/activities", json!({
        "title": "Datas trocadas",
        "startDate": "2025-02-10",
        "endDate": "2025-02-01"
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["details"]["endDate"].is_string());
}

#[tokio::test]
async fn patch_dates_can_be_cleared() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;
    let router = common::as_user(&db_pool, &u1);
    let id = create_activity(&router).await;
    let uri = format!("/activities/{id}");

    let (status, res) = put(&router, &uri, json!({ "startDate": "bad" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res["details"]["startDate"].is_string(), "{res}");

    let (status, res) = put(&router, &uri, json!({ "startDate": "", "endDate": null })).await;
    assert_eq!(status, StatusCode::OK, "{res}");
    assert!(res["data"]["startDate"].is_null());
    assert!(res["data"]["endDate"].is_null());

    let (status, res) = put(&router, &uri, json!({ "title": "Só o título" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(res["data"]["startDate"].is_null());
}

#[tokio::test]
async fn only_participants_see_an_activity() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;
    let outsider = common::student(&db_pool, "Bruno Reis").await;
    let id = create_activity(&common::as_user(&db_pool, &u1)).await;
    let outsider = common::as_user(&db_pool, &outsider);

    let (status, _) = get(&outsider, &format!("/activities/{id}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get(&outsider, &format!("/activities/{id}/observations")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = post(&outsider, &format!("/activities/{id}/observations"), json!({ "content": "Oi" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get(&outsider, "/activities/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_leader_updates_or_deletes() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;
    let u2 = common::student(&db_pool, "Bruno Reis").await;
    let leader = common::as_user(&db_pool, &u1);
    let member = common::as_user(&db_pool, &u2);
    let id = create_activity(&leader).await;
    join(&db_pool, &id, &u2).await;

    let (status, _) = put(&member, &format!("/activities/{id}"), json!({ "title": "Sequestrada" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = delete(&member, &format!("/activities/{id}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, res) = put(&leader, &format!("/activities/{id}"), json!({
        "status": "completed",
        "links": [
            { "url": "https://example.com/a" },
            { "title": "Docs", "url": "https://example.com/b" }
        ]
    })).await;
    assert_eq!(status, StatusCode::OK, "{res}");
    assert_eq!(res["data"]["status"], "completed");
    assert_eq!(res["data"]["title"], "Hackathon de verão");
    assert_eq!(res["data"]["links"].as_array().unwrap().len(), 2);
    assert_eq!(common::unread_count(&db_pool, &u2.id).await, 1);

    let (status, _) = delete(&leader, &format!("/activities/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&leader, &format!("/activities/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(common::unread_count(&db_pool, &u2.id).await, 2);
}

#[tokio::test]
async fn link_replacement_is_all_or_nothing() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;
    let id = create_activity(&common::as_user(&db_pool, &u1)).await;

    let mut activity = repo::load_activity(&db_pool, &id).await.unwrap().unwrap();
    activity.title = "Título novo".to_owned();
    let links = [
        NewLink { title: None, url: "https://example.com/ok".to_owned() },
        NewLink { title: None, url: "   ".to_owned() },
    ];
    assert!(repo::update_with_links(&db_pool, &activity, Some(&links)).await.is_err());

    let stored = repo::load_activity(&db_pool, &id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Hackathon de verão");
    let links = repo::list_links(&db_pool, &id).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].url, "https://example.com/repo");
}

#[tokio::test]
async fn leadership_transfer_rules() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;
    let u2 = common::student(&db_pool, "Bruno Reis").await;
    let u3 = common::student(&db_pool, "Carla Dias").await;
    let first = common::as_user(&db_pool, &u1);
    let second = common::as_user(&db_pool, &u2);
    let id = create_activity(&first).await;
    join(&db_pool, &id, &u2).await;
    let uri = format!("/activities/{id}/transfer-leadership");

    let (status, _) = post(&first, &uri, json!({ "newLeaderId": u3.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post(&first, &uri, json!({ "newLeaderId": u1.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A non-leader cannot hand leadership to anyone, themselves included.
    let (status, _) = post(&second, &uri, json!({ "newLeaderId": u1.id })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, res) = post(&first, &uri, json!({ "newLeaderId": u2.id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["data"]["leaderId"], u2.id.as_str());
    assert_eq!(common::unread_count(&db_pool, &u2.id).await, 1);

    let (_, res) = get(&second, &format!("/activities/{id}")).await;
    let participants = res["data"]["participants"].as_array().unwrap();
    let role_of = |user: &Principal| {
        participants.iter().find(|p| p["userId"] == user.id.as_str()).unwrap()["role"].clone()
    };
    assert_eq!(role_of(&u2), "leader");
    assert!(role_of(&u1).is_null());

    let (status, _) = put(&first, &format!("/activities/{id}"), json!({ "title": "Antigo líder" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = put(&second, &format!("/activities/{id}"), json!({ "title": "Novo líder" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn members_leave_and_get_removed() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;
    let u2 = common::student(&db_pool, "Bruno Reis").await;
    let u3 = common::student(&db_pool, "Carla Dias").await;
    let leader = common::as_user(&db_pool, &u1);
    let id = create_activity(&leader).await;
    join(&db_pool, &id, &u2).await;
    join(&db_pool, &id, &u3).await;

    let (status, _) = post(&leader, &format!("/activities/{id}/leave"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = delete(&leader, &format!("/activities/{id}/participants/{}", u1.id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&common::as_user(&db_pool, &u2), &format!("/activities/{id}/leave"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::unread_count(&db_pool, &u1.id).await, 1);
    let (status, _) = post(&common::as_user(&db_pool, &u2), &format!("/activities/{id}/leave"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = delete(&common::as_user(&db_pool, &u3), &format!("/activities/{id}/participants/{}", u2.id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = delete(&leader, &format!("/activities/{id}/participants/{}", u3.id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = delete(&leader, &format!("/activities/{id}/participants/{}", u3.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, res) = get(&leader, &format!("/activities/{id}")).await;
    assert_eq!(res["data"]["participants"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invitations_and_observations() {
    let db_pool = common::pool().await;
    let u1 = common::student(&db_pool, "Ana Souza").await;
    let u2 = common::student(&db_pool, "Bruno Reis").await;
    let leader = common::as_user(&db_pool, &u1);
    let invitee = common::as_user(&db_pool, &u2);
    let id = create_activity(&leader).await;

    let (status, res) = post(&leader, &format!("/activities/{id}/invite"), json!({
        "emails": [u2.email, u1.email, "ninguem@needuk.test"]
    })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["data"]["invited"][0], u2.email.as_str());
    assert_eq!(res["data"]["alreadyParticipants"][0], u1.email.as_str());
    assert_eq!(res["data"]["notFound"][0], "ninguem@needuk.test");

    let (status, _) = post(&leader, &format!("/activities/{id}/invite"), json!({ "emails": ["not-an-email"] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, res) = post(&invitee, &format!("/activities/{id}/invitation"), json!({ "accept": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res["data"]["status"], "accepted");
    let (status, _) = post(&invitee, &format!("/activities/{id}/invitation"), json!({ "accept": true })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, res) = post(&invitee, &format!("/activities/{id}/observations"), json!({ "content": "  Bora!  " })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(res["data"][0]["content"], "Bora!");
    assert_eq!(res["data"][0]["authorName"], "Bruno Reis");

    let (status, _) = post(&invitee, &format!("/activities/{id}/observations"), json!({ "content": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
