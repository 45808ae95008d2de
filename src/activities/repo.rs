use serde::Serialize;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use crate::{
    db,
    models::{Activity, ActivityLink, InvitationStatus, Observation, Participant},
    AppResult,
};

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub activity: Activity,
    pub is_leader: bool,
    pub participant_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewLink {
    pub title: Option<String>,
    pub url: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Invitation {
    pub id: String,
    pub invited_by: String,
    pub status: InvitationStatus,
}

pub async fn load_activity<'e>(db: impl SqliteExecutor<'e>, activity_id: &str) -> sqlx::Result<Option<Activity>> {
    sqlx::query_as("SELECT * FROM activities WHERE id=?")
        .bind(activity_id)
        .fetch_optional(db)
        .await
}

pub async fn list_for_user(db_pool: &SqlitePool, user_id: &str) -> sqlx::Result<Vec<ActivitySummary>> {
    sqlx::query_as(
        "SELECT a.*, a.leader_id = p.user_id AS is_leader,
                (SELECT COUNT(*) FROM activity_participants c WHERE c.activity_id = a.id) AS participant_count
         FROM activities a
         JOIN activity_participants p ON p.activity_id = a.id
         WHERE p.user_id=?
         ORDER BY a.updated_at DESC, a.id DESC",
    )
        .bind(user_id)
        .fetch_all(db_pool)
        .await
}

pub async fn is_participant<'e>(db: impl SqliteExecutor<'e>, activity_id: &str, user_id: &str) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM activity_participants WHERE activity_id=? AND user_id=?")
        .bind(activity_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row.is_some())
}

pub async fn participant_ids<'e>(db: impl SqliteExecutor<'e>, activity_id: &str) -> sqlx::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT user_id FROM activity_participants WHERE activity_id=? ORDER BY joined_at")
        .bind(activity_id)
        .fetch_all(db)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn list_participants(db_pool: &SqlitePool, activity_id: &str) -> sqlx::Result<Vec<Participant>> {
    sqlx::query_as(
        "SELECT p.user_id,u.name,u.email,p.role,p.joined_at
         FROM activity_participants p JOIN users u ON u.id = p.user_id
         WHERE p.activity_id=? ORDER BY p.joined_at, u.name",
    )
        .bind(activity_id)
        .fetch_all(db_pool)
        .await
}

pub async fn list_links<'e>(db: impl SqliteExecutor<'e>, activity_id: &str) -> sqlx::Result<Vec<ActivityLink>> {
    sqlx::query_as("SELECT id,title,url FROM activity_links WHERE activity_id=? ORDER BY position")
        .bind(activity_id)
        .fetch_all(db)
        .await
}

pub async fn list_observations(db_pool: &SqlitePool, activity_id: &str) -> sqlx::Result<Vec<Observation>> {
    sqlx::query_as(
        "SELECT o.id,o.author_id,u.name AS author_name,o.content,o.created_at
         FROM observations o JOIN users u ON u.id = o.author_id
         WHERE o.activity_id=? ORDER BY o.created_at DESC, o.id DESC",
    )
        .bind(activity_id)
        .fetch_all(db_pool)
        .await
}

pub async fn insert_activity(conn: &mut SqliteConnection, activity: &Activity) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO activities (id,title,description,status,start_date,end_date,created_by,leader_id,created_at,updated_at)
         VALUES (?,?,?,?,?,?,?,?,?,?)",
    )
        .bind(&activity.id)
        .bind(&activity.title)
        .bind(&activity.description)
        .bind(activity.status)
        .bind(&activity.start_date)
        .bind(&activity.end_date)
        .bind(&activity.created_by)
        .bind(&activity.leader_id)
        .bind(&activity.created_at)
        .bind(&activity.updated_at)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn add_participant<'e>(db: impl SqliteExecutor<'e>, activity_id: &str, user_id: &str, role: Option<&str>) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO activity_participants (activity_id,user_id,role,joined_at) VALUES (?,?,?,?)
         ON CONFLICT (activity_id,user_id) DO NOTHING",
    )
        .bind(activity_id)
        .bind(user_id)
        .bind(role)
        .bind(db::now()?)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_participant<'e>(db: impl SqliteExecutor<'e>, activity_id: &str, user_id: &str) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM activity_participants WHERE activity_id=? AND user_id=?")
        .bind(activity_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

async fn write_fields(conn: &mut SqliteConnection, activity: &Activity) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE activities SET title=?,description=?,status=?,start_date=?,end_date=?,updated_at=? WHERE id=?",
    )
        .bind(&activity.title)
        .bind(&activity.description)
        .bind(activity.status)
        .bind(&activity.start_date)
        .bind(&activity.end_date)
        .bind(&activity.updated_at)
        .bind(&activity.id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn replace_links(conn: &mut SqliteConnection, activity_id: &str, links: &[NewLink]) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM activity_links WHERE activity_id=?")
        .bind(activity_id)
        .execute(&mut *conn)
        .await?;

    for (position, link) in links.iter().enumerate() {
        sqlx::query("INSERT INTO activity_links (id,activity_id,title,url,position) VALUES (?,?,?,?,?)")
            .bind(db::new_id())
            .bind(activity_id)
            .bind(&link.title)
            .bind(&link.url)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Field update and link-set replacement commit together or not at all.
pub async fn update_with_links(db_pool: &SqlitePool, activity: &Activity, links: Option<&[NewLink]>) -> sqlx::Result<()> {
    let mut tx = db_pool.begin().await?;

    write_fields(&mut tx, activity).await?;
    if let Some(links) = links {
        replace_links(&mut tx, &activity.id, links).await?;
    }

    tx.commit().await
}

/// Reassigns the leader only if `current_leader` still holds it, and moves the
/// participant `leader` role along with it.
pub async fn set_leader(conn: &mut SqliteConnection, activity_id: &str, current_leader: &str, new_leader: &str) -> AppResult<bool> {
    let res = sqlx::query("UPDATE activities SET leader_id=?,updated_at=? WHERE id=? AND leader_id=?")
        .bind(new_leader)
        .bind(db::now()?)
        .bind(activity_id)
        .bind(current_leader)
        .execute(&mut *conn)
        .await?;
    if res.rows_affected() != 1 {
        return Ok(false);
    }

    sqlx::query("UPDATE activity_participants SET role = CASE WHEN user_id=? THEN 'leader' ELSE NULL END
                 WHERE activity_id=? AND (user_id=? OR role='leader')")
        .bind(new_leader)
        .bind(activity_id)
        .bind(new_leader)
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

pub async fn delete_activity<'e>(db: impl SqliteExecutor<'e>, activity_id: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM activities WHERE id=?")
        .bind(activity_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn insert_observation<'e>(db: impl SqliteExecutor<'e>, activity_id: &str, author_id: &str, content: &str) -> AppResult<String> {
    let id = db::new_id();
    sqlx::query("INSERT INTO observations (id,activity_id,author_id,content,created_at) VALUES (?,?,?,?,?)")
        .bind(&id)
        .bind(activity_id)
        .bind(author_id)
        .bind(content)
        .bind(db::now()?)
        .execute(db)
        .await?;
    Ok(id)
}

/// Creates a pending invitation, or resets an existing one back to pending.
pub async fn upsert_invitation<'e>(db: impl SqliteExecutor<'e>, activity_id: &str, invitee_id: &str, invited_by: &str) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO activity_invitations (id,activity_id,invitee_id,invited_by,status,created_at) VALUES (?,?,?,?,'pending',?)
         ON CONFLICT (activity_id,invitee_id) DO UPDATE SET status='pending', invited_by=excluded.invited_by, created_at=excluded.created_at",
    )
        .bind(db::new_id())
        .bind(activity_id)
        .bind(invitee_id)
        .bind(invited_by)
        .bind(db::now()?)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn pending_invitation<'e>(db: impl SqliteExecutor<'e>, activity_id: &str, invitee_id: &str) -> sqlx::Result<Option<Invitation>> {
    sqlx::query_as(
        "SELECT id,invited_by,status FROM activity_invitations WHERE activity_id=? AND invitee_id=? AND status='pending'",
    )
        .bind(activity_id)
        .bind(invitee_id)
        .fetch_optional(db)
        .await
}

pub async fn set_invitation_status<'e>(db: impl SqliteExecutor<'e>, invitation_id: &str, status: InvitationStatus) -> sqlx::Result<()> {
    sqlx::query("UPDATE activity_invitations SET status=? WHERE id=?")
        .bind(status)
        .bind(invitation_id)
        .execute(db)
        .await?;
    Ok(())
}
