use crate::domain::{
    models::session::{Participant, ParticipantProfile, ProvisioningStatus, Session, SessionDetails},
    ports::SessionRepository,
    services::conflict,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

const DETAILS_SELECT: &str = r#"
    SELECT s.*,
           c.title AS course_title,
           u.first_name || ' ' || u.last_name AS teacher_name,
           (SELECT COUNT(*) FROM participants p WHERE p.session_id = s.id AND p.role = 'PARTICIPANT') AS participant_count
    FROM sessions s
    JOIN courses c ON c.id = s.course_id
    JOIN users u ON u.id = c.teacher_id
"#;

pub struct PostgresSessionRepo {
    pool: PgPool,
}

impl PostgresSessionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepo {
    async fn create_with_participants(&self, teacher_id: &str, session: &Session, participants: &[Participant]) -> Result<Session, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Row lock on the teacher serializes concurrent scheduling for them.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(teacher_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let overlapping = sqlx::query_as::<_, Session>(
            "SELECT s.* FROM sessions s JOIN courses c ON c.id = s.course_id WHERE c.teacher_id = $1 AND s.start_time < $2 AND s.end_time > $3",
        )
            .bind(teacher_id)
            .bind(session.end_time)
            .bind(session.start_time)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        conflict::ensure_free(&overlapping, session.start_time, session.end_time)?;

        let created = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (id, course_id, title, description, start_time, end_time, call_id, call_link, video_quality, provisioning_status, provisioning_attempted_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *",
        )
            .bind(&session.id).bind(&session.course_id).bind(&session.title).bind(&session.description)
            .bind(session.start_time).bind(session.end_time).bind(&session.call_id).bind(&session.call_link)
            .bind(session.video_quality.as_str()).bind(session.provisioning_status.as_str()).bind(session.provisioning_attempted_at).bind(session.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for participant in participants {
            sqlx::query("INSERT INTO participants (id, session_id, user_id, role, joined_at) VALUES ($1, $2, $3, $4, $5)")
                .bind(&participant.id)
                .bind(&participant.session_id)
                .bind(&participant.user_id)
                .bind(participant.role.as_str())
                .bind(participant.joined_at)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        debug!("Persisted session {} with {} participants", created.id, participants.len());
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_teacher(&self, teacher_id: &str) -> Result<Vec<Session>, AppError> {
        sqlx::query_as::<_, Session>(
            "SELECT s.* FROM sessions s JOIN courses c ON c.id = s.course_id WHERE c.teacher_id = $1 ORDER BY s.start_time ASC, s.id ASC",
        )
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn details_for_teacher(&self, teacher_id: &str, from: NaiveDateTime, to: NaiveDateTime) -> Result<Vec<SessionDetails>, AppError> {
        let query = format!(
            "{} WHERE c.teacher_id = $1 AND s.start_time <= $2 AND s.end_time >= $3 ORDER BY s.start_time ASC, s.id ASC",
            DETAILS_SELECT
        );
        sqlx::query_as::<_, SessionDetails>(&query)
            .bind(teacher_id)
            .bind(to)
            .bind(from)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn details_for_student(&self, student_id: &str, from: NaiveDateTime, to: NaiveDateTime) -> Result<Vec<SessionDetails>, AppError> {
        let query = format!(
            "{} JOIN enrollments e ON e.course_id = c.id
             WHERE e.student_id = $1 AND e.status = 'Aceptada' AND s.start_time <= $2 AND s.end_time >= $3
             ORDER BY s.start_time ASC, s.id ASC",
            DETAILS_SELECT
        );
        sqlx::query_as::<_, SessionDetails>(&query)
            .bind(student_id)
            .bind(to)
            .bind(from)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn details_for_course(&self, course_id: &str) -> Result<Vec<SessionDetails>, AppError> {
        let query = format!("{} WHERE s.course_id = $1 ORDER BY s.start_time ASC, s.id ASC", DETAILS_SELECT);
        sqlx::query_as::<_, SessionDetails>(&query)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_participants(&self, session_id: &str) -> Result<Vec<ParticipantProfile>, AppError> {
        sqlx::query_as::<_, ParticipantProfile>(
            r#"
            SELECT p.user_id, u.first_name || ' ' || u.last_name AS display_name, u.email, p.role, p.joined_at
            FROM participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.session_id = $1
            ORDER BY p.role ASC, display_name ASC
            "#,
        )
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_provisioning_status(&self, id: &str, status: ProvisioningStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE sessions SET provisioning_status = $1, provisioning_attempted_at = $2 WHERE id = $3")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sesión no encontrada".into()));
        }
        Ok(())
    }

    async fn list_by_provisioning_status(&self, status: ProvisioningStatus, limit: i64) -> Result<Vec<Session>, AppError> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE provisioning_status = $1 ORDER BY provisioning_attempted_at ASC NULLS FIRST, created_at ASC LIMIT $2")
            .bind(status.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
