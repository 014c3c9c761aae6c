use crate::domain::{
    models::enrollment::{Enrollment, InvitationStatus},
    ports::EnrollmentRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{Row, PgPool};

pub struct PostgresEnrollmentRepo {
    pool: PgPool,
}

impl PostgresEnrollmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for PostgresEnrollmentRepo {
    async fn create(&self, enrollment: &Enrollment) -> Result<Enrollment, AppError> {
        sqlx::query_as::<_, Enrollment>(
            "INSERT INTO enrollments (id, course_id, student_id, status, join_code, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
            .bind(&enrollment.id)
            .bind(&enrollment.course_id)
            .bind(&enrollment.student_id)
            .bind(enrollment.status.as_str())
            .bind(&enrollment.join_code)
            .bind(enrollment.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find(&self, course_id: &str, student_id: &str) -> Result<Option<Enrollment>, AppError> {
        sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE course_id = $1 AND student_id = $2")
            .bind(course_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_course(&self, course_id: &str, status: InvitationStatus) -> Result<Vec<Enrollment>, AppError> {
        sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE course_id = $1 AND status = $2 ORDER BY created_at ASC, id ASC",
        )
            .bind(course_id)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_by_student(&self, student_id: &str, status: InvitationStatus) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM enrollments WHERE student_id = $1 AND status = $2")
            .bind(student_id)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }
}
