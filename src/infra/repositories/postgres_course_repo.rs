use crate::domain::{
    models::course::{Course, CourseListing, CourseOverview, CourseStatus},
    ports::CourseRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{Row, PgPool};

pub struct PostgresCourseRepo {
    pool: PgPool,
}

impl PostgresCourseRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for PostgresCourseRepo {
    async fn create(&self, course: &Course) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            "INSERT INTO courses (id, title, description, teacher_id, status, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
            .bind(&course.id)
            .bind(&course.title)
            .bind(&course.description)
            .bind(&course.teacher_id)
            .bind(course.status.as_str())
            .bind(course.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Course>, AppError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_teacher_and_title(&self, teacher_id: &str, title: &str) -> Result<Option<Course>, AppError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE teacher_id = $1 AND title = $2")
            .bind(teacher_id)
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_teacher(&self, teacher_id: &str, status: Option<CourseStatus>) -> Result<Vec<Course>, AppError> {
        match status {
            Some(status) => sqlx::query_as::<_, Course>(
                "SELECT * FROM courses WHERE teacher_id = $1 AND status = $2 ORDER BY created_at DESC",
            )
                .bind(teacher_id)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await,
            None => sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE teacher_id = $1 ORDER BY created_at DESC")
                .bind(teacher_id)
                .fetch_all(&self.pool)
                .await,
        }
        .map_err(AppError::Database)
    }

    async fn count_by_teacher(&self, teacher_id: &str) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM courses WHERE teacher_id = $1")
            .bind(teacher_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn set_status(&self, id: &str, status: CourseStatus) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>("UPDATE courses SET status = $1 WHERE id = $2 RETURNING *")
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Curso no encontrado".into()))
    }

    async fn list_enrolled(&self, student_id: &str) -> Result<Vec<CourseListing>, AppError> {
        sqlx::query_as::<_, CourseListing>(
            r#"
            SELECT c.*, u.first_name || ' ' || u.last_name AS teacher_name
            FROM courses c
            JOIN enrollments e ON e.course_id = c.id
            JOIN users u ON u.id = c.teacher_id
            WHERE e.student_id = $1 AND e.status = 'Aceptada'
            ORDER BY c.title ASC
            "#,
        )
            .bind(student_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_available(&self, student_id: &str) -> Result<Vec<CourseListing>, AppError> {
        sqlx::query_as::<_, CourseListing>(
            r#"
            SELECT c.*, u.first_name || ' ' || u.last_name AS teacher_name
            FROM courses c
            JOIN users u ON u.id = c.teacher_id
            WHERE c.status = 'Activo'
            AND NOT EXISTS (
                SELECT 1 FROM enrollments e WHERE e.course_id = c.id AND e.student_id = $1
            )
            ORDER BY c.title ASC
            "#,
        )
            .bind(student_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_overview(&self) -> Result<Vec<CourseOverview>, AppError> {
        sqlx::query_as::<_, CourseOverview>(
            r#"
            SELECT c.*,
                   u.first_name || ' ' || u.last_name AS teacher_name,
                   (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id AND e.status = 'Aceptada') AS student_count
            FROM courses c
            JOIN users u ON u.id = c.teacher_id
            ORDER BY c.created_at DESC, c.id ASC
            "#,
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
