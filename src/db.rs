use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::credentials::hash_password_async;
use crate::error::StoreError;
use crate::models::{Company, DependentApplication, StudentRecord, ValidatedStudentInput};
use crate::store::{CompanyStore, StudentStore};
use crate::validate::CredentialPolicy;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn seed(&self, credentials: &CredentialPolicy) -> anyhow::Result<()> {
        let companies = vec![
            (
                Uuid::parse_str("5b1c2f0e-7d4a-4e7b-9a61-1f0c8d2e4b10")?,
                "Northwind Analytics",
            ),
            (
                Uuid::parse_str("a8e3c7d2-0b5f-4c19-8d6e-2f7a9b3c1d44")?,
                "Contoso Robotics",
            ),
        ];

        for (id, name) in &companies {
            sqlx::query(
                r#"
                INSERT INTO placement.companies (id, name)
                VALUES ($1, $2)
                ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
                "#,
            )
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        }

        let students = vec![
            (
                "Avery Lee",
                "avery.lee@campus.edu",
                "CS101",
                "https://res.cloudinary.com/placement/raw/upload/v1712000000/resumes/cs101_avery_lee.pdf",
            ),
            (
                "Jules Moreno",
                "jules.moreno@campus.edu",
                "CS102",
                "https://res.cloudinary.com/placement/raw/upload/v1712000001/resumes/cs102_jules_moreno.pdf",
            ),
            (
                "Kiara Patel",
                "kiara.patel@campus.edu",
                "EE201",
                "https://res.cloudinary.com/placement/image/upload/v1712000002/resumes/ee201_kiara_patel.pdf",
            ),
        ];

        for (name, email, roll_no, resume) in students {
            let password_hash = hash_password_async(credentials.initial_password(roll_no))
                .await
                .context("failed to hash seed password")?;
            let student_id: Uuid = sqlx::query(
                r#"
                INSERT INTO placement.students
                (id, name, email, roll_no, role, course, graduation_year, default_resume, password_hash)
                VALUES ($1, $2, $3, $4, 'student', 'B.Tech', 2026, $5, $6)
                ON CONFLICT (email) DO UPDATE
                SET name = EXCLUDED.name, default_resume = EXCLUDED.default_resume
                RETURNING id
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(email)
            .bind(roll_no)
            .bind(resume)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?
            .get("id");

            for (company_id, _) in &companies {
                sqlx::query(
                    r#"
                    INSERT INTO placement.applications (id, company_id, student_id, resume_url)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (company_id, student_id) DO NOTHING
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(company_id)
                .bind(student_id)
                .bind(resume)
                .execute(&self.pool)
                .await
                .context("failed to seed application")?;
            }
        }

        Ok(())
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    let duplicate = err
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .map(|db| db.constraint().unwrap_or("unique").to_string());
    match duplicate {
        Some(constraint) => StoreError::DuplicateKey(constraint),
        None => StoreError::Database(err),
    }
}

fn application_from_row(row: &sqlx::postgres::PgRow) -> DependentApplication {
    DependentApplication {
        id: row.get("id"),
        company_id: row.get("company_id"),
        resume_url: row.get("resume_url"),
    }
}

#[async_trait]
impl StudentStore for PgStore {
    async fn insert_student(
        &self,
        student: &ValidatedStudentInput,
    ) -> Result<StudentRecord, StoreError> {
        let password_hash = hash_password_async(student.initial_password.clone()).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO placement.students
            (id, name, email, roll_no, role, semester, course, graduation_year,
             default_resume, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, name, email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.roll_no)
        .bind(student.role.as_str())
        .bind(&student.semester)
        .bind(&student.course)
        .bind(student.graduation_year)
        .bind(&student.default_resume)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(StudentRecord {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
        })
    }
}

#[async_trait]
impl CompanyStore for PgStore {
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query("SELECT id, name, created_at FROM placement.companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Company {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        }))
    }

    async fn applications_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<DependentApplication>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, company_id, resume_url FROM placement.applications WHERE company_id = $1",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(application_from_row).collect())
    }

    async fn all_applications(&self) -> Result<Vec<DependentApplication>, StoreError> {
        let rows = sqlx::query("SELECT id, company_id, resume_url FROM placement.applications")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(application_from_row).collect())
    }

    async fn delete_company_with_applications(&self, company_id: Uuid) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM placement.applications WHERE company_id = $1")
            .bind(company_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM placement.companies WHERE id = $1")
            .bind(company_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(removed)
    }
}
