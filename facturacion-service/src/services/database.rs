//! Database service for facturacion-service.

use crate::models::{
    ActualizacionIngreso, EstadoSunat, Ingreso, NuevoIngreso, ResumenDiario, ResumenEnviado,
    SocioTitular,
};
use crate::services::ledger::LedgerStore;
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "facturacion-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Store(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for Database {
    #[instrument(skip(self))]
    async fn find_ingreso_by_receipt(
        &self,
        receipt_number: &str,
    ) -> Result<Option<Ingreso>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_ingreso_by_receipt"])
            .start_timer();

        let ingreso = sqlx::query_as::<_, Ingreso>(
            r#"
            SELECT id, date, amount, transaction_type, receipt_number, dni, created_utc
            FROM ingresos
            WHERE receipt_number = $1
            "#,
        )
        .bind(receipt_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to look up income record: {}", e)))?;

        timer.observe_duration();

        Ok(ingreso)
    }

    #[instrument(skip(self, nuevo), fields(receipt = %nuevo.receipt_number))]
    async fn insert_ingreso(&self, nuevo: &NuevoIngreso) -> Result<Ingreso, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_ingreso"])
            .start_timer();

        let ingreso = sqlx::query_as::<_, Ingreso>(
            r#"
            INSERT INTO ingresos (date, amount, transaction_type, receipt_number, dni)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, date, amount, transaction_type, receipt_number, dni, created_utc
            "#,
        )
        .bind(nuevo.date)
        .bind(nuevo.amount)
        .bind(&nuevo.transaction_type)
        .bind(&nuevo.receipt_number)
        .bind(&nuevo.dni)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => AppError::Store(
                anyhow::anyhow!("Income record '{}' already exists", nuevo.receipt_number),
            ),
            _ => AppError::Store(anyhow::anyhow!("Failed to insert income record: {}", e)),
        })?;

        timer.observe_duration();

        info!(ingreso_id = ingreso.id, receipt = %nuevo.receipt_number, "Income record created");

        Ok(ingreso)
    }

    #[instrument(skip(self, cambios))]
    async fn update_ingreso(
        &self,
        ingreso_id: i64,
        cambios: &ActualizacionIngreso,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_ingreso"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE ingresos
            SET amount = $2, transaction_type = $3, receipt_number = $4
            WHERE id = $1
            "#,
        )
        .bind(ingreso_id)
        .bind(cambios.amount)
        .bind(&cambios.transaction_type)
        .bind(&cambios.receipt_number)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to update income record: {}", e)))?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::Store(anyhow::anyhow!(
                "Income record {} no longer exists",
                ingreso_id
            )));
        }

        info!(ingreso_id, receipt = %cambios.receipt_number, "Income record rewritten");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_socio_by_dni(&self, dni: &str) -> Result<Option<SocioTitular>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_socio_by_dni"])
            .start_timer();

        let socio = sqlx::query_as::<_, SocioTitular>(
            r#"
            SELECT id, dni, nombres, apellido_paterno, apellido_materno,
                   direccion_dni, distrito_dni, provincia_dni, region_dni, celular
            FROM socio_titulares
            WHERE dni = $1
            "#,
        )
        .bind(dni)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to look up client: {}", e)))?;

        timer.observe_duration();

        Ok(socio)
    }

    #[instrument(skip(self, resumen), fields(numero = %resumen.numero_completo))]
    async fn insert_resumen(&self, resumen: &ResumenEnviado) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_resumen"])
            .start_timer();

        let (resumen_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO resumenes_diarios
                (fecha_resumen, numero_completo, correlativo, ticket, estado_sunat, summary_api_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(resumen.fecha_resumen)
        .bind(&resumen.numero_completo)
        .bind(resumen.correlativo)
        .bind(&resumen.ticket)
        .bind(resumen.estado_sunat.as_str())
        .bind(resumen.summary_api_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to insert summary header: {}", e)))?;

        timer.observe_duration();

        info!(resumen_id, numero = %resumen.numero_completo, "Summary header stored");

        Ok(resumen_id)
    }

    #[instrument(skip(self))]
    async fn delete_resumen(&self, resumen_id: i64) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_resumen"])
            .start_timer();

        sqlx::query("DELETE FROM resumenes_diarios WHERE id = $1")
            .bind(resumen_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Store(anyhow::anyhow!("Failed to delete summary header: {}", e))
            })?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self, series), fields(count = series.len()))]
    async fn insert_resumen_detalles(
        &self,
        resumen_id: i64,
        series: &[String],
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_resumen_detalles"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::Store(anyhow::anyhow!("Failed to start detail transaction: {}", e))
        })?;

        for serie_numero in series {
            sqlx::query(
                r#"
                INSERT INTO resumen_diario_boletas (resumen_id, serie_numero)
                VALUES ($1, $2)
                "#,
            )
            .bind(resumen_id)
            .bind(serie_numero)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::Store(anyhow::anyhow!("Failed to insert summary detail: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::Store(anyhow::anyhow!("Failed to commit summary details: {}", e))
        })?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_resumen(&self, resumen_id: i64) -> Result<Option<ResumenDiario>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_resumen"])
            .start_timer();

        let resumen = sqlx::query_as::<_, ResumenDiario>(
            r#"
            SELECT id, fecha_resumen, numero_completo, correlativo, ticket,
                   estado_sunat, summary_api_id, created_utc
            FROM resumenes_diarios
            WHERE id = $1
            "#,
        )
        .bind(resumen_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to load summary: {}", e)))?;

        timer.observe_duration();

        Ok(resumen)
    }

    #[instrument(skip(self))]
    async fn list_resumenes(&self) -> Result<Vec<ResumenDiario>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_resumenes"])
            .start_timer();

        let resumenes = sqlx::query_as::<_, ResumenDiario>(
            r#"
            SELECT id, fecha_resumen, numero_completo, correlativo, ticket,
                   estado_sunat, summary_api_id, created_utc
            FROM resumenes_diarios
            ORDER BY fecha_resumen DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Store(anyhow::anyhow!("Failed to list summaries: {}", e)))?;

        timer.observe_duration();

        Ok(resumenes)
    }

    #[instrument(skip(self))]
    async fn update_estado_resumen(
        &self,
        resumen_id: i64,
        estado: EstadoSunat,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_estado_resumen"])
            .start_timer();

        let result = sqlx::query("UPDATE resumenes_diarios SET estado_sunat = $2 WHERE id = $1")
            .bind(resumen_id)
            .bind(estado.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Store(anyhow::anyhow!("Failed to update summary status: {}", e))
            })?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::Store(anyhow::anyhow!(
                "Summary {} no longer exists",
                resumen_id
            )));
        }

        info!(resumen_id, estado = %estado, "Summary status updated");

        Ok(())
    }
}
