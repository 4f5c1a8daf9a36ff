use anyhow::Context;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{ContractRecord, Sampling};

/// `bene_id` is a BIGINT; cast so it decodes straight into the `String` pools.
const BENE_IDS_SELECT: &str = r#"SELECT "bene_id"::TEXT FROM "beneficiaries""#;
const CONTRACTS_SELECT: &str = r#"SELECT DISTINCT "partd_contract_number_id", EXTRACT(YEAR FROM "year_month")::INT::TEXT FROM "beneficiary_monthly""#;
const HASHED_MBIS_SELECT: &str = r#"SELECT "mbi_hash" FROM "beneficiaries""#;

/// Fixture queries against the BFD Postgres database.
///
/// Every query samples with `TABLESAMPLE SYSTEM` when a percentage is given,
/// so a load test never has to scan the full beneficiary table.
pub struct DatabaseSource {
    pool: PgPool,
}

impl DatabaseSource {
    pub async fn connect(uri: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(uri)
            .await?;
        Ok(Self { pool })
    }

    /// Beneficiary IDs for `patient`, `beneficiary` and `_id` searches.
    pub async fn bene_ids(&self, sampling: &Sampling) -> anyhow::Result<Vec<String>> {
        let sql = select_sql(BENE_IDS_SELECT, None, sampling);
        tracing::debug!(%sql, "querying bene ids");
        let rows: Vec<String> = sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .context("bene_ids query failed")?;
        Ok(rows)
    }

    /// Distinct Part D contract / reference year pairs.
    pub async fn contract_ids(&self, sampling: &Sampling) -> anyhow::Result<Vec<ContractRecord>> {
        let sql = select_sql(
            CONTRACTS_SELECT,
            Some(r#""partd_contract_number_id" IS NOT NULL"#),
            sampling,
        );
        tracing::debug!(%sql, "querying contract ids");
        let rows: Vec<(String, String)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .context("contract_data query failed")?;
        Ok(rows
            .into_iter()
            .map(|(id, year)| ContractRecord { id, year })
            .collect())
    }

    /// Hashed MBIs for `identifier` searches.
    pub async fn hashed_mbis(&self, sampling: &Sampling) -> anyhow::Result<Vec<String>> {
        let sql = select_sql(
            HASHED_MBIS_SELECT,
            Some(r#""mbi_hash" IS NOT NULL"#),
            sampling,
        );
        tracing::debug!(%sql, "querying hashed mbis");
        let rows: Vec<String> = sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .context("hashed_mbis query failed")?;
        Ok(rows)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Assemble `select [TABLESAMPLE SYSTEM (p)] [WHERE filter] [LIMIT n]`.
///
/// The sampling values are numeric and validated by the config layer, so
/// they are rendered inline rather than bound.
fn select_sql(select: &str, filter: Option<&str>, sampling: &Sampling) -> String {
    let mut sql = select.to_string();
    if let Some(pct) = sampling.table_sample_percent {
        sql.push_str(&format!(" TABLESAMPLE SYSTEM ({pct})"));
    }
    if let Some(filter) = filter {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
    if let Some(limit) = sampling.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_full_scan() {
        let sql = select_sql(r#"SELECT "bene_id" FROM "beneficiaries""#, None, &Sampling::full());
        assert_eq!(sql, r#"SELECT "bene_id" FROM "beneficiaries""#);
    }

    #[test]
    fn test_select_sql_sampled_with_filter_and_limit() {
        let sampling = Sampling {
            table_sample_percent: Some(0.25),
            limit: Some(100_000),
        };
        let sql = select_sql(
            HASHED_MBIS_SELECT,
            Some(r#""mbi_hash" IS NOT NULL"#),
            &sampling,
        );
        assert_eq!(
            sql,
            r#"SELECT "mbi_hash" FROM "beneficiaries" TABLESAMPLE SYSTEM (0.25) WHERE "mbi_hash" IS NOT NULL LIMIT 100000"#
        );
    }

    #[test]
    fn test_bene_ids_select_casts_to_text() {
        let sampling = Sampling {
            table_sample_percent: Some(1.0),
            limit: Some(5),
        };
        assert_eq!(
            select_sql(BENE_IDS_SELECT, None, &sampling),
            r#"SELECT "bene_id"::TEXT FROM "beneficiaries" TABLESAMPLE SYSTEM (1) LIMIT 5"#
        );
        assert!(CONTRACTS_SELECT.contains("::INT::TEXT"));
    }

    #[test]
    fn test_select_sql_limit_without_sample() {
        let sampling = Sampling {
            table_sample_percent: None,
            limit: Some(10),
        };
        let sql = select_sql(r#"SELECT "bene_id" FROM "beneficiaries""#, None, &sampling);
        assert_eq!(sql, r#"SELECT "bene_id" FROM "beneficiaries" LIMIT 10"#);
    }
}
