//! # Fixtures Module
//!
//! Test data for the request templates: beneficiary IDs, Part D contract
//! records and hashed MBIs.
//!
//! ## Overview
//!
//! Fixtures are loaded once, before the attack starts, into [`Fixtures`]:
//! three read-only master lists shared by every virtual user. When a user
//! starts it takes a [`FixturePool`] per list, a private shuffled copy it
//! consumes with `pop()`.
//!
//! ## Sources
//!
//! - [`DatabaseSource`] - samples the BFD Postgres database
//!   (`TABLESAMPLE SYSTEM`), the normal mode for runs against a real
//!   environment
//! - [`FileSource`] - a JSON or YAML document, for local runs and tests
//!
//! Exactly one source is configured; see [`crate::config::SuiteConfig`].

mod database;
mod file;
mod pool;

pub use database::DatabaseSource;
pub use file::{FileSource, FixtureDocument};
pub use pool::{FixturePool, OnExhausted};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::SuiteConfig;

/// A Part D contract and the reference year it was active in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContractRecord {
    pub id: String,
    pub year: String,
}

/// The three fixture lists, named as they appear in logs and fixture files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureKind {
    BeneIds,
    ContractData,
    HashedMbis,
}

impl FixtureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureKind::BeneIds => "bene_ids",
            FixtureKind::ContractData => "contract_data",
            FixtureKind::HashedMbis => "hashed_mbis",
        }
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of a table to read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    /// `TABLESAMPLE SYSTEM` percentage; `None` scans the whole table.
    pub table_sample_percent: Option<f32>,
    /// Maximum rows per fixture list.
    pub limit: Option<i64>,
}

impl Sampling {
    pub fn full() -> Self {
        Self {
            table_sample_percent: None,
            limit: None,
        }
    }

    /// Truncate an already loaded list to `limit`.
    pub(crate) fn truncate<T>(&self, items: &mut Vec<T>) {
        if let Some(limit) = self.limit {
            items.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
    }
}

/// Shared, read-only master fixture lists.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub bene_ids: Arc<[String]>,
    pub contract_data: Arc<[ContractRecord]>,
    pub hashed_mbis: Arc<[String]>,
}

impl Fixtures {
    pub fn new(
        bene_ids: Vec<String>,
        contract_data: Vec<ContractRecord>,
        hashed_mbis: Vec<String>,
    ) -> Self {
        Self {
            bene_ids: bene_ids.into(),
            contract_data: contract_data.into(),
            hashed_mbis: hashed_mbis.into(),
        }
    }

    pub fn len_of(&self, kind: FixtureKind) -> usize {
        match kind {
            FixtureKind::BeneIds => self.bene_ids.len(),
            FixtureKind::ContractData => self.contract_data.len(),
            FixtureKind::HashedMbis => self.hashed_mbis.len(),
        }
    }
}

/// Load all three lists from whichever source `config` names.
pub async fn load(config: &SuiteConfig) -> anyhow::Result<Fixtures> {
    let sampling = config.sampling();

    let fixtures = if let Some(uri) = &config.database_uri {
        let source = DatabaseSource::connect(uri)
            .await
            .context("Failed to connect to the fixture database")?;
        let bene_ids = load_data(FixtureKind::BeneIds, source.bene_ids(&sampling)).await?;
        let contract_data =
            load_data(FixtureKind::ContractData, source.contract_ids(&sampling)).await?;
        let hashed_mbis =
            load_data(FixtureKind::HashedMbis, source.hashed_mbis(&sampling)).await?;
        source.close().await;
        Fixtures::new(bene_ids, contract_data, hashed_mbis)
    } else if let Some(path) = &config.fixture_file {
        let source = FileSource::open(path)?;
        let bene_ids = load_data(FixtureKind::BeneIds, async { anyhow::Ok(source.bene_ids(&sampling)) }).await?;
        let contract_data =
            load_data(FixtureKind::ContractData, async { anyhow::Ok(source.contract_ids(&sampling)) })
                .await?;
        let hashed_mbis =
            load_data(FixtureKind::HashedMbis, async { anyhow::Ok(source.hashed_mbis(&sampling)) })
                .await?;
        Fixtures::new(bene_ids, contract_data, hashed_mbis)
    } else {
        return Err(crate::error::ConfigError::NoDataSource.into());
    };

    Ok(fixtures)
}

/// Await one fixture query and log how much came back.
async fn load_data<T, F>(kind: FixtureKind, query: F) -> anyhow::Result<Vec<T>>
where
    F: Future<Output = anyhow::Result<Vec<T>>>,
{
    let started = std::time::Instant::now();
    let items = query
        .await
        .with_context(|| format!("Failed to load {kind} fixtures"))?;
    if items.is_empty() {
        tracing::warn!(data_type = %kind, "no fixture data loaded; tasks using it will stop or back off");
    } else {
        tracing::info!(
            data_type = %kind,
            count = items.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "loaded fixture data"
        );
    }
    Ok(items)
}
