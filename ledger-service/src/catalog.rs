//! Fund catalog
//!
//! The funds offered to clients are configuration data. The default catalog
//! is embedded from `config/funds.json`; a deployment can point
//! `FUND_CATALOG_PATH` at its own file with the same shape.

use std::collections::HashSet;
use std::fs;

use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::{Fund, FundType, RiskLevel};
use serde::Deserialize;
use tracing::info;

const EMBEDDED_CATALOG: &str = include_str!("../config/funds.json");

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FundDefinition {
    pub fund_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub fund_type: FundType,
    pub min_amount: Amount,
    pub max_amount: Amount,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub description: Option<String>,
}

impl FundDefinition {
    /// Materialize as a fund stamped with the current time
    pub fn to_fund(&self) -> Fund {
        Fund::new(
            self.fund_id.clone(),
            self.name.clone(),
            self.fund_type,
            self.min_amount,
            self.max_amount,
            self.risk_level,
            self.description.clone(),
        )
    }
}

/// Validated list of fund definitions
#[derive(Debug, Clone)]
pub struct FundCatalog {
    funds: Vec<FundDefinition>,
}

impl FundCatalog {
    /// Parse and validate a JSON catalog
    pub fn from_json(json: &str) -> Result<Self> {
        let funds: Vec<FundDefinition> = serde_json::from_str(json)
            .map_err(|e| Error::ConfigurationError(format!("Invalid fund catalog: {}", e)))?;
        Self::new(funds)
    }

    /// Load a catalog file
    pub fn from_path(path: &str) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            Error::ConfigurationError(format!("Cannot read fund catalog {}: {}", path, e))
        })?;
        info!("Loaded fund catalog from {}", path);
        Self::from_json(&json)
    }

    /// The catalog compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// `path` if given, else the embedded catalog
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    /// Validate a list of definitions
    pub fn new(funds: Vec<FundDefinition>) -> Result<Self> {
        if funds.is_empty() {
            return Err(Error::ConfigurationError("Fund catalog is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for fund in &funds {
            if fund.fund_id.trim().is_empty() {
                return Err(Error::ConfigurationError("Fund catalog entry without an ID".to_string()));
            }
            if !seen.insert(fund.fund_id.as_str()) {
                return Err(Error::ConfigurationError(format!(
                    "Duplicate fund ID in catalog: {}",
                    fund.fund_id
                )));
            }
            if fund.min_amount <= Amount::ZERO || fund.min_amount > fund.max_amount {
                return Err(Error::ConfigurationError(format!(
                    "Fund {} has an invalid amount range {}..{}",
                    fund.fund_id, fund.min_amount, fund.max_amount
                )));
            }
        }

        Ok(Self { funds })
    }

    pub fn definitions(&self) -> &[FundDefinition] {
        &self.funds
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }
}
