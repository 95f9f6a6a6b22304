//! Fund catalog models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Fund type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum FundType {
    /// Voluntary pension fund
    FPV,
    /// Collective investment fund
    FIC,
}

impl FundType {
    /// Wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            FundType::FPV => "FPV",
            FundType::FIC => "FIC",
        }
    }
}

impl FromStr for FundType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FPV" => Ok(FundType::FPV),
            "FIC" => Ok(FundType::FIC),
            other => Err(format!("Unknown fund type: {}", other)),
        }
    }
}

impl fmt::Display for FundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level of a fund
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum RiskLevel {
    #[serde(rename = "BAJO")]
    Low,
    #[serde(rename = "MEDIO")]
    Medium,
    #[serde(rename = "ALTO")]
    High,
}

impl RiskLevel {
    /// Wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "BAJO",
            RiskLevel::Medium => "MEDIO",
            RiskLevel::High => "ALTO",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BAJO" => Ok(RiskLevel::Low),
            "MEDIO" => Ok(RiskLevel::Medium),
            "ALTO" => Ok(RiskLevel::High),
            other => Err(format!("Unknown risk level: {}", other)),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fund model, an immutable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Fund {
    /// Fund ID ("1".."5" for the seed catalog)
    pub fund_id: String,
    /// Display name
    pub name: String,
    /// Fund type
    #[serde(rename = "type")]
    pub fund_type: FundType,
    /// Amount charged on subscription
    pub min_amount: Amount,
    /// Upper bound advertised by the fund
    pub max_amount: Amount,
    /// Risk level
    pub risk_level: RiskLevel,
    /// Free-text description
    pub description: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Fund {
    /// Create a new fund stamped with the current time
    pub fn new(
        fund_id: impl Into<String>,
        name: impl Into<String>,
        fund_type: FundType,
        min_amount: Amount,
        max_amount: Amount,
        risk_level: RiskLevel,
        description: Option<String>,
    ) -> Self {
        Self {
            fund_id: fund_id.into(),
            name: name.into(),
            fund_type,
            min_amount,
            max_amount,
            risk_level,
            description,
            created_at: Utc::now(),
        }
    }

    /// The amount charged when a client subscribes
    pub fn subscription_amount(&self) -> Amount {
        self.min_amount
    }
}

/// Fund details attached to subscription failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct FundInfo {
    pub fund_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub fund_type: FundType,
    pub min_amount: Amount,
    pub max_amount: Amount,
    pub risk_level: RiskLevel,
    pub description: Option<String>,
}

impl From<&Fund> for FundInfo {
    fn from(fund: &Fund) -> Self {
        Self {
            fund_id: fund.fund_id.clone(),
            name: fund.name.clone(),
            fund_type: fund.fund_type,
            min_amount: fund.min_amount,
            max_amount: fund.max_amount,
            risk_level: fund.risk_level,
            description: fund.description.clone(),
        }
    }
}
