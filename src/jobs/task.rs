use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::ObjectRef;
use crate::{GenomeCmpError, Result};

pub const DEFAULT_MAX_EVALUE: &str = "1e-10";
pub const DEFAULT_SUB_BBH_PERCENT: f64 = 90.0;

/// Credential passed through to the object store and job-status service
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn anonymous() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Parameters of one proteome comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonParams {
    pub genome1_ref: String,
    pub genome2_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_evalue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_bbh_percent: Option<f64>,
    pub output_ref: String,
}

impl ComparisonParams {
    pub fn new(
        genome1_ref: impl Into<String>,
        genome2_ref: impl Into<String>,
        output_ref: impl Into<String>,
    ) -> Self {
        Self {
            genome1_ref: genome1_ref.into(),
            genome2_ref: genome2_ref.into(),
            max_evalue: None,
            sub_bbh_percent: None,
            output_ref: output_ref.into(),
        }
    }

    pub fn with_max_evalue(mut self, max_evalue: impl Into<String>) -> Self {
        self.max_evalue = Some(max_evalue.into());
        self
    }

    pub fn with_sub_bbh_percent(mut self, percent: f64) -> Self {
        self.sub_bbh_percent = Some(percent);
        self
    }

    pub fn max_evalue(&self) -> &str {
        self.max_evalue.as_deref().unwrap_or(DEFAULT_MAX_EVALUE)
    }

    pub fn sub_bbh_percent(&self) -> f64 {
        self.sub_bbh_percent.unwrap_or(DEFAULT_SUB_BBH_PERCENT)
    }

    /// Fill unset optional values from configured defaults
    pub fn or_defaults(mut self, max_evalue: &str, sub_bbh_percent: f64) -> Self {
        if self.max_evalue.is_none() {
            self.max_evalue = Some(max_evalue.to_string());
        }
        if self.sub_bbh_percent.is_none() {
            self.sub_bbh_percent = Some(sub_bbh_percent);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("genome1_ref", &self.genome1_ref),
            ("genome2_ref", &self.genome2_ref),
            ("output_ref", &self.output_ref),
        ] {
            if value.trim().is_empty() {
                return Err(GenomeCmpError::Submission(format!("{} is required", field)));
            }
        }
        ObjectRef::parse(&self.output_ref)
            .map_err(|e| GenomeCmpError::Submission(format!("output_ref: {}", e.detail())))?;
        if self.max_evalue().trim().is_empty() {
            return Err(GenomeCmpError::Submission("max_evalue must not be empty".to_string()));
        }
        let percent = self.sub_bbh_percent();
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(GenomeCmpError::Submission(format!(
                "sub_bbh_percent must be within 0..=100, got {}",
                percent
            )));
        }
        Ok(())
    }

    /// Flattened description recorded with the job
    pub fn job_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        data.insert("genome1_ref".to_string(), self.genome1_ref.clone());
        data.insert("genome2_ref".to_string(), self.genome2_ref.clone());
        data.insert("max_evalue".to_string(), self.max_evalue().to_string());
        data.insert(
            "sub_bbh_percent".to_string(),
            self.sub_bbh_percent().to_string(),
        );
        data.insert("output_ref".to_string(), self.output_ref.clone());
        data
    }
}

/// A submitted comparison, owned by the queue until it reaches `done`
#[derive(Debug, Clone)]
pub struct Task {
    job_id: String,
    params: ComparisonParams,
    token: AuthToken,
}

impl Task {
    pub fn new(job_id: String, params: ComparisonParams, token: AuthToken) -> Self {
        Self {
            job_id,
            params,
            token,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn params(&self) -> &ComparisonParams {
        &self.params
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }
}
