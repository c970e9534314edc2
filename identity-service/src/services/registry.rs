//! External registry lookups: company registry (CNPJ) and postal codes
//! (CEP).
//!
//! Every call is an outbound request with a bounded timeout and no
//! retries; callers own the retry policy. The company lookup also
//! enforces the minimum-company-age business rule, which lives here and
//! only here.

use async_trait::async_trait;
use chrono::{Months, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::utils::{strip_non_digits, validate_cnpj};

/// Companies younger than this many months cannot register.
pub const MINIMUM_COMPANY_AGE_MONTHS: u32 = 6;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("CNPJ is not valid")]
    InvalidCompanyId,

    #[error("CNPJ not found in the national registry")]
    CompanyNotFound,

    #[error("Company must be at least {MINIMUM_COMPANY_AGE_MONTHS} months old (founded {founded_at})")]
    CompanyTooYoung { founded_at: NaiveDate },

    #[error("CEP is not valid")]
    InvalidPostalCode,

    #[error("CEP not found")]
    PostalCodeNotFound,

    #[error("Registry lookup failed: {0}")]
    Unavailable(String),
}

/// Normalized company record from the national registry.
#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub cnpj: String,
    pub name: String,
    pub legal_name: String,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub founded_at: NaiveDate,
    pub status: String,
    pub activity: Option<String>,
    pub raw: serde_json::Value,
}

/// Normalized address record from the postal lookup.
#[derive(Debug, Clone)]
pub struct AddressRecord {
    pub street: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: String,
}

#[async_trait]
pub trait CompanyRegistry: Send + Sync {
    async fn lookup_company(&self, cnpj: &str) -> Result<CompanyRecord, RegistryError>;
    async fn lookup_postal_code(&self, cep: &str) -> Result<AddressRecord, RegistryError>;
}

/// Reject companies founded within the minimum-age window.
///
/// A founding date exactly on the boundary is rejected: the company must
/// be strictly older than the window.
pub fn enforce_minimum_age(founded_at: NaiveDate, today: NaiveDate) -> Result<(), RegistryError> {
    let cutoff = today
        .checked_sub_months(Months::new(MINIMUM_COMPANY_AGE_MONTHS))
        .unwrap_or(today);
    if founded_at >= cutoff {
        return Err(RegistryError::CompanyTooYoung { founded_at });
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CnpjLookupResponse {
    cnpj: Option<String>,
    razao_social: Option<String>,
    nome_fantasia: Option<String>,
    logradouro: Option<String>,
    numero: Option<String>,
    bairro: Option<String>,
    municipio: Option<String>,
    uf: Option<String>,
    cep: Option<String>,
    data_inicio_atividade: Option<String>,
    descricao_situacao_cadastral: Option<String>,
    cnae_fiscal_descricao: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CepLookupResponse {
    #[serde(default)]
    erro: bool,
    logradouro: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    cep: Option<String>,
}

/// HTTP client against the public registry services.
pub struct HttpRegistryClient {
    client: reqwest::Client,
    company_base_url: String,
    postal_base_url: String,
}

impl HttpRegistryClient {
    pub fn new(company_base_url: String, postal_base_url: String) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build registry HTTP client: {}", e))?;

        Ok(Self {
            client,
            company_base_url,
            postal_base_url,
        })
    }
}

#[async_trait]
impl CompanyRegistry for HttpRegistryClient {
    async fn lookup_company(&self, cnpj: &str) -> Result<CompanyRecord, RegistryError> {
        let digits = strip_non_digits(cnpj);
        // Fail fast locally before spending a network round trip.
        if digits.len() != 14 || !validate_cnpj(&digits) {
            return Err(RegistryError::InvalidCompanyId);
        }

        let url = format!("{}/{}", self.company_base_url.trim_end_matches('/'), digits);
        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!(error = %e, cnpj = %digits, "Company registry lookup failed");
            RegistryError::Unavailable(e.to_string())
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::CompanyNotFound);
        }
        if !response.status().is_success() {
            return Err(RegistryError::Unavailable(format!(
                "registry returned {}",
                response.status()
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        let body: CnpjLookupResponse = serde_json::from_value(raw.clone())
            .map_err(|e| RegistryError::Unavailable(format!("malformed registry payload: {}", e)))?;

        let founded_at = body
            .data_inicio_atividade
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or_else(|| {
                RegistryError::Unavailable("registry payload missing founding date".to_string())
            })?;

        enforce_minimum_age(founded_at, Utc::now().date_naive())?;

        let legal_name = body.razao_social.unwrap_or_default();
        let name = body
            .nome_fantasia
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| legal_name.clone());

        Ok(CompanyRecord {
            cnpj: body.cnpj.map(|c| strip_non_digits(&c)).unwrap_or(digits),
            name,
            legal_name,
            street: body.logradouro,
            number: body.numero,
            neighborhood: body.bairro,
            city: body.municipio,
            state: body.uf,
            zip: body.cep.map(|z| strip_non_digits(&z)),
            founded_at,
            status: body
                .descricao_situacao_cadastral
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            activity: body.cnae_fiscal_descricao,
            raw,
        })
    }

    async fn lookup_postal_code(&self, cep: &str) -> Result<AddressRecord, RegistryError> {
        let digits = strip_non_digits(cep);
        if digits.len() != 8 {
            return Err(RegistryError::InvalidPostalCode);
        }

        let url = format!(
            "{}/{}/json",
            self.postal_base_url.trim_end_matches('/'),
            digits
        );
        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!(error = %e, cep = %digits, "Postal code lookup failed");
            RegistryError::Unavailable(e.to_string())
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::PostalCodeNotFound);
        }
        if !response.status().is_success() {
            return Err(RegistryError::Unavailable(format!(
                "postal lookup returned {}",
                response.status()
            )));
        }

        let body: CepLookupResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        if body.erro {
            return Err(RegistryError::PostalCodeNotFound);
        }

        Ok(AddressRecord {
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            state: body.uf,
            zip: body.cep.map(|z| strip_non_digits(&z)).unwrap_or(digits),
        })
    }
}

/// Scriptable registry for tests. Applies the same local validation and
/// age rule as the HTTP client and counts outbound lookups so tests can
/// assert that cheap local checks short-circuit network calls.
#[derive(Default)]
pub struct MockRegistry {
    companies: std::sync::Mutex<std::collections::HashMap<String, CompanyRecord>>,
    addresses: std::sync::Mutex<std::collections::HashMap<String, AddressRecord>>,
    pub company_lookups: AtomicUsize,
    pub postal_lookups: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_company(&self, record: CompanyRecord) {
        self.companies
            .lock()
            .unwrap()
            .insert(record.cnpj.clone(), record);
    }

    pub fn add_address(&self, cep: &str, record: AddressRecord) {
        self.addresses
            .lock()
            .unwrap()
            .insert(strip_non_digits(cep), record);
    }

    pub fn company_lookup_count(&self) -> usize {
        self.company_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompanyRegistry for MockRegistry {
    async fn lookup_company(&self, cnpj: &str) -> Result<CompanyRecord, RegistryError> {
        let digits = strip_non_digits(cnpj);
        if digits.len() != 14 || !validate_cnpj(&digits) {
            return Err(RegistryError::InvalidCompanyId);
        }

        self.company_lookups.fetch_add(1, Ordering::SeqCst);

        let record = self
            .companies
            .lock()
            .unwrap()
            .get(&digits)
            .cloned()
            .ok_or(RegistryError::CompanyNotFound)?;

        enforce_minimum_age(record.founded_at, Utc::now().date_naive())?;
        Ok(record)
    }

    async fn lookup_postal_code(&self, cep: &str) -> Result<AddressRecord, RegistryError> {
        let digits = strip_non_digits(cep);
        if digits.len() != 8 {
            return Err(RegistryError::InvalidPostalCode);
        }

        self.postal_lookups.fetch_add(1, Ordering::SeqCst);

        self.addresses
            .lock()
            .unwrap()
            .get(&digits)
            .cloned()
            .ok_or(RegistryError::PostalCodeNotFound)
    }
}
