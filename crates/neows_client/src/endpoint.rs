//! The fixed set of provider operations this client issues.

use common::{DateWindow, Error};

/// NeoWs caps browse pages at this size.
pub const MAX_PAGE_SIZE: u32 = 20;

const MAX_DESIGNATION_LEN: usize = 32;

/// Which upstream answers an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// api.nasa.gov NeoWs; requests carry `api_key`.
    NeoWs,
    /// JPL Sentry; keyless.
    Sentry,
}

/// One provider operation with its required parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /feed?start_date=..&end_date=..`
    Feed { window: DateWindow },
    /// `GET /neo/browse?page=..&size=..`
    Browse { page: u32, size: u32 },
    /// `GET /neo/{id}`
    Lookup { id: String },
    /// `GET sentry.api?des=..`
    Sentry { designation: String },
}

impl Endpoint {
    pub fn feed(window: DateWindow) -> Self {
        Endpoint::Feed { window }
    }

    pub fn browse(page: u32, size: u32) -> Result<Self, Error> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(Error::InvalidParameter(format!(
                "browse page size must be in 1..={MAX_PAGE_SIZE}, got {size}"
            )));
        }
        Ok(Endpoint::Browse { page, size })
    }

    /// Lookup by SPK-ID. Ids are embedded in the path, so only
    /// alphanumerics are accepted.
    pub fn lookup(id: &str) -> Result<Self, Error> {
        let id = id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidParameter(format!(
                "asteroid id must be non-empty and alphanumeric, got '{id}'"
            )));
        }
        Ok(Endpoint::Lookup { id: id.to_string() })
    }

    pub fn sentry(designation: &str) -> Result<Self, Error> {
        Ok(Endpoint::Sentry {
            designation: normalize_designation(designation)?,
        })
    }

    pub fn service(&self) -> Service {
        match self {
            Endpoint::Sentry { .. } => Service::Sentry,
            _ => Service::NeoWs,
        }
    }

    /// Path relative to the service's base URL.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Feed { .. } => "/feed".to_string(),
            Endpoint::Browse { .. } => "/neo/browse".to_string(),
            Endpoint::Lookup { id } => format!("/neo/{id}"),
            Endpoint::Sentry { .. } => String::new(),
        }
    }

    /// Query parameters, excluding the API key.
    pub fn query(&self) -> Vec<(String, String)> {
        match self {
            Endpoint::Feed { window } => vec![
                ("start_date".to_string(), window.start_date()),
                ("end_date".to_string(), window.end_date()),
            ],
            Endpoint::Browse { page, size } => vec![
                ("page".to_string(), page.to_string()),
                ("size".to_string(), size.to_string()),
            ],
            Endpoint::Lookup { .. } => Vec::new(),
            Endpoint::Sentry { designation } => vec![("des".to_string(), designation.clone())],
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            Endpoint::Feed { window } => {
                format!("feed {}..{}", window.start_date(), window.end_date())
            }
            Endpoint::Browse { page, .. } => format!("browse page {page}"),
            Endpoint::Lookup { id } => format!("lookup {id}"),
            Endpoint::Sentry { designation } => format!("sentry {designation}"),
        }
    }
}

/// Sentry designation, e.g. `29075` or `2000 SG344`, with runs of
/// whitespace collapsed. Letters, digits, spaces and hyphens only.
pub fn normalize_designation(raw: &str) -> Result<String, Error> {
    let des = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let valid = !des.is_empty()
        && des.len() <= MAX_DESIGNATION_LEN
        && des
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-');
    if !valid {
        return Err(Error::InvalidParameter(format!(
            "sentry designation must be 1-{MAX_DESIGNATION_LEN} letters, digits, spaces or hyphens, got '{}'",
            raw.trim()
        )));
    }
    Ok(des)
}
