//! JPL Sentry risk-table responses.
//!
//! Sentry encodes numbers as strings (`"energy": "2.7e+00"`) and reports a
//! missing or removed object as HTTP 200 with an `error` field.

use common::{ProviderError, SentryObject, VirtualImpactor};
use serde_json::{Map, Value};

/// Map a Sentry `des` response to a [`SentryObject`].
///
/// An in-body `error` becomes `Rejected { status: 404 }`: the object is not
/// (or no longer) on the risk list, and asking again will not help.
pub fn parse_sentry(designation: &str, body: Value) -> Result<SentryObject, ProviderError> {
    let Value::Object(obj) = body else {
        return Err(ProviderError::MalformedResponse(
            "sentry response is not a JSON object".into(),
        ));
    };

    if let Some(err) = obj.get("error") {
        let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(ProviderError::Rejected {
            status: 404,
            message: format!("sentry {designation}: {message}"),
        });
    }

    let Some(Value::Object(summary)) = obj.get("summary") else {
        return Err(ProviderError::MalformedResponse(format!(
            "sentry {designation}: missing summary"
        )));
    };

    let virtual_impactors = match obj.get("data") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(rows)) => rows
            .iter()
            .filter_map(|row| row.as_object())
            .filter_map(|row| {
                let date = row.get("date")?.as_str()?.to_string();
                Some((date, row))
            })
            .map(|(date, row)| {
                Ok(VirtualImpactor {
                    date,
                    impact_probability: number(row, "ip")?,
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?,
        Some(_) => {
            return Err(ProviderError::MalformedResponse(format!(
                "sentry {designation}: data is not an array"
            )))
        }
    };

    let full_name = summary
        .get("fullname")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(designation)
        .to_string();

    Ok(SentryObject {
        designation: designation.to_string(),
        full_name,
        energy_mt: number(summary, "energy")?,
        diameter_km: number(summary, "diameter")?,
        v_inf_km_per_sec: number(summary, "v_inf")?,
        cumulative_impact_probability: number(summary, "ip")?,
        virtual_impactors,
    })
}

/// Numeric field that may arrive as a number or a numeric string.
/// Absent or null reads as 0.
fn number(obj: &Map<String, Value>, field: &str) -> Result<f64, ProviderError> {
    let parsed = match obj.get(field) {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    parsed.filter(|v| v.is_finite()).ok_or_else(|| {
        ProviderError::MalformedResponse(format!("sentry field '{field}' is not a number"))
    })
}
