use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::engine::EngineError;

// ── Request metrics ─────────────────────────────────────────────

/// Counter: reserve attempts. Labels: outcome.
pub const RESERVATIONS_TOTAL: &str = "parkbay_reservations_total";

/// Counter: opt-out attempts. Labels: outcome.
pub const OPT_OUTS_TOTAL: &str = "parkbay_opt_outs_total";

/// Counter: gate lookups. Labels: verdict (reserved, not_reserved, unknown).
pub const GATE_CHECKS_TOTAL: &str = "parkbay_gate_checks_total";

// ── Resource metrics ────────────────────────────────────────────

/// Gauge: free spaces summed over all quotas.
pub const FREE_SPACES: &str = "parkbay_free_spaces";

/// Counter: journal entries appended.
pub const JOURNAL_APPENDS_TOTAL: &str = "parkbay_journal_appends_total";

/// Counter: journal compactions completed.
pub const JOURNAL_COMPACTIONS_TOTAL: &str = "parkbay_journal_compactions_total";

/// Install an in-process Prometheus recorder. The returned handle renders the
/// text exposition on demand; there is no listener. `None` if disabled or if
/// another recorder is already installed.
pub fn init(enabled: bool) -> Option<PrometheusHandle> {
    if !enabled {
        return None;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("metrics recorder not installed: {e}");
            None
        }
    }
}

/// Map an engine result to a short label for metrics.
pub fn outcome_label<T>(result: &Result<T, EngineError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(EngineError::NoCapacity) => "no_capacity",
        Err(EngineError::InvalidRequest(_)) => "invalid_request",
        Err(EngineError::NotEligible(_)) => "not_eligible",
        Err(EngineError::RecordNotFound(_)) => "not_found",
        Err(EngineError::DataCorruption { .. }) => "data_corruption",
        Err(EngineError::Store(_)) => "store_error",
        Err(EngineError::JournalError(_)) => "journal_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    #[test]
    fn outcome_labels() {
        assert_eq!(outcome_label::<()>(&Ok(())), "ok");
        assert_eq!(outcome_label::<()>(&Err(EngineError::NoCapacity)), "no_capacity");
        assert_eq!(outcome_label::<()>(&Err(EngineError::NotEligible(Status::Disabled))), "not_eligible");
    }

    #[test]
    fn disabled_metrics_install_nothing() {
        assert!(init(false).is_none());
    }
}
