//! qstring policy resolution

use parentcfg_common::{DeliveryService, ParentSelectionParams, QStringIgnore};

/// Literal written for delivery services that strip query strings
pub const QSTRING_DROP: &str = "drop";

/// `qstring=` value for one delivery service.
///
/// Drop mode wins, then the delivery service's own handling string, then
/// the server profile. The other ignore modes never fix a literal.
pub fn resolve_qstring(ds: &DeliveryService, params: &ParentSelectionParams) -> String {
    if ds.qstring_ignore == QStringIgnore::Drop {
        return QSTRING_DROP.to_string();
    }

    ds.qstring_handling()
        .unwrap_or_else(|| params.server_qstring())
        .to_string()
}
