use crate::error::SelectionError;
use crate::types::{AssetClass, InstrumentId};

/// Rewrite `id` into the canonical identifier of its chain.
///
/// Canonical identifiers pass through unchanged; concrete ones keep their
/// market and asset class and take the "/{root}" raw value.
pub fn canonicalize(
    id: &InstrumentId,
    expected: AssetClass,
) -> Result<InstrumentId, SelectionError> {
    if id.asset_class != expected {
        return Err(SelectionError::InvalidArgument {
            expected,
            actual: id.asset_class,
            symbol: id.clone(),
        });
    }

    if id.is_canonical {
        return Ok(id.clone());
    }

    Ok(InstrumentId::canonical(id.asset_class, id.root(), id.market.clone()))
}
