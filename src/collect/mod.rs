//! Response collection strategies.
//!
//! Both strategies share one capability: produce one binary outcome per
//! prompt, aligned with input order. A run uses exactly one of them.

mod binarize;
mod live;
mod simulated;

pub use binarize::*;
pub use live::*;
pub use simulated::*;

use crate::models::{Catalog, PromptRecord, Result};

/// Produces one binary outcome (0 = unfavorable, 1 = favorable) per
/// prompt, index-aligned with the input.
///
/// Implementations must either return an outcome for every prompt or fail
/// the whole batch; substituting a default label for a single failed call
/// would bias the fitted model without detection.
#[allow(async_fn_in_trait)]
pub trait ResponseCollector {
    async fn collect(
        &self,
        prompts: &[String],
        records: &[PromptRecord],
        catalog: &Catalog,
    ) -> Result<Vec<u8>>;
}
