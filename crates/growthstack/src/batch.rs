//! Batch runner: one analysis per pillar, in catalog order.
//!
//! Strictly sequential: each call may consume rate-limited quota and the
//! progress contract assumes ordering. The batch aborts on the first failure
//! and propagates it; a partial report with silently missing pillars would
//! misrepresent the audit, and completed pillars are cache hits on a rerun.

use crate::analysis::{Analyzer, Coordinates};
use crate::error::AppError;
use crate::model::AuditResult;
use crate::pillar::Pillar;
use growthstack_common::gemini::ContentModel;
use growthstack_common::store::KeyValueStore;

/// Run the full six-pillar audit. The progress callback is invoked
/// synchronously with a rounded percentage before each pillar and with 100
/// after the last; a successful return always contains all six pillars in
/// catalog order.
pub async fn run_full_audit<M, S, F>(
    analyzer: &Analyzer<M, S>,
    domain: &str,
    coordinates: Option<Coordinates>,
    mut on_progress: F,
) -> Result<Vec<(Pillar, AuditResult)>, AppError>
where
    M: ContentModel,
    S: KeyValueStore,
    F: FnMut(u8),
{
    let total = Pillar::ALL.len();
    let mut results = Vec::with_capacity(total);
    for (completed, pillar) in Pillar::ALL.into_iter().enumerate() {
        on_progress(progress_percent(completed, total));
        let result = analyzer.analyze(pillar, domain, coordinates).await?;
        results.push((pillar, result));
    }
    on_progress(100);
    Ok(results)
}

fn progress_percent(completed: usize, total: usize) -> u8 {
    ((completed * 100 + total / 2) / total) as u8
}
