use crate::domain::model::{Resource, ResourcePage};
use crate::utils::error::Result;
use crate::utils::monitor::SweepProgress;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

/// 分頁批次修正作業：每頁重新查詢，逐筆處理，錯誤只計數不中斷
#[async_trait]
pub trait SweepJob: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches one page of items still needing correction. Errors abort the sweep.
    async fn fetch_page(&self, page: u32) -> Result<ResourcePage>;

    /// Corrects one item and returns a short success message.
    async fn process(&self, item: &Resource) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepReport {
    pub job: String,
    pub total: u64,
    pub processed: u64,
    pub errors: u64,
    pub pages: u32,
    pub elapsed: Duration,
}

impl SweepReport {
    pub fn error_rate(&self) -> u32 {
        error_rate(self.errors, self.total)
    }
}

/// Percentage of failed items, rounded half away from zero. Never reports 0
/// while at least one item failed.
pub fn error_rate(errors: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let rate = (errors as f64 * 100.0 / total as f64).round() as u32;
    if rate == 0 && errors > 0 {
        1
    } else {
        rate
    }
}

/// Runs `job` until no unseen item is left in its filter.
///
/// Corrected items leave the job's filter while the sweep runs, so only failed
/// items stay ahead of the unvisited ones. The next page is `1 + errors /
/// page_len`. Items already handled in this run are skipped when they show up
/// again; the sweep stops when a page brings nothing new or has no next page.
pub async fn run_sweep<J: SweepJob + ?Sized>(job: &J) -> Result<SweepReport> {
    let mut page_number = 1u32;
    let mut page_len = 0usize;
    let mut pages_seen = 0u32;
    let mut seen: HashSet<String> = HashSet::new();
    let mut progress: Option<SweepProgress> = None;
    let mut total = 0u64;

    loop {
        let page = job.fetch_page(page_number).await?;
        pages_seen += 1;

        let progress = progress.get_or_insert_with(|| {
            total = page.total;
            SweepProgress::start(job.name(), page.total)
        });

        let mut fresh = 0usize;
        for item in &page.items {
            if !seen.insert(item_key(item)) {
                continue;
            }
            fresh += 1;

            let label = item.label();
            match job.process(item).await {
                Ok(message) => progress.success(&label, &message),
                Err(e) => progress.error(&label, &e),
            }
            progress.advance();
        }

        if page.has_next {
            page_len = page_len.max(page.items.len());
        }

        if fresh > 0 && page.has_next && page_len > 0 {
            page_number = next_page(progress.failed(), page_len);
            tracing::debug!(
                "{}: {} failed so far, continuing at page {}",
                job.name(),
                progress.failed(),
                page_number
            );
        } else {
            let elapsed = progress.finish();
            return Ok(SweepReport {
                job: job.name().to_string(),
                total,
                processed: progress.advanced(),
                errors: progress.failed(),
                pages: pages_seen,
                elapsed,
            });
        }
    }
}

/// First page that can still hold unvisited items: failed items keep their
/// place at the front of the filter, everything corrected is gone.
fn next_page(errors: u64, page_len: usize) -> u32 {
    let skipped = errors / page_len as u64;
    u32::try_from(skipped).map_or(u32::MAX, |pages| pages.saturating_add(1))
}

fn item_key(item: &Resource) -> String {
    item.id()
        .unwrap_or_else(|| Value::Object(item.data.clone()).to_string())
}
