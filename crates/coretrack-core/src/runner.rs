//! Orchestration of one daily indicator run.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::registry::{Dispatcher, IndicatorResult};
use crate::{HoldingConfig, StockCode};

const DEFAULT_CONCURRENCY: usize = 4;

/// One holding's assembled outcome, handed to the external report formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingIndicator {
    pub code: StockCode,
    pub name: String,
    pub note: String,
    pub result: IndicatorResult,
}

impl HoldingIndicator {
    /// The text the report places after the holding's indicator marker:
    /// either the rendered line or the static description.
    pub fn display_line(&self) -> &str {
        self.result.rendered_text().unwrap_or(&self.note)
    }
}

/// Drives dispatch across all configured holdings.
///
/// Holdings fetch concurrently under a bounded pool, but the assembled
/// output always preserves configured order, and one holding's failure never
/// touches another's slot.
pub struct Orchestrator {
    dispatcher: Arc<Dispatcher>,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self, holdings: &[HoldingConfig]) -> Vec<HoldingIndicator> {
        let run_id = Uuid::new_v4();
        info!(%run_id, holdings = holdings.len(), "core indicator run started");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        // Spawn in configured order, join in configured order. Completion
        // order is irrelevant to the output.
        let handles: Vec<_> = holdings
            .iter()
            .cloned()
            .map(|holding| {
                let dispatcher = Arc::clone(&self.dispatcher);
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .expect("run semaphore is never closed");
                    dispatcher.dispatch(&holding).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(holdings.len());
        for (holding, handle) in holdings.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(error) => {
                    // A defective fetcher may panic its task; that holding
                    // degrades alone.
                    warn!(code = %holding.code, %error, "dispatch task failed; using fallback");
                    IndicatorResult::Fallback
                }
            };

            results.push(HoldingIndicator {
                code: holding.code.clone(),
                name: holding.name.clone(),
                note: holding.note.clone(),
                result,
            });
        }

        let fallbacks = results.iter().filter(|r| r.result.is_fallback()).count();
        info!(
            %run_id,
            rendered = results.len() - fallbacks,
            fallbacks,
            "core indicator run finished"
        );

        results
    }
}
