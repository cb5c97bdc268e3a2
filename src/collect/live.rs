//! Live response strategy.
//!
//! Queries the text-generation backend one prompt at a time, blocking on
//! each call, and binarizes the raw text through the classifier. Any
//! backend failure aborts the whole batch: a default label substituted
//! for one failed call would skew the fitted estimates undetectably.

use crate::client::LlmClient;
use crate::collect::{Classifier, ResponseCollector};
use crate::models::{Catalog, PromptRecord, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Collector that queries a live text-generation backend per prompt.
pub struct LiveCollector {
    client: LlmClient,
    model: String,
    max_tokens: u32,
    temperature: f64,
    classifier: Box<dyn Classifier>,
}

impl LiveCollector {
    pub fn new(
        client: LlmClient,
        model: String,
        max_tokens: u32,
        temperature: f64,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        Self {
            client,
            model,
            max_tokens,
            temperature,
            classifier,
        }
    }
}

impl ResponseCollector for LiveCollector {
    async fn collect(
        &self,
        prompts: &[String],
        _records: &[PromptRecord],
        _catalog: &Catalog,
    ) -> Result<Vec<u8>> {
        let pb = ProgressBar::new(prompts.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("##-"),
        );

        let mut outcomes = Vec::with_capacity(prompts.len());

        // Sequential on purpose: outcome i must correspond to prompt i, and
        // one in-flight request keeps the ordering trivial.
        for (i, prompt) in prompts.iter().enumerate() {
            let response = self
                .client
                .complete(&self.model, prompt, self.max_tokens, self.temperature)
                .await?;

            let favorable = self.classifier.classify(&response.content);
            outcomes.push(favorable as u8);

            debug!(
                index = i,
                model = %response.model,
                output_tokens = response.output_tokens,
                favorable = favorable,
                "Collected response"
            );
            pb.set_position((i + 1) as u64);
            pb.set_message(format!(
                "favorable: {}",
                outcomes.iter().filter(|&&o| o == 1).count()
            ));
        }

        pb.finish_and_clear();
        Ok(outcomes)
    }
}
