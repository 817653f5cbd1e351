use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::llm::client::LlmClient;
use crate::llm::prompts;
use crate::reference::ReferenceExample;

/// Picks the references most similar to the target figure by asking the
/// model to rank IDs from the reference set.
pub struct RetrieverAgent<'a> {
    client: &'a dyn LlmClient,
    reference_set: &'a [ReferenceExample],
    custom_prompt: Option<String>,
}

impl<'a> RetrieverAgent<'a> {
    pub fn new(client: &'a dyn LlmClient, reference_set: &'a [ReferenceExample]) -> Self {
        Self {
            client,
            reference_set,
            custom_prompt: None,
        }
    }

    pub fn with_custom_prompt(mut self, custom: Option<String>) -> Self {
        self.custom_prompt = custom;
        self
    }

    pub async fn retrieve(
        &self,
        methodology: &str,
        caption: &str,
        n: usize,
    ) -> Result<Vec<ReferenceExample>> {
        if self.reference_set.is_empty() {
            warn!("No reference set provided. Skipping retrieval.");
            return Ok(Vec::new());
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let prompt = prompts::retrieval_prompt(
            methodology,
            caption,
            self.reference_set,
            n,
            self.custom_prompt.as_deref(),
        );
        let response = self
            .client
            .complete(&prompt)
            .await
            .context("retrieval LLM call failed")?;

        Ok(parse_retrieval_response(&response, self.reference_set, n))
    }
}

/// Map the model's ranked ID list back onto the reference set.
///
/// Each line selects at most one reference: the one with the longest ID
/// contained in the line. Selection stops at `n`; duplicates are ignored. If
/// the model named fewer than `min(n, set.len())` references, the rest are
/// filled from the set in order.
pub fn parse_retrieval_response(
    response: &str,
    reference_set: &[ReferenceExample],
    n: usize,
) -> Vec<ReferenceExample> {
    let target = n.min(reference_set.len());
    let mut selected: Vec<usize> = Vec::with_capacity(target);

    for line in response.lines() {
        if selected.len() >= target {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let best = reference_set
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.id.is_empty() && line.contains(r.id.as_str()))
            .max_by_key(|(_, r)| r.id.len())
            .map(|(idx, _)| idx);
        if let Some(idx) = best {
            if !selected.contains(&idx) {
                selected.push(idx);
            }
        }
    }

    if selected.len() < target {
        debug!(
            "Model ranked {} of {} references, filling the rest in set order",
            selected.len(),
            target
        );
        for idx in 0..reference_set.len() {
            if selected.len() >= target {
                break;
            }
            if !selected.contains(&idx) {
                selected.push(idx);
            }
        }
    }

    selected
        .into_iter()
        .map(|idx| reference_set[idx].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn set(ids: &[&str]) -> Vec<ReferenceExample> {
        ids.iter()
            .map(|id| ReferenceExample {
                id: id.to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn ids(refs: &[ReferenceExample]) -> Vec<&str> {
        refs.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_parse_keeps_model_ranking() {
        let refs = set(&["ref_001", "ref_002", "ref_003", "ref_004"]);
        let picked = parse_retrieval_response("ref_003\nref_001\n", &refs, 2);
        assert_eq!(ids(&picked), vec!["ref_003", "ref_001"]);
    }

    #[test]
    fn test_parse_tolerates_decoration() {
        let refs = set(&["ref_001", "ref_002", "ref_003"]);
        let response = "Here are my picks:\n1. **ref_002** (same domain)\n- ref_003: pipeline\n";
        let picked = parse_retrieval_response(response, &refs, 2);
        assert_eq!(ids(&picked), vec!["ref_002", "ref_003"]);
    }

    #[test]
    fn test_parse_prefers_longest_id() {
        let refs = set(&["ref_001", "ref_0010"]);
        let picked = parse_retrieval_response("ref_0010\nref_001", &refs, 2);
        assert_eq!(ids(&picked), vec!["ref_0010", "ref_001"]);
    }

    #[test]
    fn test_parse_ignores_duplicates_and_unknown_ids() {
        let refs = set(&["a1", "b2", "c3"]);
        let picked = parse_retrieval_response("b2\nb2\nzz9\nc3", &refs, 2);
        assert_eq!(ids(&picked), vec!["b2", "c3"]);
    }

    #[test]
    fn test_parse_tops_up_in_set_order() {
        let refs = set(&["a1", "b2", "c3", "d4"]);
        let picked = parse_retrieval_response("c3", &refs, 3);
        assert_eq!(ids(&picked), vec!["c3", "a1", "b2"]);
    }

    #[test]
    fn test_parse_garbage_falls_back_to_first_n() {
        let refs = set(&["a1", "b2", "c3"]);
        let picked = parse_retrieval_response("I cannot help with that.", &refs, 2);
        assert_eq!(ids(&picked), vec!["a1", "b2"]);
    }

    #[test]
    fn test_parse_n_larger_than_set() {
        let refs = set(&["a1", "b2"]);
        let picked = parse_retrieval_response("b2", &refs, 10);
        assert_eq!(ids(&picked), vec!["b2", "a1"]);
    }

    struct CountingClient {
        calls: AtomicUsize,
        reply: String,
    }

    #[async_trait]
    impl LlmClient for CountingClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_retrieve_empty_set_makes_no_call() {
        let client = CountingClient {
            calls: AtomicUsize::new(0),
            reply: String::new(),
        };
        let agent = RetrieverAgent::new(&client, &[]);
        let picked = agent.retrieve("m", "c", 10).await.unwrap();
        assert!(picked.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retrieve_calls_model_once() {
        let client = CountingClient {
            calls: AtomicUsize::new(0),
            reply: "ref_002".to_string(),
        };
        let refs = set(&["ref_001", "ref_002"]);
        let agent = RetrieverAgent::new(&client, &refs);
        let picked = agent.retrieve("m", "c", 1).await.unwrap();
        assert_eq!(ids(&picked), vec!["ref_002"]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        let none = agent.retrieve("m", "c", 0).await.unwrap();
        assert!(none.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
