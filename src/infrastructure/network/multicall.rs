// SPDX-License-Identifier: MIT

use crate::domain::error::GatewayError;
use crate::infrastructure::network::gateway::{ChainGateway, RawCall};
use alloy::primitives::Bytes;

/// Accumulates read calls across a set of entities and flushes them in
/// bounded multicall batches. Results come back as one flat vector in
/// push order, so callers demultiplex positionally and never observe the
/// batch boundaries.
///
/// A flush happens only after an entity has contributed all of its calls;
/// one entity's calls are never split across batches, which is why the
/// trigger is "exceeds the ceiling" rather than "reaches it".
pub struct BatchedReader {
    ceiling: usize,
}

impl BatchedReader {
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling: ceiling.max(1),
        }
    }

    pub async fn read<E, F>(
        &self,
        gateway: &dyn ChainGateway,
        entities: &[E],
        mut producer: F,
    ) -> Result<Vec<Bytes>, GatewayError>
    where
        F: FnMut(&mut Vec<RawCall>, &E),
    {
        let mut pending: Vec<RawCall> = Vec::new();
        let mut results: Vec<Bytes> = Vec::new();
        let mut pushed = 0usize;

        for entity in entities {
            producer(&mut pending, entity);
            if pending.len() > self.ceiling {
                pushed += pending.len();
                let batch = std::mem::take(&mut pending);
                results.extend(gateway.multicall(&batch).await?);
            }
        }
        if !pending.is_empty() {
            pushed += pending.len();
            results.extend(gateway.multicall(&pending).await?);
        }

        if results.len() != pushed {
            return Err(GatewayError::Rpc(format!(
                "multicall returned {} results for {} calls",
                results.len(),
                pushed
            )));
        }
        Ok(results)
    }
}
