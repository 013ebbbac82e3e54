use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Tokenize a batch onto `device`, padding every row to the longest sequence
/// in the batch (capped at `max_len`, pad id 0). Returns `(input_ids,
/// attention_mask)` of shape `[B, T]`.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut encodings = Vec::with_capacity(texts.len());
    let mut batch_max = 1usize;
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        batch_max = batch_max.max(enc.get_ids().len().min(max_len));
        encodings.push(enc);
    }

    let batch = texts.len();
    let mut ids = Vec::with_capacity(batch * batch_max);
    let mut mask = Vec::with_capacity(batch * batch_max);
    for enc in &encodings {
        let mut row_ids = enc.get_ids().to_vec();
        let mut row_mask = enc.get_attention_mask().to_vec();
        if row_ids.len() > batch_max {
            row_ids.truncate(batch_max);
            row_mask.truncate(batch_max);
        }
        if row_ids.len() < batch_max {
            let pad = batch_max - row_ids.len();
            row_ids.extend(std::iter::repeat(0u32).take(pad));
            row_mask.extend(std::iter::repeat(0u32).take(pad));
        }
        ids.extend(row_ids);
        mask.extend(row_mask);
    }

    let input_ids = Tensor::from_iter(ids, device)?.reshape((batch, batch_max))?;
    let attention_mask = Tensor::from_iter(mask, device)?.reshape((batch, batch_max))?;
    Ok((input_ids, attention_mask))
}
