use anyhow::Result;
use candle_core::{DType, Tensor};

/// CLS-token pooling with L2 normalization: `[B,T,H]` hidden states to
/// `[B,H]` unit vectors. The first token carries the document representation
/// for SPECTER-style encoders.
pub fn cls_l2(hidden: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    assert_eq!(dims.len(), 3, "hidden shape must be [B,T,H]");
    let batch = dims[0];
    let hidden_dim = dims[2];

    let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
    let eps_val = match hidden.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(0)?;
    let norm = cls.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norm = norm.broadcast_add(&eps)?;
    let out = cls.broadcast_div(&norm)?;
    assert_eq!(out.dims(), &[batch, hidden_dim]);
    Ok(out)
}
