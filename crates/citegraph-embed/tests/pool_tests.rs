use candle_core::{Device, Tensor};
use citegraph_embed::pool::cls_l2;

#[test]
fn cls_l2_takes_first_token_and_normalizes() -> anyhow::Result<()> {
    let device = Device::Cpu;
    // [B=1, T=2, H=3]: CLS token is [3, 0, 4], second token should be ignored
    let hidden = Tensor::new(&[[[3f32, 0., 4.], [100., 100., 100.]]], &device)?;
    let pooled = cls_l2(&hidden)?;
    let row = pooled.squeeze(0)?.to_vec1::<f32>()?;

    assert_eq!(row.len(), 3);
    assert!((row[0] - 0.6).abs() < 1e-5);
    assert!(row[1].abs() < 1e-5);
    assert!((row[2] - 0.8).abs() < 1e-5);
    Ok(())
}

#[test]
fn cls_l2_batch_rows_are_independent() -> anyhow::Result<()> {
    let device = Device::Cpu;
    let hidden = Tensor::new(
        &[
            [[1f32, 0., 0.], [9., 9., 9.]],
            [[0f32, 2., 0.], [9., 9., 9.]],
        ],
        &device,
    )?;
    let pooled = cls_l2(&hidden)?;
    let rows = pooled.to_vec2::<f32>()?;
    assert!((rows[0][0] - 1.0).abs() < 1e-5);
    assert!((rows[1][1] - 1.0).abs() < 1e-5);
    Ok(())
}
