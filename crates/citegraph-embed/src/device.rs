use candle_core::Device;

/// Best available compute device: CUDA > Metal > CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(dev) = Device::new_cuda(0) {
            tracing::info!("device: CUDA");
            return dev;
        }
    }
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            tracing::info!("device: Metal (MPS)");
            return dev;
        }
    }
    tracing::info!("device: CPU");
    Device::Cpu
}

/// Human-readable description of the active hardware backend.
pub fn device_info() -> String {
    if candle_core::utils::cuda_is_available() {
        return "Running on Nvidia GPU via CUDA".to_string();
    }
    if candle_core::utils::metal_is_available() {
        return "Running on Apple Silicon via Metal".to_string();
    }
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    format!("Running on CPU ({} cores)", cores)
}
