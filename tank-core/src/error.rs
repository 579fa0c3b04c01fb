#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("feature #{index}: missing property '{name}'")]
    MissingProperty { index: usize, name: &'static str },
    #[error("feature #{index}: property '{name}' is not a {expected}")]
    InvalidProperty {
        index: usize,
        name: &'static str,
        expected: &'static str,
    },
    #[error("lidar dataset has no records")]
    EmptyLidar,
    #[error("raster size {width}x{height} does not match {len} samples")]
    RasterShape {
        width: usize,
        height: usize,
        len: usize,
    },
    #[error("{got} elevations for {expected} lidar records")]
    LengthMismatch { expected: usize, got: usize },
    #[error("affine transform is not invertible")]
    SingularTransform,
}
