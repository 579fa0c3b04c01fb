use proj_sys_transformer::ProjError;

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to build transform {source_crs} -> {target_crs}: {inner}")]
    Build {
        source_crs: String,
        target_crs: String,
        inner: ProjError,
    },
    #[error("transform failed: {0}")]
    Transform(#[from] ProjError),
}
