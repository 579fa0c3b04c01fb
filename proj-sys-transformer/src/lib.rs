use std::{
    ffi::{CStr, CString},
    os::raw::c_char,
    path::Path,
    ptr,
};

use proj_sys as proj;

#[derive(Debug)]
pub struct ProjError {
    pub code: i32,
    pub message: String,
    pub context: &'static str,
}

impl std::fmt::Display for ProjError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PROJ error ({}): {} {}",
            self.context, self.code, self.message
        )
    }
}

impl std::error::Error for ProjError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

impl Direction {
    fn as_proj(self) -> proj::PJ_DIRECTION {
        match self {
            Direction::Forward => proj::PJ_DIRECTION_PJ_FWD,
            Direction::Inverse => proj::PJ_DIRECTION_PJ_INV,
        }
    }
}

/// Owns a PROJ context and a normalized CRS-to-CRS operation.
///
/// A context must be used by only one thread at a time; the raw pointers keep
/// this type `!Send`, so create one per worker.
#[derive(Debug)]
pub struct ProjTransformer {
    ctx: *mut proj::PJ_CONTEXT,
    pj: *mut proj::PJ,
}

impl ProjTransformer {
    /// `source` and `target` accept anything `proj_create_crs_to_crs` does:
    /// `EPSG:4326`, a PROJ string, or WKT.
    pub fn new(
        source: &str,
        target: &str,
        proj_data_dir: Option<&Path>,
    ) -> Result<Self, ProjError> {
        let ctx = unsafe { proj::proj_context_create() };
        if ctx.is_null() {
            return Err(ProjError {
                code: 0,
                message: "proj_context_create() returned NULL".to_string(),
                context: "proj_context_create",
            });
        }

        if let Some(dir) = proj_data_dir {
            let c_path = CString::new(dir.to_string_lossy().as_bytes()).map_err(|_| {
                unsafe {
                    proj::proj_context_destroy(ctx);
                }
                ProjError {
                    code: 0,
                    message: "proj_data_dir contains NUL byte".to_string(),
                    context: "proj_context_set_search_paths",
                }
            })?;
            let paths = [c_path.as_ptr()];
            unsafe {
                proj::proj_context_set_search_paths(ctx, paths.len() as i32, paths.as_ptr());
            }
        }

        let (source, target) = match (CString::new(source), CString::new(target)) {
            (Ok(s), Ok(t)) => (s, t),
            _ => {
                unsafe {
                    proj::proj_context_destroy(ctx);
                }
                return Err(ProjError {
                    code: 0,
                    message: "CRS definition contains NUL byte".to_string(),
                    context: "proj_create_crs_to_crs",
                });
            }
        };

        let pj = unsafe {
            proj::proj_create_crs_to_crs(ctx, source.as_ptr(), target.as_ptr(), ptr::null_mut())
        };
        if pj.is_null() {
            let err = proj_error_from_ctx(ctx, "proj_create_crs_to_crs");
            unsafe {
                proj::proj_context_destroy(ctx);
            }
            return Err(err);
        }

        // Normalize axis order (e.g. EPSG:4326 is lat,lon by definition).
        let normalized = unsafe { proj::proj_normalize_for_visualization(ctx, pj) };
        unsafe {
            proj::proj_destroy(pj);
        }
        if normalized.is_null() {
            let err = proj_error_from_ctx(ctx, "proj_normalize_for_visualization");
            unsafe {
                proj::proj_context_destroy(ctx);
            }
            return Err(err);
        }

        Ok(Self {
            ctx,
            pj: normalized,
        })
    }

    /// Transforms parallel x/y buffers in place.
    ///
    /// Fails when PROJ reports an error or leaves a non-finite value behind,
    /// which is how out-of-domain coordinates surface.
    pub fn transform_xy_in_place(
        &mut self,
        direction: Direction,
        xs: &mut [f64],
        ys: &mut [f64],
    ) -> Result<(), ProjError> {
        if xs.len() != ys.len() {
            return Err(ProjError {
                code: 0,
                message: format!("x/y length mismatch: {} vs {}", xs.len(), ys.len()),
                context: "proj_trans_generic",
            });
        }
        if xs.is_empty() {
            return Ok(());
        }

        let stride = std::mem::size_of::<f64>();
        let n = xs.len();

        unsafe {
            proj::proj_errno_reset(self.pj);

            proj::proj_trans_generic(
                self.pj,
                direction.as_proj(),
                xs.as_mut_ptr(),
                stride,
                n,
                ys.as_mut_ptr(),
                stride,
                n,
                ptr::null_mut(),
                0,
                0,
                ptr::null_mut(),
                0,
                0,
            );

            let err = proj::proj_errno(self.pj);
            if err != 0 {
                return Err(proj_error_from_pj(self.ctx, self.pj, "proj_trans_generic"));
            }
        }

        if let Some(i) = xs
            .iter()
            .zip(ys.iter())
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(ProjError {
                code: 0,
                message: format!("coordinate #{i} is outside the transform domain"),
                context: "proj_trans_generic",
            });
        }

        Ok(())
    }
}

impl Drop for ProjTransformer {
    fn drop(&mut self) {
        unsafe {
            if !self.pj.is_null() {
                proj::proj_destroy(self.pj);
                self.pj = ptr::null_mut();
            }
            if !self.ctx.is_null() {
                proj::proj_context_destroy(self.ctx);
                self.ctx = ptr::null_mut();
            }
        }
    }
}

fn proj_error_from_ctx(ctx: *mut proj::PJ_CONTEXT, context: &'static str) -> ProjError {
    let code = unsafe { proj::proj_context_errno(ctx) };
    let message = proj_error_message(ctx, code);
    ProjError {
        code,
        message,
        context,
    }
}

fn proj_error_from_pj(
    ctx: *mut proj::PJ_CONTEXT,
    pj: *mut proj::PJ,
    context: &'static str,
) -> ProjError {
    let code = unsafe { proj::proj_errno(pj) };
    let message = proj_error_message(ctx, code);
    ProjError {
        code,
        message,
        context,
    }
}

fn proj_error_message(ctx: *mut proj::PJ_CONTEXT, code: i32) -> String {
    let c_msg = unsafe { proj::proj_context_errno_string(ctx, code) };
    if c_msg.is_null() {
        return "unknown error".to_string();
    }
    unsafe { CStr::from_ptr(c_msg as *const c_char) }
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_is_rejected() {
        let mut t = ProjTransformer::new("EPSG:4326", "EPSG:32614", None).unwrap();
        let mut xs = vec![-99.0, -98.0];
        let mut ys = vec![30.0];
        let err = t
            .transform_xy_in_place(Direction::Forward, &mut xs, &mut ys)
            .unwrap_err();
        assert!(err.message.contains("length mismatch"));
    }

    #[test]
    fn forward_then_inverse_restores_input() {
        let mut t = ProjTransformer::new("EPSG:4326", "EPSG:32614", None).unwrap();
        let mut xs = vec![-99.0, -98.5];
        let mut ys = vec![30.0, 30.25];
        t.transform_xy_in_place(Direction::Forward, &mut xs, &mut ys)
            .unwrap();
        // UTM zone 14N eastings are around 500 km near the central meridian
        assert!(xs[0] > 100_000.0 && xs[0] < 900_000.0);
        t.transform_xy_in_place(Direction::Inverse, &mut xs, &mut ys)
            .unwrap();
        assert!((xs[0] + 99.0).abs() < 1e-7);
        assert!((ys[1] - 30.25).abs() < 1e-7);
    }
}
