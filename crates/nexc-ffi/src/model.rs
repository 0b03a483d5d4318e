//! Model handle operations.

use crate::error::{cstr, guard};
use crate::handles::{borrow, drop_handle, into_handle};
use libc::c_char;
use nexc::functional::features::FeatureDict;
use nexc::functional::model::Functional;
use nexc::functional::{get_exc, get_exc_and_vxc};
use std::ffi::c_void;
use std::path::Path;
use tch::Device;

/// Load and validate a functional archive.
///
/// Validation (protocol version, feature vocabulary) happens before any
/// model code is deserialized; a mismatch is fatal. When `features` is
/// non-null it must point to an array large enough for the model's feature
/// list, which is filled with the stable feature enumeration values in
/// archive order. The caller owns the returned handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_model_load(
    filename: *const c_char,
    requires_grad: bool,
    features: *mut i32,
) -> *mut c_void {
    guard(|| {
        let path = unsafe { cstr(filename) }?;
        let _grad_mode = (!requires_grad).then(tch::no_grad_guard);
        let functional = Functional::load(Path::new(path), Device::Cpu, None)
            .map_err(|e| e.to_string())?;
        if !features.is_null() {
            for (i, feature) in functional.metadata().features.iter().enumerate() {
                unsafe { *features.add(i) = *feature as i32 };
            }
        }
        Ok::<_, String>(into_handle(functional))
    })
}

/// Forward evaluation: stack each key's tensor list, run the model, and
/// hand back the per-point energy-density tensor through `output`. The
/// caller owns the new tensor handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_model_get_exc(
    model: *const c_void,
    input: *const c_void,
    output: *mut *mut c_void,
) {
    guard(|| {
        let functional: &Functional = unsafe { borrow(model, "model") };
        let dict: &FeatureDict = unsafe { borrow(input, "dictionary") };
        if output.is_null() {
            return Err("null output pointer".to_string());
        }
        let exc = get_exc(functional, dict).map_err(|e| e.to_string())?;
        unsafe { *output = into_handle(exc) };
        Ok::<_, String>(())
    })
}

/// Forward plus gradient evaluation.
///
/// Every input tensor is treated as differentiable; the model output is
/// weighted by the `grid_weights` entry, summed, and backpropagated. The
/// energy-density tensor leaves through `exc_output` and the per-input
/// gradients, regrouped under their original keys, through `grad_output`.
/// The caller owns both new handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_model_get_exc_and_vxc(
    model: *const c_void,
    input: *const c_void,
    exc_output: *mut *mut c_void,
    grad_output: *mut *mut c_void,
) {
    guard(|| {
        let functional: &Functional = unsafe { borrow(model, "model") };
        let dict: &FeatureDict = unsafe { borrow(input, "dictionary") };
        if exc_output.is_null() || grad_output.is_null() {
            return Err("null output pointer".to_string());
        }
        let (exc, gradients) = get_exc_and_vxc(functional, dict).map_err(|e| e.to_string())?;
        unsafe {
            *exc_output = into_handle(exc);
            *grad_output = into_handle(gradients);
        }
        Ok::<_, String>(())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_model_delete(model: *mut c_void) {
    unsafe { drop_handle::<Functional>(model) }
}
