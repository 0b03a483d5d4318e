//! Tensor handle operations.

use crate::error::{cstr, guard};
use crate::handles::{borrow, borrow_mut, drop_handle, into_handle};
use libc::c_char;
use std::ffi::c_void;
use std::path::Path;
use tch::{Device, Kind, Tensor};

/// Load a tensor serialized with the tensor library's native format and
/// place it on the host. The caller owns the returned handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_load(filename: *const c_char) -> *mut c_void {
    guard(|| {
        let path = unsafe { cstr(filename) }?;
        let tensor = Tensor::load(Path::new(path))
            .map_err(|e| format!("failed to load tensor from '{path}': {e}"))?
            .to_device(Device::Cpu);
        Ok::<_, String>(into_handle(tensor))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_sum(tensor: *const c_void) -> *mut c_void {
    guard(|| {
        let t: &Tensor = unsafe { borrow(tensor, "tensor") };
        Ok::<_, String>(into_handle(t.sum(None::<Kind>)))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_mean(tensor: *const c_void) -> *mut c_void {
    guard(|| {
        let t: &Tensor = unsafe { borrow(tensor, "tensor") };
        Ok::<_, String>(into_handle(t.mean(None::<Kind>)))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_mul(a: *const c_void, b: *const c_void) -> *mut c_void {
    guard(|| {
        let ta: &Tensor = unsafe { borrow(a, "tensor") };
        let tb: &Tensor = unsafe { borrow(b, "tensor") };
        let product = ta
            .f_mul(tb)
            .map_err(|e| format!("tensor multiplication failed: {e}"))?;
        Ok::<_, String>(into_handle(product))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_item_double(tensor: *const c_void) -> f64 {
    guard(|| {
        let t: &Tensor = unsafe { borrow(tensor, "tensor") };
        if t.numel() != 1 {
            return Err(format!(
                "item() requires a single-element tensor, got {} elements",
                t.numel()
            ));
        }
        Ok::<_, String>(t.double_value(&[]))
    })
}

/// Expose the raw storage of a tensor as contiguous float64 data.
///
/// The tensor behind the handle is replaced in place by its contiguous
/// float64 materialization so the pointer stays valid until the handle is
/// deleted.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_data_ptr(tensor: *mut c_void) -> *mut c_void {
    guard(|| {
        let t: &mut Tensor = unsafe { borrow_mut(tensor, "tensor") };
        *t = t.to_kind(Kind::Double).contiguous();
        Ok::<_, String>(t.data_ptr())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_ndim(tensor: *const c_void) -> i64 {
    guard(|| {
        let t: &Tensor = unsafe { borrow(tensor, "tensor") };
        Ok::<_, String>(t.dim() as i64)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_size(tensor: *const c_void, dim: i64) -> i64 {
    guard(|| {
        let t: &Tensor = unsafe { borrow(tensor, "tensor") };
        let sizes = t.size();
        let index = if dim < 0 { dim + sizes.len() as i64 } else { dim };
        sizes
            .get(index as usize)
            .copied()
            .ok_or_else(|| format!("dimension {dim} out of range for {}-d tensor", sizes.len()))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_numel(tensor: *const c_void) -> i64 {
    guard(|| {
        let t: &Tensor = unsafe { borrow(tensor, "tensor") };
        Ok::<_, String>(t.numel() as i64)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_tensor_delete(tensor: *mut c_void) {
    unsafe { drop_handle::<Tensor>(tensor) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_of(tensor: Tensor) -> *mut c_void {
        into_handle(tensor)
    }

    #[test]
    fn sum_and_item_round_trip() {
        let t = handle_of(Tensor::from_slice(&[1.0_f64, 2.0, 3.5]));
        unsafe {
            let sum = nexc_tensor_sum(t);
            assert!((nexc_tensor_item_double(sum) - 6.5).abs() < 1e-12);
            nexc_tensor_delete(sum);
            nexc_tensor_delete(t);
        }
    }

    #[test]
    fn mean_of_constant_tensor_is_the_constant() {
        let t = handle_of(Tensor::from_slice(&[4.0_f64, 4.0, 4.0, 4.0]));
        unsafe {
            let mean = nexc_tensor_mean(t);
            assert!((nexc_tensor_item_double(mean) - 4.0).abs() < 1e-12);
            nexc_tensor_delete(mean);
            nexc_tensor_delete(t);
        }
    }

    #[test]
    fn elementwise_product_broadcasts() {
        let a = handle_of(Tensor::from_slice(&[1.0_f64, 2.0, 3.0]));
        let b = handle_of(Tensor::from_slice(&[2.0_f64]));
        unsafe {
            let product = nexc_tensor_mul(a, b);
            let total = nexc_tensor_sum(product);
            assert!((nexc_tensor_item_double(total) - 12.0).abs() < 1e-12);
            nexc_tensor_delete(total);
            nexc_tensor_delete(product);
            nexc_tensor_delete(b);
            nexc_tensor_delete(a);
        }
    }

    #[test]
    fn shape_queries_report_the_logical_layout() {
        let t = handle_of(Tensor::from_slice(&[0.0_f64; 12]).reshape([3, 4]));
        unsafe {
            assert_eq!(nexc_tensor_ndim(t), 2);
            assert_eq!(nexc_tensor_size(t, 0), 3);
            assert_eq!(nexc_tensor_size(t, 1), 4);
            assert_eq!(nexc_tensor_size(t, -1), 4);
            assert_eq!(nexc_tensor_numel(t), 12);
            nexc_tensor_delete(t);
        }
    }

    #[test]
    fn data_ptr_yields_contiguous_float64_storage() {
        // Start from float32 in transposed (non-contiguous) layout.
        let t = Tensor::from_slice(&[1.0_f32, 2.0, 3.0, 4.0, 5.0, 6.0])
            .reshape([2, 3])
            .transpose(0, 1);
        assert!(!t.is_contiguous());
        let handle = handle_of(t);
        unsafe {
            let ptr = nexc_tensor_data_ptr(handle) as *const f64;
            assert!(!ptr.is_null());
            // Row-contiguous (3, 2) layout of the transpose.
            let values: Vec<f64> = (0..6).map(|i| *ptr.add(i)).collect();
            assert_eq!(values, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
            nexc_tensor_delete(handle);
        }
    }

    #[test]
    fn delete_accepts_null() {
        unsafe { nexc_tensor_delete(std::ptr::null_mut()) };
    }
}
