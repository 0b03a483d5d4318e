//! Dictionary and tensor-list handle operations.

use crate::error::{cstr, guard};
use crate::handles::{borrow, borrow_mut, drop_handle, into_handle};
use libc::c_char;
use nexc::functional::features::{FeatureDict, list_item};
use std::ffi::c_void;
use tch::Tensor;

/// A detached snapshot of one dictionary entry's tensor list.
pub(crate) struct TensorList(pub(crate) Vec<Tensor>);

/// Allocate an empty feature dictionary. The caller owns the handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_dict_new() -> *mut c_void {
    into_handle(FeatureDict::new())
}

/// Insert (or replace) the tensor list stored under `key`. The `values`
/// array holds `size` tensor handles; the dictionary keeps shared
/// references, so the caller's handles stay valid and stay owned by the
/// caller.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_dict_insert(
    dict: *mut c_void,
    key: *const c_char,
    values: *const *mut c_void,
    size: usize,
) {
    guard(|| {
        let dict: &mut FeatureDict = unsafe { borrow_mut(dict, "dictionary") };
        let key = unsafe { cstr(key) }?;
        if values.is_null() && size > 0 {
            return Err("null values pointer".to_string());
        }
        let mut tensors = Vec::with_capacity(size);
        for i in 0..size {
            let handle = unsafe { *values.add(i) };
            let tensor: &Tensor = unsafe { borrow(handle, "tensor") };
            tensors.push(tensor.shallow_clone());
        }
        dict.insert(key, tensors);
        Ok::<_, String>(())
    })
}

/// Look up the tensor list stored under `key`. Faults on an absent key or
/// an empty list. The caller owns the returned list handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_dict_at(dict: *const c_void, key: *const c_char) -> *mut c_void {
    guard(|| {
        let dict: &FeatureDict = unsafe { borrow(dict, "dictionary") };
        let key = unsafe { cstr(key) }.map_err(|e| e.to_string())?;
        let values = dict.values(key).map_err(|e| e.to_string())?;
        let list = TensorList(values.iter().map(Tensor::shallow_clone).collect());
        Ok::<_, String>(into_handle(list))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_dict_size(dict: *const c_void) -> usize {
    guard(|| {
        let dict: &FeatureDict = unsafe { borrow(dict, "dictionary") };
        Ok::<_, String>(dict.len())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_dict_delete(dict: *mut c_void) {
    unsafe { drop_handle::<FeatureDict>(dict) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_list_size(list: *const c_void) -> usize {
    guard(|| {
        let list: &TensorList = unsafe { borrow(list, "tensor list") };
        Ok::<_, String>(list.0.len())
    })
}

/// Index into a tensor list. Faults when `index` is out of bounds. The
/// caller owns the returned tensor handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_list_at(list: *const c_void, index: usize) -> *mut c_void {
    guard(|| {
        let list: &TensorList = unsafe { borrow(list, "tensor list") };
        let tensor = list_item(&list.0, index).map_err(|e| e.to_string())?;
        Ok::<_, String>(into_handle(tensor.shallow_clone()))
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn nexc_list_delete(list: *mut c_void) {
    unsafe { drop_handle::<TensorList>(list) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::{nexc_tensor_delete, nexc_tensor_item_double};
    use std::ffi::CString;

    #[test]
    fn insert_then_lookup_preserves_list_length_and_contents() {
        let key = CString::new("density").unwrap();
        unsafe {
            let dict = nexc_dict_new();
            let t0 = into_handle(Tensor::from_slice(&[1.5_f64]));
            let t1 = into_handle(Tensor::from_slice(&[2.5_f64]));
            let values = [t0, t1];
            nexc_dict_insert(dict, key.as_ptr(), values.as_ptr(), values.len());
            assert_eq!(nexc_dict_size(dict), 1);

            let list = nexc_dict_at(dict, key.as_ptr());
            assert_eq!(nexc_list_size(list), 2);

            let first = nexc_list_at(list, 0);
            let second = nexc_list_at(list, 1);
            assert!((nexc_tensor_item_double(first) - 1.5).abs() < 1e-12);
            assert!((nexc_tensor_item_double(second) - 2.5).abs() < 1e-12);

            nexc_tensor_delete(first);
            nexc_tensor_delete(second);
            nexc_list_delete(list);
            nexc_tensor_delete(t0);
            nexc_tensor_delete(t1);
            nexc_dict_delete(dict);
        }
    }

    #[test]
    fn lists_stay_valid_after_source_handles_are_deleted() {
        let key = CString::new("grid_weights").unwrap();
        unsafe {
            let dict = nexc_dict_new();
            let t = into_handle(Tensor::from_slice(&[7.0_f64]));
            let values = [t];
            nexc_dict_insert(dict, key.as_ptr(), values.as_ptr(), 1);
            nexc_tensor_delete(t);

            let list = nexc_dict_at(dict, key.as_ptr());
            let item = nexc_list_at(list, 0);
            assert!((nexc_tensor_item_double(item) - 7.0).abs() < 1e-12);

            nexc_tensor_delete(item);
            nexc_list_delete(list);
            nexc_dict_delete(dict);
        }
    }

    #[test]
    fn delete_functions_accept_null() {
        unsafe {
            nexc_dict_delete(std::ptr::null_mut());
            nexc_list_delete(std::ptr::null_mut());
        }
    }
}
