//! C FFI bindings for keyrec-core
//!
//! Every entry point takes JSON C strings and returns a newly allocated JSON
//! C string, or null on any error. Free results with `kr_free_string`.

use keyrec_core::{
    get_upsert_diff, project_all, records_from_table, table_from_records, DefaultMap, KeyMapping,
    ProjectionMode, Record, Table, Value,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

/// Parse an optional JSON argument; null pointer gives the default
///
/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn parse_arg<T: DeserializeOwned + Default>(ptr: *const c_char) -> Option<T> {
    if ptr.is_null() {
        return Some(T::default());
    }
    let text = CStr::from_ptr(ptr).to_str().ok()?;
    serde_json::from_str(text).ok()
}

/// Parse a required JSON argument
///
/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn parse_required<T: DeserializeOwned>(ptr: *const c_char) -> Option<T> {
    if ptr.is_null() {
        return None;
    }
    let text = CStr::from_ptr(ptr).to_str().ok()?;
    serde_json::from_str(text).ok()
}

fn to_c_json<T: Serialize>(value: &T) -> *mut c_char {
    serde_json::to_string(value)
        .ok()
        .and_then(|s| CString::new(s).ok())
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// Fallback from an optional JSON argument; null pointer gives `""`
unsafe fn parse_fallback(ptr: *const c_char) -> Option<Value> {
    if ptr.is_null() {
        return Some(Value::String(String::new()));
    }
    parse_required(ptr)
}

/// Convert a matrix (`[[header...], [row...], ...]`) into records
///
/// # Safety
/// - `matrix` must be a valid C string
/// - `mapping` (`[[old, new], ...]`) and `fallback` may be null
/// - Caller must free the returned string with `kr_free_string`
#[no_mangle]
pub unsafe extern "C" fn kr_records_from_table_json(
    matrix: *const c_char,
    mapping: *const c_char,
    fallback: *const c_char,
) -> *mut c_char {
    let Some(matrix) = parse_required::<Vec<Vec<Value>>>(matrix) else {
        return ptr::null_mut();
    };
    let (Some(mapping), Some(fallback)) = (parse_arg::<KeyMapping>(mapping), parse_fallback(fallback))
    else {
        return ptr::null_mut();
    };

    let table = Table::from_matrix(matrix);
    to_c_json(&records_from_table(&table, &mapping, &fallback))
}

/// Convert records into a matrix, using the first record's fields as header
///
/// # Safety
/// - `records` must be a valid C string
/// - `mapping` and `fallback` may be null
/// - Caller must free the returned string with `kr_free_string`
#[no_mangle]
pub unsafe extern "C" fn kr_table_from_records_json(
    records: *const c_char,
    mapping: *const c_char,
    fallback: *const c_char,
) -> *mut c_char {
    let Some(records) = parse_required::<Vec<Record>>(records) else {
        return ptr::null_mut();
    };
    let (Some(mapping), Some(fallback)) = (parse_arg::<KeyMapping>(mapping), parse_fallback(fallback))
    else {
        return ptr::null_mut();
    };

    to_c_json(&table_from_records(&records, &mapping, &fallback).to_matrix())
}

/// Project records with a mapping, defaults and mode (`"new"`, `"rename"`, `"update"`)
///
/// # Safety
/// - `records` and `mapping` must be valid C strings
/// - `defaults`, `fallback` and `mode` may be null (`{}`, `""`, `"new"`)
/// - Caller must free the returned string with `kr_free_string`
#[no_mangle]
pub unsafe extern "C" fn kr_project_json(
    records: *const c_char,
    mapping: *const c_char,
    defaults: *const c_char,
    fallback: *const c_char,
    mode: *const c_char,
) -> *mut c_char {
    let (Some(records), Some(mapping)) = (
        parse_required::<Vec<Record>>(records),
        parse_required::<KeyMapping>(mapping),
    ) else {
        return ptr::null_mut();
    };
    let (Some(defaults), Some(fallback)) = (parse_arg::<DefaultMap>(defaults), parse_fallback(fallback))
    else {
        return ptr::null_mut();
    };
    let mode = if mode.is_null() {
        ProjectionMode::New
    } else {
        match CStr::from_ptr(mode).to_str().ok().and_then(|s| s.parse().ok()) {
            Some(m) => m,
            None => return ptr::null_mut(),
        }
    };

    to_c_json(&project_all(&records, &mapping, &defaults, &fallback, mode))
}

/// Diff two record snapshots by composite key
///
/// Returns `{"added": [...], "deleted": [...], "updated": [...]}`.
///
/// # Safety
/// - `old_records`, `new_records` and `composite_key` (`["field", ...]`)
///   must be valid C strings
/// - Caller must free the returned string with `kr_free_string`
#[no_mangle]
pub unsafe extern "C" fn kr_reconcile_json(
    old_records: *const c_char,
    new_records: *const c_char,
    composite_key: *const c_char,
) -> *mut c_char {
    let (Some(old), Some(new), Some(key)) = (
        parse_required::<Vec<Record>>(old_records),
        parse_required::<Vec<Record>>(new_records),
        parse_required::<Vec<String>>(composite_key),
    ) else {
        return ptr::null_mut();
    };

    to_c_json(&get_upsert_diff(&old, &new, &key))
}

/// Free a string returned by this library
///
/// # Safety
/// - `s` must be a pointer returned by a `kr_*_json` function, or null
#[no_mangle]
pub unsafe extern "C" fn kr_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
