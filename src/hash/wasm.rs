//! Browser bindings for the hash primitive (C13's in-browser prover surface).
//!
//! Exposes hex-in/hex-out functions only — [`FieldElement`] itself stays a
//! native-only type so wasm-bindgen doesn't need to know its layout.

use wasm_bindgen::prelude::*;

use super::constants::verify_pinned_constant_table;
use super::encoding::{field_from_hex_be, field_to_hex_be};
use super::poseidon::{hash_pair, hash_single};

/// `hash_pair` over big-endian hex strings. Throws on malformed input or a
/// cryptographic integrity failure.
#[wasm_bindgen(js_name = hashPair)]
pub fn hash_pair_hex(left_hex: &str, right_hex: &str) -> Result<String, JsValue> {
    verify_pinned_constant_table()
        .map_err(|e| JsValue::from_str(&format!("cryptographic integrity failure: {e}")))?;
    let left = field_from_hex_be(left_hex).ok_or_else(|| JsValue::from_str("invalid left hex"))?;
    let right =
        field_from_hex_be(right_hex).ok_or_else(|| JsValue::from_str("invalid right hex"))?;
    let out = hash_pair(left, right).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(field_to_hex_be(out))
}

/// `hash_single` over a big-endian hex string.
#[wasm_bindgen(js_name = hashSingle)]
pub fn hash_single_hex(value_hex: &str) -> Result<String, JsValue> {
    verify_pinned_constant_table()
        .map_err(|e| JsValue::from_str(&format!("cryptographic integrity failure: {e}")))?;
    let value = field_from_hex_be(value_hex).ok_or_else(|| JsValue::from_str("invalid hex"))?;
    let out = hash_single(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(field_to_hex_be(out))
}

/// Installs the `console.error` panic hook and verifies the pinned
/// Poseidon constant table; callers invoke once at module init from JS
/// (mirrors the teacher's native `init_tracing` entry point) before
/// calling either hash function. §4.1 requires the WASM build to verify
/// the same constant table as the native builder/server at construction;
/// a mismatch here throws rather than silently hashing with the wrong
/// parameters.
#[wasm_bindgen(js_name = initPanicHook)]
pub fn init_panic_hook() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    verify_pinned_constant_table()
        .map_err(|e| JsValue::from_str(&format!("cryptographic integrity failure: {e}")))
}
