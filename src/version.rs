//! Product version lookup for target binaries.
//!
//! When a descriptor has no `version` key the package version comes from the
//! target binary itself. Windows PE files carry a `VS_VERSION_INFO` resource
//! with a `ProductVersion` string and a fixed-size `VS_FIXEDFILEINFO` block.
//! The string is preferred, the fixed block is the fallback. Binaries without
//! either (including non-PE files) have no version.

use std::path::Path;

use log::debug;

use crate::error::Result;

const VERSION_INFO_KEY: &str = "VS_VERSION_INFO";
const PRODUCT_VERSION_KEY: &str = "ProductVersion";
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// Read the product version of a binary, if it embeds one
pub fn product_version(path: &Path) -> Result<Option<String>> {
    let bytes = std::fs::read(path)?;
    let version = product_version_string(&bytes).or_else(|| fixed_product_version(&bytes));
    debug!(
        "Embedded version of {}: {}",
        path.display(),
        version.as_deref().unwrap_or("<none>")
    );
    Ok(version)
}

/// `ProductVersion` entry of the `StringFileInfo` table
fn product_version_string(bytes: &[u8]) -> Option<String> {
    let key = utf16_with_nul(PRODUCT_VERSION_KEY);
    let key_start = find(bytes, &key, 0)?;
    let value_start = align4(key_start + key.len());

    let units: Vec<u16> = bytes
        .get(value_start..)?
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();

    let value = String::from_utf16(&units).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `dwProductVersionMS`/`dwProductVersionLS` of `VS_FIXEDFILEINFO`
fn fixed_product_version(bytes: &[u8]) -> Option<String> {
    let key = utf16_with_nul(VERSION_INFO_KEY);
    let key_start = find(bytes, &key, 0)?;
    let block = find(
        bytes,
        &FIXED_FILE_INFO_SIGNATURE.to_le_bytes(),
        key_start + key.len(),
    )?;

    let ms = read_u32(bytes, block + 16)?;
    let ls = read_u32(bytes, block + 20)?;
    Some(format!(
        "{}.{}.{}.{}",
        ms >> 16,
        ms & 0xFFFF,
        ls >> 16,
        ls & 0xFFFF
    ))
}

fn utf16_with_nul(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|index| index + from)
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}
