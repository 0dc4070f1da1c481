//! Record codec.
//!
//! Maps a `Resource` to and from the attribute map stored in the table. Strings are
//! `S` attributes, the availability flag is a `BOOL`, and the counter is an `N`.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use occ_demo_core::{Resource, ResourceKey};

use crate::error::CodecError;
use crate::schema::attr;

/// An item as stored in the table.
pub type Item = HashMap<String, AttributeValue>;

/// Encode a record into its attribute map.
#[must_use]
pub fn encode(resource: &Resource) -> Item {
    HashMap::from([
        (
            attr::RESOURCE_ID.to_string(),
            AttributeValue::S(resource.resource_id.clone()),
        ),
        (
            attr::ACCOUNT_ID.to_string(),
            AttributeValue::S(resource.account_id.clone()),
        ),
        (
            attr::AVAILABLE.to_string(),
            AttributeValue::Bool(resource.available),
        ),
        (
            attr::STATUS.to_string(),
            AttributeValue::S(resource.status.clone()),
        ),
        (
            attr::NUM_CALLS.to_string(),
            encode_counter(resource.num_calls),
        ),
    ])
}

/// Decode a record from its attribute map.
///
/// # Errors
///
/// Returns a `CodecError` if an attribute is missing, has the wrong type, or the
/// counter is not a non-negative integer.
pub fn decode(item: &Item) -> Result<Resource, CodecError> {
    Ok(Resource {
        resource_id: string_attr(item, attr::RESOURCE_ID)?,
        account_id: string_attr(item, attr::ACCOUNT_ID)?,
        available: bool_attr(item, attr::AVAILABLE)?,
        status: string_attr(item, attr::STATUS)?,
        num_calls: counter_attr(item, attr::NUM_CALLS)?,
    })
}

/// Build the two-attribute key map for a lookup.
#[must_use]
pub fn key_attributes(key: &ResourceKey) -> Item {
    HashMap::from([
        (
            attr::RESOURCE_ID.to_string(),
            AttributeValue::S(key.resource_id.clone()),
        ),
        (
            attr::ACCOUNT_ID.to_string(),
            AttributeValue::S(key.account_id.clone()),
        ),
    ])
}

/// Encode a counter value as a numeric attribute.
#[must_use]
pub fn encode_counter(value: u64) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

fn get<'a>(item: &'a Item, name: &'static str) -> Result<&'a AttributeValue, CodecError> {
    item.get(name).ok_or(CodecError::MissingAttribute(name))
}

fn string_attr(item: &Item, name: &'static str) -> Result<String, CodecError> {
    get(item, name)?
        .as_s()
        .cloned()
        .map_err(|_| CodecError::WrongType {
            name,
            expected: "S",
        })
}

fn bool_attr(item: &Item, name: &'static str) -> Result<bool, CodecError> {
    get(item, name)?
        .as_bool()
        .copied()
        .map_err(|_| CodecError::WrongType {
            name,
            expected: "BOOL",
        })
}

fn counter_attr(item: &Item, name: &'static str) -> Result<u64, CodecError> {
    let raw = get(item, name)?.as_n().map_err(|_| CodecError::WrongType {
        name,
        expected: "N",
    })?;
    raw.trim()
        .parse()
        .map_err(|_| CodecError::InvalidNumber {
            name,
            value: raw.clone(),
        })
}
