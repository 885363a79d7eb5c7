//! `SignerInfo` 的签名属性（RFC 5652 §11）

use std::time::SystemTime;

use cms::signed_data::SignedAttributes;
use const_oid::{
    db::rfc5911::{ID_CONTENT_TYPE, ID_MESSAGE_DIGEST, ID_SIGNING_TIME},
    ObjectIdentifier,
};
use der::{
    asn1::{GeneralizedTime, SetOfVec, UtcTime},
    DateTime, Decode, Encode, Tag, Tagged,
};
use x509_cert::attr::{Attribute, AttributeValue};

/// 构建 `contentType`、`messageDigest` 以及可选的 `signingTime` 属性
pub fn build_signed_attributes(
    content_type: ObjectIdentifier,
    digest: &[u8],
    signing_time: Option<SystemTime>,
) -> der::Result<SignedAttributes> {
    let mut attrs = SignedAttributes::new();
    attrs.insert(content_type_attribute(content_type)?)?;
    attrs.insert(message_digest_attribute(digest)?)?;
    if let Some(time) = signing_time {
        attrs.insert(signing_time_attribute(time)?)?;
    }
    Ok(attrs)
}

pub fn content_type_attribute(content_type: ObjectIdentifier) -> der::Result<Attribute> {
    let value = AttributeValue::new(Tag::ObjectIdentifier, content_type.as_bytes())?;
    single_valued(ID_CONTENT_TYPE, value)
}

pub fn message_digest_attribute(digest: &[u8]) -> der::Result<Attribute> {
    let value = AttributeValue::new(Tag::OctetString, digest)?;
    single_valued(ID_MESSAGE_DIGEST, value)
}

/// 1950 至 2049 年使用 UTCTime，其余使用 GeneralizedTime
pub fn signing_time_attribute(time: SystemTime) -> der::Result<Attribute> {
    let time = DateTime::from_system_time(time)?;
    let time_der = if (1950..=2049).contains(&time.year()) {
        UtcTime::from_date_time(time)?.to_der()?
    } else {
        GeneralizedTime::from_date_time(time).to_der()?
    };
    single_valued(ID_SIGNING_TIME, AttributeValue::from_der(&time_der)?)
}

fn single_valued(oid: ObjectIdentifier, value: AttributeValue) -> der::Result<Attribute> {
    let mut values = SetOfVec::new();
    values.insert(value)?;
    Ok(Attribute { oid, values })
}

// ============================================================================
// 读取
// ============================================================================

/// 读取属性 `oid` 的唯一值
///
/// 属性不存在时返回 `Ok(None)`；属性重复出现或值不止一个时返回 `Err`。
pub fn single_value<'a>(
    attrs: &'a SignedAttributes,
    oid: ObjectIdentifier,
) -> Result<Option<&'a AttributeValue>, String> {
    let mut matching = attrs.iter().filter(|attr| attr.oid == oid);
    let Some(attr) = matching.next() else {
        return Ok(None);
    };
    if matching.next().is_some() {
        return Err(format!("attribute {oid} appears more than once"));
    }
    if attr.values.len() != 1 {
        return Err(format!(
            "attribute {oid} has {} values, expected 1",
            attr.values.len()
        ));
    }
    Ok(attr.values.get(0))
}

pub fn message_digest(attrs: &SignedAttributes) -> Result<Option<Vec<u8>>, String> {
    let Some(value) = single_value(attrs, ID_MESSAGE_DIGEST)? else {
        return Ok(None);
    };
    if value.tag() != Tag::OctetString {
        return Err(format!("messageDigest is a {}, not an OCTET STRING", value.tag()));
    }
    Ok(Some(value.value().to_vec()))
}

pub fn content_type(attrs: &SignedAttributes) -> Result<Option<ObjectIdentifier>, String> {
    let Some(value) = single_value(attrs, ID_CONTENT_TYPE)? else {
        return Ok(None);
    };
    value
        .decode_as::<ObjectIdentifier>()
        .map(Some)
        .map_err(|e| format!("contentType is not an OID: {e}"))
}

/// 签名时间（存在且格式正确时）
pub fn signing_time(attrs: &SignedAttributes) -> Option<SystemTime> {
    let value = single_value(attrs, ID_SIGNING_TIME).ok()??;
    let time = x509_cert::time::Time::from_der(&value.to_der().ok()?).ok()?;
    Some(time.to_system_time())
}
