//! BER 到 DER 的转换
//!
//! 流式生成的 CMS（例如 `openssl cms -stream`）使用不定长编码和分段的
//! OCTET STRING。`der` 只接受 DER，因此解码前先在这里统一转换。

use crate::error::EnvelopeError;

/// 嵌套深度上限
const MAX_DEPTH: usize = 64;

const OCTET_STRING: u8 = 0x04;
const OCTET_STRING_CONSTRUCTED: u8 = 0x24;

/// 将单个 BER 值转换为 DER
pub(crate) fn to_der(ber: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let mut reader = Reader::new(ber);
    let value = reader.read_value(0)?;
    if !reader.is_empty() {
        return Err(malformed("trailing data after BER value"));
    }

    let mut out = Vec::with_capacity(ber.len());
    value.encode(&mut out);
    Ok(out)
}

fn malformed(message: &str) -> EnvelopeError {
    EnvelopeError::Malformed(message.to_string())
}

/// 已规范化的 TLV：标签原样保留，内容已是 DER
struct Value {
    tag: Vec<u8>,
    content: Vec<u8>,
}

impl Value {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tag);

        let len = self.content.len();
        if len < 0x80 {
            out.push(len as u8);
        } else {
            let bytes = len.to_be_bytes();
            let skip = bytes.iter().take_while(|b| **b == 0).count();
            out.push(0x80 | (bytes.len() - skip) as u8);
            out.extend_from_slice(&bytes[skip..]);
        }

        out.extend_from_slice(&self.content);
    }
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn byte(&mut self) -> Result<u8, EnvelopeError> {
        let b = *self
            .input
            .get(self.pos)
            .ok_or_else(|| malformed("unexpected end of BER data"))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], EnvelopeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| malformed("BER length exceeds available data"))?;
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// 消费 end-of-contents（`00 00`），存在时返回 true
    fn end_of_contents(&mut self) -> bool {
        if self.input[self.pos..].starts_with(&[0, 0]) {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    fn read_tag(&mut self) -> Result<Vec<u8>, EnvelopeError> {
        let first = self.byte()?;
        let mut tag = vec![first];

        // 高标签号形式
        if first & 0x1f == 0x1f {
            loop {
                let b = self.byte()?;
                tag.push(b);
                if b & 0x80 == 0 {
                    break;
                }
                if tag.len() > 5 {
                    return Err(malformed("BER tag number too large"));
                }
            }
        }

        Ok(tag)
    }

    /// `None` 表示不定长
    fn read_length(&mut self) -> Result<Option<usize>, EnvelopeError> {
        match self.byte()? {
            0x80 => Ok(None),
            b if b & 0x80 == 0 => Ok(Some(usize::from(b))),
            b => {
                let count = usize::from(b & 0x7f);
                if count > 4 {
                    return Err(malformed("BER length too large"));
                }
                let mut len = 0usize;
                for _ in 0..count {
                    len = (len << 8) | usize::from(self.byte()?);
                }
                Ok(Some(len))
            }
        }
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, EnvelopeError> {
        if depth > MAX_DEPTH {
            return Err(malformed("BER nesting too deep"));
        }

        let tag = self.read_tag()?;
        let constructed = tag[0] & 0x20 != 0;

        let children = match (constructed, self.read_length()?) {
            (false, Some(len)) => {
                let content = self.take(len)?.to_vec();
                return Ok(Value { tag, content });
            }
            (false, None) => return Err(malformed("indefinite length on primitive BER value")),
            (true, Some(len)) => {
                let mut inner = Reader::new(self.take(len)?);
                let mut children = Vec::new();
                while !inner.is_empty() {
                    children.push(inner.read_value(depth + 1)?);
                }
                children
            }
            (true, None) => {
                let mut children = Vec::new();
                while !self.end_of_contents() {
                    children.push(self.read_value(depth + 1)?);
                }
                children
            }
        };

        // DER 中 OCTET STRING 必须是基本类型，分段内容拼接为一段
        if tag == [OCTET_STRING_CONSTRUCTED] {
            let mut content = Vec::new();
            for child in children {
                if child.tag != [OCTET_STRING] {
                    return Err(malformed("constructed OCTET STRING with non-octet segment"));
                }
                content.extend(child.content);
            }
            return Ok(Value {
                tag: vec![OCTET_STRING],
                content,
            });
        }

        let mut content = Vec::new();
        for child in &children {
            child.encode(&mut content);
        }
        Ok(Value { tag, content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_der_passes_through() {
        let der = [0x30, 0x06, 0x02, 0x01, 0x05, 0x04, 0x01, 0xaa];
        assert_eq!(to_der(&der).unwrap(), der);
    }

    #[test]
    fn test_indefinite_length() {
        let ber = [0x30, 0x80, 0x02, 0x01, 0x05, 0xa0, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            to_der(&ber).unwrap(),
            [0x30, 0x07, 0x02, 0x01, 0x05, 0xa0, 0x02, 0x05, 0x00]
        );
    }

    #[test]
    fn test_segmented_octet_string() {
        let ber = [
            0x24, 0x80, 0x04, 0x02, 0xaa, 0xbb, 0x24, 0x03, 0x04, 0x01, 0xcc, 0x00, 0x00,
        ];
        assert_eq!(to_der(&ber).unwrap(), [0x04, 0x03, 0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn test_non_minimal_length() {
        assert_eq!(to_der(&[0x04, 0x81, 0x02, 0xaa, 0xbb]).unwrap(), [0x04, 0x02, 0xaa, 0xbb]);
    }

    #[test]
    fn test_long_content_length() {
        let mut ber = vec![0x30, 0x80, 0x04, 0x82, 0x01, 0x00];
        ber.extend([0x11; 256]);
        ber.extend([0x00, 0x00]);

        let der = to_der(&ber).unwrap();
        assert_eq!(&der[..6], &[0x30, 0x82, 0x01, 0x04, 0x04, 0x82]);
        assert_eq!(der.len(), 4 + 4 + 256);
    }

    #[test]
    fn test_rejects_bad_input() {
        let cases: [&[u8]; 6] = [
            &[],
            &[0x30, 0x80, 0x02, 0x01, 0x05],
            &[0x04, 0x80, 0x00, 0x00],
            &[0x04, 0x01, 0xaa, 0xff],
            &[0x04, 0x85, 0x01, 0x00, 0x00, 0x00, 0x00],
            &[0x24, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00],
        ];
        for case in cases {
            assert!(
                matches!(to_der(case), Err(EnvelopeError::Malformed(_))),
                "{case:02x?}"
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let mut ber = Vec::new();
        for _ in 0..(MAX_DEPTH + 2) {
            ber.extend([0x30, 0x80]);
        }
        for _ in 0..(MAX_DEPTH + 2) {
            ber.extend([0x00, 0x00]);
        }
        assert!(to_der(&ber).is_err());
    }
}
