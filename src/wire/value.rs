/*!
 * Value Codec
 * Kind codes and kind-specific payload encoding
 *
 * All integers are big-endian. Strings and collections are prefixed with a
 * u16 length or count.
 */

use super::errors::{WireError, WireResult};
use crate::core::limits::{MAX_WIRE_COLLECTION_LEN, MAX_WIRE_STRING_LEN};
use crate::value::{
    canonical_network, AttributeValue, Domain, DomainSet, FlagsType, FlagsValue, FlagsWidth,
    NetworkSet, StringSet, ValueError,
};
use bytes::{Buf, BufMut, BytesMut};
use ipnetwork::IpNetwork;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

pub const CODE_BOOLEAN: u8 = 0;
pub const CODE_STRING: u8 = 1;
pub const CODE_INTEGER: u8 = 2;
pub const CODE_FLOAT: u8 = 3;
pub const CODE_ADDRESS: u8 = 4;
pub const CODE_NETWORK: u8 = 5;
pub const CODE_DOMAIN: u8 = 6;
pub const CODE_SET_OF_STRINGS: u8 = 7;
pub const CODE_SET_OF_NETWORKS: u8 = 8;
pub const CODE_SET_OF_DOMAINS: u8 = 9;
pub const CODE_LIST_OF_STRINGS: u8 = 10;
pub const CODE_FLAGS8: u8 = 11;
pub const CODE_FLAGS16: u8 = 12;
pub const CODE_FLAGS32: u8 = 13;
pub const CODE_FLAGS64: u8 = 14;

/// One-byte kind code of a value; flags codes carry the storage width
pub fn kind_code(value: &AttributeValue) -> u8 {
    match value {
        AttributeValue::Boolean(_) => CODE_BOOLEAN,
        AttributeValue::String(_) => CODE_STRING,
        AttributeValue::Integer(_) => CODE_INTEGER,
        AttributeValue::Float(_) => CODE_FLOAT,
        AttributeValue::Address(_) => CODE_ADDRESS,
        AttributeValue::Network(_) => CODE_NETWORK,
        AttributeValue::Domain(_) => CODE_DOMAIN,
        AttributeValue::SetOfStrings(_) => CODE_SET_OF_STRINGS,
        AttributeValue::SetOfNetworks(_) => CODE_SET_OF_NETWORKS,
        AttributeValue::SetOfDomains(_) => CODE_SET_OF_DOMAINS,
        AttributeValue::ListOfStrings(_) => CODE_LIST_OF_STRINGS,
        AttributeValue::Flags(flags) => flags_code(flags.flags_type().width()),
    }
}

const fn flags_code(width: FlagsWidth) -> u8 {
    match width {
        FlagsWidth::W8 => CODE_FLAGS8,
        FlagsWidth::W16 => CODE_FLAGS16,
        FlagsWidth::W32 => CODE_FLAGS32,
        FlagsWidth::W64 => CODE_FLAGS64,
    }
}

/// Write the kind code followed by the payload
pub fn encode_value(buf: &mut BytesMut, value: &AttributeValue) -> WireResult<()> {
    buf.put_u8(kind_code(value));
    match value {
        AttributeValue::Boolean(b) => buf.put_u8(u8::from(*b)),
        AttributeValue::String(s) => put_string(buf, s, "string")?,
        AttributeValue::Integer(i) => buf.put_i64(*i),
        AttributeValue::Float(f) => buf.put_f64(*f),
        AttributeValue::Address(addr) => put_address(buf, *addr),
        AttributeValue::Network(net) => put_network(buf, net),
        AttributeValue::Domain(domain) => put_string(buf, domain.as_str(), "domain")?,
        AttributeValue::SetOfStrings(set) => {
            put_count(buf, set.len(), "set of strings")?;
            for item in set.iter() {
                put_string(buf, item, "string")?;
            }
        }
        AttributeValue::SetOfNetworks(set) => {
            put_count(buf, set.len(), "set of networks")?;
            for net in set.iter() {
                put_network(buf, net);
            }
        }
        AttributeValue::SetOfDomains(set) => {
            put_count(buf, set.len(), "set of domains")?;
            for domain in set.iter() {
                put_string(buf, domain.as_str(), "domain")?;
            }
        }
        AttributeValue::ListOfStrings(list) => {
            put_count(buf, list.len(), "list of strings")?;
            for item in list {
                put_string(buf, item, "string")?;
            }
        }
        AttributeValue::Flags(flags) => match flags.flags_type().width() {
            FlagsWidth::W8 => buf.put_u8(flags.bits() as u8),
            FlagsWidth::W16 => buf.put_u16(flags.bits() as u16),
            FlagsWidth::W32 => buf.put_u32(flags.bits() as u32),
            FlagsWidth::W64 => buf.put_u64(flags.bits()),
        },
    }
    Ok(())
}

/// Read a kind code and its payload
///
/// Flags payloads need the declared type of the attribute they belong to;
/// `flags` is `None` when the attribute is unknown or not a flags attribute.
pub fn decode_value<B: Buf>(buf: &mut B, flags: Option<&Arc<FlagsType>>) -> WireResult<AttributeValue> {
    ensure(buf, 1, "kind code")?;
    let code = buf.get_u8();
    let value = match code {
        CODE_BOOLEAN => {
            ensure(buf, 1, "boolean")?;
            match buf.get_u8() {
                0 => AttributeValue::Boolean(false),
                1 => AttributeValue::Boolean(true),
                other => return Err(WireError::InvalidBoolean(other)),
            }
        }
        CODE_STRING => AttributeValue::String(get_string(buf, "string")?),
        CODE_INTEGER => {
            ensure(buf, 8, "integer")?;
            AttributeValue::Integer(buf.get_i64())
        }
        CODE_FLOAT => {
            ensure(buf, 8, "float")?;
            AttributeValue::Float(buf.get_f64())
        }
        CODE_ADDRESS => AttributeValue::Address(get_address(buf)?),
        CODE_NETWORK => AttributeValue::Network(get_network(buf)?),
        CODE_DOMAIN => AttributeValue::Domain(get_domain(buf)?),
        CODE_SET_OF_STRINGS => {
            let count = get_u16(buf, "set of strings")?;
            let mut set = StringSet::new();
            for _ in 0..count {
                set.insert(get_string(buf, "string")?);
            }
            AttributeValue::SetOfStrings(set)
        }
        CODE_SET_OF_NETWORKS => {
            let count = get_u16(buf, "set of networks")?;
            let mut set = NetworkSet::new();
            for _ in 0..count {
                set.insert(get_network(buf)?);
            }
            AttributeValue::SetOfNetworks(set)
        }
        CODE_SET_OF_DOMAINS => {
            let count = get_u16(buf, "set of domains")?;
            let mut set = DomainSet::new();
            for _ in 0..count {
                set.insert(get_domain(buf)?);
            }
            AttributeValue::SetOfDomains(set)
        }
        CODE_LIST_OF_STRINGS => {
            let count = get_u16(buf, "list of strings")?;
            let mut list = Vec::with_capacity(count);
            for _ in 0..count {
                list.push(get_string(buf, "string")?);
            }
            AttributeValue::ListOfStrings(list)
        }
        CODE_FLAGS8 => get_flags(buf, FlagsWidth::W8, flags)?,
        CODE_FLAGS16 => get_flags(buf, FlagsWidth::W16, flags)?,
        CODE_FLAGS32 => get_flags(buf, FlagsWidth::W32, flags)?,
        CODE_FLAGS64 => get_flags(buf, FlagsWidth::W64, flags)?,
        other => return Err(WireError::UnknownKind(other)),
    };
    Ok(value)
}

fn get_flags<B: Buf>(
    buf: &mut B,
    width: FlagsWidth,
    flags: Option<&Arc<FlagsType>>,
) -> WireResult<AttributeValue> {
    let ty = flags.ok_or(WireError::UnresolvedFlags { bits: width.bits() })?;
    if ty.width() != width {
        return Err(WireError::FlagsWidth {
            flags_type: ty.name().to_string(),
            expected: ty.width().bits(),
            actual: width.bits(),
        });
    }

    ensure(buf, width.bytes(), "flags")?;
    let bits = match width {
        FlagsWidth::W8 => u64::from(buf.get_u8()),
        FlagsWidth::W16 => u64::from(buf.get_u16()),
        FlagsWidth::W32 => u64::from(buf.get_u32()),
        FlagsWidth::W64 => buf.get_u64(),
    };
    Ok(AttributeValue::Flags(FlagsValue::new(ty.clone(), bits)?))
}

fn put_address(buf: &mut BytesMut, addr: IpAddr) {
    match addr {
        IpAddr::V4(v4) => {
            buf.put_u8(4);
            buf.put_slice(&v4.octets());
        }
        IpAddr::V6(v6) => {
            buf.put_u8(16);
            buf.put_slice(&v6.octets());
        }
    }
}

fn get_address<B: Buf>(buf: &mut B) -> WireResult<IpAddr> {
    ensure(buf, 1, "address")?;
    match buf.get_u8() {
        4 => {
            ensure(buf, 4, "address")?;
            let mut octets = [0u8; 4];
            buf.copy_to_slice(&mut octets);
            Ok(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            ensure(buf, 16, "address")?;
            let mut octets = [0u8; 16];
            buf.copy_to_slice(&mut octets);
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        other => Err(WireError::InvalidAddressLength(other)),
    }
}

fn put_network(buf: &mut BytesMut, net: &IpNetwork) {
    put_address(buf, net.ip());
    buf.put_u8(net.prefix());
}

fn get_network<B: Buf>(buf: &mut B) -> WireResult<IpNetwork> {
    let addr = get_address(buf)?;
    ensure(buf, 1, "network prefix")?;
    let prefix = buf.get_u8();
    IpNetwork::new(addr, prefix)
        .map(canonical_network)
        .map_err(|_| ValueError::InvalidNetwork(format!("{addr}/{prefix}")).into())
}

fn get_domain<B: Buf>(buf: &mut B) -> WireResult<Domain> {
    let text = get_string(buf, "domain")?;
    Ok(Domain::parse(&text)?)
}

pub(super) fn ensure<B: Buf>(buf: &B, needed: usize, context: &'static str) -> WireResult<()> {
    if buf.remaining() < needed {
        return Err(WireError::Truncated {
            context,
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

pub(super) fn get_u16<B: Buf>(buf: &mut B, context: &'static str) -> WireResult<usize> {
    ensure(buf, 2, context)?;
    Ok(usize::from(buf.get_u16()))
}

pub(super) fn get_string<B: Buf>(buf: &mut B, context: &'static str) -> WireResult<String> {
    let len = get_u16(buf, context)?;
    ensure(buf, len, context)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    String::from_utf8(raw).map_err(|_| WireError::InvalidUtf8 { context })
}

pub(super) fn put_string(buf: &mut BytesMut, text: &str, context: &'static str) -> WireResult<()> {
    put_length(buf, text.len(), MAX_WIRE_STRING_LEN, context)?;
    buf.put_slice(text.as_bytes());
    Ok(())
}

pub(super) fn put_count(buf: &mut BytesMut, count: usize, context: &'static str) -> WireResult<()> {
    put_length(buf, count, MAX_WIRE_COLLECTION_LEN, context)
}

fn put_length(buf: &mut BytesMut, length: usize, limit: usize, context: &'static str) -> WireResult<()> {
    if length > limit {
        return Err(WireError::TooLong {
            context,
            length,
            limit,
        });
    }
    buf.put_u16(length as u16);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: &AttributeValue) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_value(&mut buf, value).unwrap();
        buf.to_vec()
    }

    #[test]
    fn test_fixed_layouts() {
        assert_eq!(encoded(&AttributeValue::Boolean(true)), vec![0, 1]);
        assert_eq!(
            encoded(&AttributeValue::String("ab".into())),
            vec![1, 0, 2, b'a', b'b']
        );
        assert_eq!(
            encoded(&AttributeValue::Integer(-2)),
            vec![2, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]
        );
        assert_eq!(
            encoded(&AttributeValue::Address("10.0.0.1".parse().unwrap())),
            vec![4, 4, 10, 0, 0, 1]
        );
        assert_eq!(
            encoded(&AttributeValue::Network("192.168.0.0/16".parse().unwrap())),
            vec![5, 4, 192, 168, 0, 0, 16]
        );
        assert_eq!(encoded(&AttributeValue::Domain(Domain::root())), vec![6, 0, 0]);
    }

    #[test]
    fn test_flags_width_follows_type() {
        let ty = Arc::new(FlagsType::new("f", (0..9).map(|i| format!("f{i}"))).unwrap());
        let value = AttributeValue::Flags(FlagsValue::new(ty.clone(), 0x101).unwrap());
        let bytes = encoded(&value);
        assert_eq!(bytes, vec![CODE_FLAGS16, 0x01, 0x01]);

        let decoded = decode_value(&mut bytes.as_slice(), Some(&ty)).unwrap();
        assert_eq!(decoded, value);

        let narrow = Arc::new(FlagsType::new("n", ["a", "b"]).unwrap());
        assert!(matches!(
            decode_value(&mut bytes.as_slice(), Some(&narrow)),
            Err(WireError::FlagsWidth { expected: 8, actual: 16, .. })
        ));
        assert!(matches!(
            decode_value(&mut bytes.as_slice(), None),
            Err(WireError::UnresolvedFlags { bits: 16 })
        ));
    }

    #[test]
    fn test_network_is_canonicalized() {
        let bytes = [CODE_NETWORK, 4, 10, 1, 2, 3, 8];
        let decoded = decode_value(&mut &bytes[..], None).unwrap();
        assert_eq!(decoded, AttributeValue::Network("10.0.0.0/8".parse().unwrap()));
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(
            decode_value(&mut &[CODE_INTEGER, 0, 0][..], None),
            Err(WireError::Truncated {
                context: "integer",
                needed: 8,
                remaining: 2
            })
        );
        assert_eq!(decode_value(&mut &[99u8][..], None), Err(WireError::UnknownKind(99)));
        assert_eq!(
            decode_value(&mut &[CODE_BOOLEAN, 2][..], None),
            Err(WireError::InvalidBoolean(2))
        );
        assert_eq!(
            decode_value(&mut &[CODE_ADDRESS, 5, 0, 0, 0, 0, 0][..], None),
            Err(WireError::InvalidAddressLength(5))
        );
        assert!(matches!(
            decode_value(&mut &[CODE_STRING, 0, 1, 0xff][..], None),
            Err(WireError::InvalidUtf8 { .. })
        ));
        assert!(matches!(
            decode_value(&mut &[CODE_DOMAIN, 0, 3, b'a', b'.', b'.'][..], None),
            Err(WireError::Value(ValueError::EmptyLabel(_)))
        ));
    }

    #[test]
    fn test_oversized_string_rejected() {
        let long = "x".repeat(MAX_WIRE_STRING_LEN + 1);
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_value(&mut buf, &AttributeValue::String(long)),
            Err(WireError::TooLong { .. })
        ));
    }
}
