/*!
 * Wire Round Trip Tests
 * Property tests for the binary value codec
 */

use bytes::{Buf, BytesMut};
use ipnetwork::IpNetwork;
use pdp::value::{
    canonical_network, AttributeValue, Domain, DomainSet, FlagsType, FlagsValue, NetworkSet, StringSet,
};
use pdp::wire::{decode_value, encode_value};
use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

fn wide_flags() -> Arc<FlagsType> {
    Arc::new(FlagsType::new("wide", (0..64).map(|i| format!("f{i}"))).unwrap())
}

fn roundtrip(value: &AttributeValue, flags: Option<&Arc<FlagsType>>) -> AttributeValue {
    let mut buf = BytesMut::new();
    encode_value(&mut buf, value).unwrap();
    let mut frozen = buf.freeze();
    let decoded = decode_value(&mut frozen, flags).unwrap();
    assert_eq!(frozen.remaining(), 0, "decoder left bytes for {value:?}");
    decoded
}

fn address() -> impl Strategy<Value = IpAddr> {
    prop_oneof![
        any::<[u8; 4]>().prop_map(|o| IpAddr::V4(Ipv4Addr::from(o))),
        any::<[u8; 16]>().prop_map(|o| IpAddr::V6(Ipv6Addr::from(o))),
    ]
}

fn network() -> impl Strategy<Value = IpNetwork> {
    (address(), any::<u8>()).prop_map(|(addr, prefix)| {
        let max = if addr.is_ipv4() { 32 } else { 128 };
        canonical_network(IpNetwork::new(addr, prefix % (max + 1)).unwrap())
    })
}

fn domain() -> impl Strategy<Value = Domain> {
    prop::collection::vec("[a-z0-9]([a-z0-9-]{0,14}[a-z0-9])?", 0..5)
        .prop_map(|labels| Domain::parse(&labels.join(".")).unwrap())
}

fn value() -> impl Strategy<Value = AttributeValue> {
    prop_oneof![
        any::<bool>().prop_map(AttributeValue::Boolean),
        ".{0,24}".prop_map(AttributeValue::String),
        any::<i64>().prop_map(AttributeValue::Integer),
        prop::num::f64::NORMAL.prop_map(AttributeValue::Float),
        address().prop_map(AttributeValue::Address),
        network().prop_map(AttributeValue::Network),
        domain().prop_map(AttributeValue::Domain),
        prop::collection::vec(".{0,8}", 0..6)
            .prop_map(|items| AttributeValue::SetOfStrings(items.into_iter().collect::<StringSet>())),
        prop::collection::vec(network(), 0..4).prop_map(|items| {
            let mut set = NetworkSet::new();
            for network in items {
                set.insert(network);
            }
            AttributeValue::SetOfNetworks(set)
        }),
        prop::collection::vec(domain(), 0..4).prop_map(|items| {
            let mut set = DomainSet::new();
            for domain in items {
                set.insert(domain);
            }
            AttributeValue::SetOfDomains(set)
        }),
        prop::collection::vec(".{0,8}", 0..6).prop_map(AttributeValue::ListOfStrings),
    ]
}

proptest! {
    #[test]
    fn prop_values_survive_the_wire(original in value()) {
        prop_assert_eq!(roundtrip(&original, None), original);
    }

    #[test]
    fn prop_flags_survive_the_wire(bits in any::<u64>()) {
        let ty = wide_flags();
        let value = AttributeValue::Flags(FlagsValue::new(ty.clone(), bits).unwrap());
        prop_assert_eq!(roundtrip(&value, Some(&ty)), value);
    }
}

#[test]
fn test_edge_values() {
    let ty = wide_flags();
    let edges = [
        AttributeValue::SetOfStrings(StringSet::new()),
        AttributeValue::ListOfStrings(Vec::new()),
        AttributeValue::SetOfDomains(DomainSet::new()),
        AttributeValue::Domain(Domain::root()),
        AttributeValue::String(String::new()),
        AttributeValue::Integer(i64::MIN),
        AttributeValue::Flags(FlagsValue::new(ty.clone(), u64::MAX).unwrap()),
    ];
    for value in edges {
        assert_eq!(roundtrip(&value, Some(&ty)), value);
    }
}
