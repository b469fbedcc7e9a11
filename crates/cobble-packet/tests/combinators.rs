//! Integration tests for the array, optional, and tuple combinators.

use std::cell::Cell;

use cobble_packet::{Ary, Counted, Decode, Encode, Opt, Packet, PacketError, VarInt, VarLong};

fn encode<T: Encode>(value: T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.write_to(&mut buf).expect("encode");
    buf
}

// =========================================================================
// Ary
// =========================================================================

#[test]
fn test_ary_decodes_int_prefixed_strings() {
    let bin: &[u8] = &[
        0x00, 0x00, 0x00, 0x02, // length
        0x04, b'T', b'n', b'z', b'e', // data[0]
        0x00, // data[1]
    ];
    let mut ary = Ary::<i32, Vec<String>>::default();
    let mut src = bin;
    let n = ary.read_from(&mut src).expect("decode");

    assert_eq!(n, 10);
    assert_eq!(ary.into_inner(), vec!["Tnze".to_string(), String::new()]);
}

#[test]
fn test_ary_encodes_every_prefix_width() {
    let data = vec![1i32, 2, 3];
    let elements = [0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3];

    let cases: [(Vec<u8>, &[u8]); 4] = [
        (encode(Ary::<i32, _>::new(&data)), &[0, 0, 0, 3]),
        (encode(Ary::<i64, _>::new(&data)), &[0, 0, 0, 0, 0, 0, 0, 3]),
        (encode(Ary::<VarInt, _>::new(&data)), &[3]),
        (encode(Ary::<VarLong, _>::new(&data)), &[3]),
    ];
    for (got, prefix) in cases {
        let mut want = prefix.to_vec();
        want.extend_from_slice(&elements);
        assert_eq!(got, want);
    }
}

#[test]
fn test_ary_varint_prefix_concrete_bytes() {
    let bytes = encode(Ary::<VarInt, Vec<i32>>::from(vec![1, 2, 3]));
    assert_eq!(
        bytes,
        vec![0x03, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3]
    );
}

#[test]
fn test_ary_round_trip_fixed_and_variable_prefixes() {
    let words: Vec<String> = ["alpha", "", "γάμμα", "delta"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let bytes = encode(Ary::<u16, _>::new(&words));
    let mut back = Ary::<u16, Vec<String>>::default();
    back.read_from(&mut bytes.as_slice()).expect("u16 prefix");
    assert_eq!(back.get(), &words);

    let bytes = encode(Ary::<VarInt, _>::new(&words));
    let mut back = Ary::<VarInt, Vec<String>>::default();
    back.read_from(&mut bytes.as_slice()).expect("VarInt prefix");
    assert_eq!(back.get(), &words);
}

#[test]
fn test_ary_empty_is_only_the_length() {
    let empty: Vec<i64> = Vec::new();
    assert_eq!(encode(Ary::<i32, _>::new(&empty)), vec![0, 0, 0, 0]);
    assert_eq!(encode(Ary::<VarInt, _>::new(&empty)), vec![0]);

    let mut back = Ary::<VarInt, Vec<i64>>::new(vec![9, 9]);
    let n = back.read_from(&mut [0u8].as_slice()).expect("decode");
    assert_eq!(n, 1);
    assert!(back.get().is_empty());
}

#[test]
fn test_ary_decodes_into_callers_vec() {
    let packet = Packet::new(0, vec![2, 1, b'a', 1, b'b']);
    let mut names: Vec<String> = Vec::new();
    packet
        .scan(Ary::<VarInt, _>::new(&mut names))
        .expect("scan");
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_counted_reuses_previously_decoded_count() {
    // count, a flag that depends on it, then the elements.
    let packet = Packet::new(0, vec![3, 0x2A, 10, 20, 30]);
    let count = Cell::new(VarInt(0));
    let mut marker = 0u8;
    let mut values: Vec<u8> = Vec::new();

    let n = packet
        .scan((
            &count,
            Opt::when(|| count.get().0 > 0, &mut marker),
            Counted::bound(&count, &mut values),
        ))
        .expect("scan");

    assert_eq!(n, 5);
    assert_eq!(marker, 0x2A);
    assert_eq!(values, vec![10, 20, 30]);
}

// =========================================================================
// Opt
// =========================================================================

#[test]
fn test_opt_reads_when_flag_set() {
    let packet = Packet::new(0, vec![0x01, 4, b'T', b'n', b'z', b'e']);
    let has = Cell::new(false);
    let mut data = String::new();
    packet
        .scan((&has, Opt::when(|| has.get(), &mut data)))
        .expect("scan");
    assert_eq!(data, "Tnze");
}

#[test]
fn test_opt_absent_leaves_destination_untouched() {
    let packet = Packet::new(0, vec![0x00]);
    let has = Cell::new(true);
    let mut data = String::from("WILL NOT BE READ, WILL NOT BE COVERED");
    let n = packet
        .scan((&has, Opt::when(|| has.get(), &mut data)))
        .expect("scan");
    assert_eq!(n, 1);
    assert!(!has.get());
    assert_eq!(data, "WILL NOT BE READ, WILL NOT BE COVERED");
}

#[test]
fn test_opt_off_consumes_nothing() {
    let mut value = 5i32;
    let mut src: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];
    let n = Opt::new(false, &mut value).read_from(&mut src).expect("decode");
    assert_eq!(n, 0);
    assert_eq!(value, 5);
    assert_eq!(src.len(), 4);
}

#[test]
fn test_opt_on_matches_unwrapped_field() {
    let bytes: &[u8] = &[0x00, 0x00, 0x01, 0x00];

    let mut plain = 0i32;
    let plain_n = plain.read_from(&mut { bytes }).expect("plain");

    let mut wrapped = 0i32;
    let wrapped_n = Opt::new(true, &mut wrapped)
        .read_from(&mut { bytes })
        .expect("wrapped");

    assert_eq!(plain_n, wrapped_n);
    assert_eq!(plain, wrapped);
    assert_eq!(encode(Opt::new(true, 256i32)), encode(256i32));
}

// =========================================================================
// Tuple
// =========================================================================

#[test]
fn test_tuple_partial_failure_reports_consumed_bytes() {
    // i32, u8, then a string promising four bytes but delivering two.
    let packet = Packet::new(0, vec![0, 0, 0, 1, 7, 4, b'T', b'n']);

    let mut a = 0i32;
    let mut b = 0u8;
    let mut c = String::new();
    let mut d = 0i64;
    let mut e = false;
    let err = packet
        .scan((&mut a, &mut b, &mut c, &mut d, &mut e))
        .expect_err("third field is truncated");

    assert!(matches!(err, PacketError::UnexpectedEof { .. }));
    // 4 (i32) + 1 (u8) + 1 (length prefix) + 2 (partial body).
    assert_eq!(err.processed(), 8);
    assert_eq!(a, 1);
    assert_eq!(b, 7);
    assert_eq!(c, "");
    assert_eq!(d, 0);
}

#[test]
fn test_handshake_shaped_tuple_round_trip() {
    let packet = Packet::marshal(
        0x00,
        (VarInt(757), "mc.example.org", 25565u16, VarInt(2)),
    )
    .expect("marshal");

    let mut protocol = VarInt(0);
    let mut address = String::new();
    let mut port = 0u16;
    let mut next = VarInt(0);
    let n = packet
        .scan((&mut protocol, &mut address, &mut port, &mut next))
        .expect("scan");

    assert_eq!(n, packet.data.len());
    assert_eq!(protocol, VarInt(757));
    assert_eq!(address, "mc.example.org");
    assert_eq!(port, 25565);
    assert_eq!(next, VarInt(2));
}
